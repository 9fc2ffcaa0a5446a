//! Integration tests against a stub record store served over loopback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Path, Query as HttpQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use airbase::{Query, ResiliencePolicy, Store, StoreConfig, StoreError};

#[derive(Clone, Default)]
struct StubState {
    rows: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    next_id: Arc<AtomicU64>,
    /// When set, list responses are sliced into pages of this size and
    /// chained through `offset` cursors, as the real store does at 100.
    page_size: Arc<Mutex<Option<usize>>>,
    list_calls: Arc<AtomicU64>,
}

impl StubState {
    fn seed(&self, table: &str, rows: Vec<Value>) {
        self.rows.lock().unwrap().insert(table.to_string(), rows);
    }

    fn paginate(&self, page_size: usize) {
        *self.page_size.lock().unwrap() = Some(page_size);
    }

    fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

async fn list_rows(
    State(state): State<StubState>,
    Path((_base, table)): Path<(String, String)>,
    HttpQuery(params): HttpQuery<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if table == "Broken" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": { "type": "INVALID_FILTER_BY_FORMULA", "message": "The formula is invalid" } })),
        );
    }
    if table == "Slow" {
        tokio::time::sleep(Duration::from_millis(600)).await;
    }

    let rows = state
        .rows
        .lock()
        .unwrap()
        .get(&table)
        .cloned()
        .unwrap_or_default();

    state.list_calls.fetch_add(1, Ordering::SeqCst);

    // Minimal filterByFormula support: match RECORD_ID() = 'recX'.
    let rows: Vec<Value> = match params.get("filterByFormula") {
        Some(formula) => {
            let wanted = formula.split('\'').nth(1).unwrap_or_default();
            rows.into_iter()
                .filter(|r| r["id"].as_str() == Some(wanted))
                .collect()
        }
        None => rows,
    };

    if let Some(size) = *state.page_size.lock().unwrap() {
        let start: usize = params
            .get("offset")
            .and_then(|o| o.parse().ok())
            .unwrap_or(0);
        let page: Vec<Value> = rows.iter().skip(start).take(size).cloned().collect();
        let mut body = json!({ "records": page });
        if start + size < rows.len() {
            body["offset"] = json!((start + size).to_string());
        }
        return (StatusCode::OK, Json(body));
    }

    (StatusCode::OK, Json(json!({ "records": rows })))
}

async fn create_row(
    State(state): State<StubState>,
    Path((_base, table)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = state.next_id.fetch_add(1, Ordering::SeqCst);
    let id = format!("recStub{n:03}");
    let row = json!({ "id": id, "fields": body["fields"] });
    state
        .rows
        .lock()
        .unwrap()
        .entry(table)
        .or_default()
        .push(row.clone());
    (StatusCode::OK, Json(row))
}

async fn update_row(
    State(state): State<StubState>,
    Path((_base, table, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut rows = state.rows.lock().unwrap();
    let Some(row) = rows
        .get_mut(&table)
        .and_then(|rows| rows.iter_mut().find(|r| r["id"].as_str() == Some(&id)))
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "type": "ROW_DOES_NOT_EXIST", "message": format!("Record not found: {id}") } })),
        );
    };

    if let (Some(existing), Some(incoming)) =
        (row["fields"].as_object().cloned(), body["fields"].as_object())
    {
        let mut merged = existing;
        for (k, v) in incoming {
            merged.insert(k.clone(), v.clone());
        }
        row["fields"] = Value::Object(merged);
    }
    (StatusCode::OK, Json(row.clone()))
}

async fn delete_row(
    State(state): State<StubState>,
    Path((_base, table, id)): Path<(String, String, String)>,
) -> (StatusCode, Json<Value>) {
    let mut rows = state.rows.lock().unwrap();
    let Some(table_rows) = rows.get_mut(&table) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "NOT_FOUND" })),
        );
    };
    let before = table_rows.len();
    table_rows.retain(|r| r["id"].as_str() != Some(&id));
    if table_rows.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "NOT_FOUND" })),
        );
    }
    (StatusCode::OK, Json(json!({ "deleted": true, "id": id })))
}

async fn spawn_stub() -> (String, StubState) {
    let state = StubState::default();
    let app = Router::new()
        .route("/:base/:table", get(list_rows).post(create_row))
        .route(
            "/:base/:table/:id",
            axum::routing::patch(update_row).delete(delete_row),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn stub_store(api_url: &str) -> Store {
    Store::new(StoreConfig {
        api_key: Some("key_stub".to_string()),
        base_id: Some("appStub".to_string()),
        api_url: api_url.to_string(),
        ..StoreConfig::default()
    })
}

#[tokio::test]
async fn test_fetch_maps_ids_and_fields() {
    let (url, state) = spawn_stub().await;
    state.seed(
        "People",
        vec![
            json!({ "id": "rec001", "fields": { "Name": "Ada", "Order": 1 } }),
            json!({ "id": "rec002", "fields": { "Name": "Grace", "Tags": ["a", "b"] } }),
        ],
    );

    let store = stub_store(&url);
    let set = store
        .fetch("People", &Query::default(), ResiliencePolicy::Strict)
        .await
        .unwrap();

    assert!(!set.is_sample());
    assert_eq!(set.records.len(), 2);
    assert_eq!(set.records[0].id, "rec001");
    assert_eq!(
        set.records[0].field("Name").and_then(|v| v.as_str()),
        Some("Ada")
    );
    for record in &set.records {
        assert!(!record.id.is_empty());
        assert!(record.field("id").is_none());
    }
}

#[tokio::test]
async fn test_empty_table_is_empty_live_result() {
    let (url, _state) = spawn_stub().await;
    let store = stub_store(&url);

    let query = Query {
        max_records: Some(1),
        ..Query::default()
    };
    let set = store
        .fetch("Case study forms", &query, ResiliencePolicy::Strict)
        .await
        .unwrap();

    assert!(!set.is_sample());
    assert!(set.records.is_empty());
}

#[tokio::test]
async fn test_remote_error_surfaces_under_strict() {
    let (url, _state) = spawn_stub().await;
    let store = stub_store(&url);

    let err = store
        .fetch("Broken", &Query::default(), ResiliencePolicy::Strict)
        .await
        .expect_err("strict policy surfaces remote errors");
    match err {
        StoreError::Remote { status, message } => {
            assert_eq!(status, Some(422));
            assert_eq!(message, "The formula is invalid");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remote_error_degrades_to_sample() {
    let (url, _state) = spawn_stub().await;
    let store = stub_store(&url);

    let set = store
        .fetch("Broken", &Query::default(), ResiliencePolicy::DegradeToFallback)
        .await
        .unwrap();
    assert!(set.is_sample());
}

#[tokio::test]
async fn test_fetch_follows_offset_pagination() {
    let (url, state) = spawn_stub().await;
    state.seed(
        "Bibliography",
        (1..=5)
            .map(|n| json!({ "id": format!("rec{n:03}"), "fields": { "Order": n } }))
            .collect(),
    );
    state.paginate(2);

    let store = stub_store(&url);
    let set = store
        .fetch("Bibliography", &Query::default(), ResiliencePolicy::Strict)
        .await
        .unwrap();

    assert_eq!(set.records.len(), 5);
    let ids: Vec<&str> = set.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["rec001", "rec002", "rec003", "rec004", "rec005"]);
    // 5 rows in pages of 2 means three round trips.
    assert_eq!(state.list_calls(), 3);
}

#[tokio::test]
async fn test_pagination_stops_at_max_records() {
    let (url, state) = spawn_stub().await;
    state.seed(
        "Bibliography",
        (1..=5)
            .map(|n| json!({ "id": format!("rec{n:03}"), "fields": { "Order": n } }))
            .collect(),
    );
    state.paginate(2);

    let store = stub_store(&url);
    let query = Query {
        max_records: Some(3),
        ..Query::default()
    };
    let set = store
        .fetch("Bibliography", &query, ResiliencePolicy::Strict)
        .await
        .unwrap();

    assert_eq!(set.records.len(), 3);
    assert_eq!(set.records[2].id, "rec003");
    // Two pages cover three rows; the third page is never requested.
    assert_eq!(state.list_calls(), 2);
}

#[tokio::test]
async fn test_timeout_surfaces_within_bound() {
    let (url, _state) = spawn_stub().await;
    let store = Store::new(StoreConfig {
        api_key: Some("key_stub".to_string()),
        base_id: Some("appStub".to_string()),
        api_url: url,
        fetch_timeout: Duration::from_millis(150),
        ..StoreConfig::default()
    });

    let started = Instant::now();
    let err = store
        .fetch("Slow", &Query::default(), ResiliencePolicy::Strict)
        .await
        .expect_err("slow store must time out");

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_timeout_degrades_to_sample() {
    let (url, _state) = spawn_stub().await;
    let store = Store::new(StoreConfig {
        api_key: Some("key_stub".to_string()),
        base_id: Some("appStub".to_string()),
        api_url: url,
        fetch_timeout: Duration::from_millis(150),
        ..StoreConfig::default()
    });

    let set = store
        .fetch("Slow", &Query::default(), ResiliencePolicy::DegradeToFallback)
        .await
        .unwrap();
    assert!(set.is_sample());
}

#[tokio::test]
async fn test_create_then_filter_round_trip() {
    let (url, _state) = spawn_stub().await;
    let store = stub_store(&url);

    let mut fields = serde_json::Map::new();
    fields.insert("Name".to_string(), json!("New person"));
    fields.insert("Order".to_string(), json!(7));

    let created = store.create("People", fields).await.unwrap();
    assert!(!created.id.is_empty());

    let query = Query::with_filter(format!("RECORD_ID() = '{}'", created.id));
    let set = store
        .fetch("People", &query, ResiliencePolicy::Strict)
        .await
        .unwrap();

    assert_eq!(set.records.len(), 1);
    assert_eq!(set.records[0].id, created.id);
    assert_eq!(
        set.records[0].field("Name").and_then(|v| v.as_str()),
        Some("New person")
    );
    assert_eq!(
        set.records[0].field("Order").and_then(|v| v.as_f64()),
        Some(7.0)
    );
}

#[tokio::test]
async fn test_update_nonexistent_id_fails() {
    let (url, _state) = spawn_stub().await;
    let store = stub_store(&url);

    let mut fields = serde_json::Map::new();
    fields.insert("Name".to_string(), json!("X"));

    let err = store
        .update("People", "rec123", fields)
        .await
        .expect_err("update of unknown id must fail");
    assert_eq!(err.remote_status(), Some(404));
}

#[tokio::test]
async fn test_update_merges_fields() {
    let (url, state) = spawn_stub().await;
    state.seed(
        "People",
        vec![json!({ "id": "rec001", "fields": { "Name": "Ada", "Order": 1 } })],
    );
    let store = stub_store(&url);

    let mut fields = serde_json::Map::new();
    fields.insert("Name".to_string(), json!("Ada L."));

    let updated = store.update("People", "rec001", fields).await.unwrap();
    assert_eq!(updated.field("Name").and_then(|v| v.as_str()), Some("Ada L."));
    assert_eq!(updated.field("Order").and_then(|v| v.as_f64()), Some(1.0));
}

#[tokio::test]
async fn test_delete_returns_receipt() {
    let (url, state) = spawn_stub().await;
    state.seed(
        "People",
        vec![json!({ "id": "rec001", "fields": { "Name": "Ada" } })],
    );
    let store = stub_store(&url);

    let receipt = store.delete("People", "rec001").await.unwrap();
    assert!(receipt.deleted);
    assert_eq!(receipt.id, "rec001");

    let err = store.delete("People", "rec001").await.expect_err("already gone");
    assert_eq!(err.remote_status(), Some(404));
}

#[tokio::test]
async fn test_mutation_without_credentials_is_configuration_error() {
    let store = Store::new(StoreConfig::default());
    let err = store
        .delete("People", "rec001")
        .await
        .expect_err("mutations never downgrade to fallback");
    assert!(matches!(err, StoreError::Configuration(_)));
}
