use std::sync::Arc;

use airbase::{
    DataMode, Query, RecordSet, ResiliencePolicy, Store, StoreConfig, StoreError,
};
use axum::{
    extract::{Path, Query as HttpQuery, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

pub struct Config {
    pub listen_addr: String,
    pub policy: ResiliencePolicy,
    pub session_secret: String,
    pub store: StoreConfig,
}

pub fn load_config() -> Config {
    Config {
        listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8680".to_string()),
        policy: match std::env::var("RESILIENCE_POLICY")
            .unwrap_or_else(|_| "degrade".to_string())
            .to_lowercase()
            .as_str()
        {
            "strict" => ResiliencePolicy::Strict,
            _ => ResiliencePolicy::DegradeToFallback,
        },
        session_secret: std::env::var("SESSION_SECRET").unwrap_or_default(),
        store: StoreConfig::from_env(),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub policy: ResiliencePolicy,
    pub session_secret: Arc<String>,
}

pub fn create_app(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/records/:table", post(create_record_handler))
        .route(
            "/api/records/:table/:id",
            patch(update_record_handler).delete(delete_record_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/people", get(people_handler))
        .route("/api/case-studies", get(case_studies_handler))
        .route("/api/landscape", get(landscape_handler))
        .route("/api/papers", get(papers_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .merge(admin)
        .with_state(state)
}

async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let auth_header = req.headers().get(AUTHORIZATION);

    match auth_header {
        Some(header)
            if !state.session_secret.is_empty()
                && header.to_str().unwrap_or_default()
                    == format!("Bearer {}", state.session_secret) =>
        {
            next.run(req).await
        }
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

// --- Read handlers ---

/// Query string accepted by the list endpoints, mirroring the options
/// object the page layer passes around.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    max_records: Option<u32>,
    view: Option<String>,
    filter_by_formula: Option<String>,
    /// Comma-separated column names.
    fields: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Query {
        Query {
            max_records: self.max_records,
            view: self.view,
            filter_by_formula: self.filter_by_formula,
            fields: self.fields.map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
        }
    }
}

fn respond(result: Result<RecordSet, StoreError>) -> Response {
    match result {
        Ok(set) => Json(set).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Remote { .. } => StatusCode::BAD_GATEWAY,
        StoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    warn!(error = %err, "Request failed");
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn people_handler(
    State(state): State<AppState>,
    HttpQuery(params): HttpQuery<ListParams>,
) -> Response {
    respond(
        state
            .store
            .fetch_people(&params.into_query(), state.policy)
            .await,
    )
}

async fn case_studies_handler(
    State(state): State<AppState>,
    HttpQuery(params): HttpQuery<ListParams>,
) -> Response {
    respond(
        state
            .store
            .fetch_case_studies(&params.into_query(), state.policy)
            .await,
    )
}

async fn landscape_handler(
    State(state): State<AppState>,
    HttpQuery(params): HttpQuery<ListParams>,
) -> Response {
    respond(
        state
            .store
            .fetch_landscape_topics(&params.into_query(), state.policy)
            .await,
    )
}

async fn papers_handler(
    State(state): State<AppState>,
    HttpQuery(params): HttpQuery<ListParams>,
) -> Response {
    respond(
        state
            .store
            .fetch_bibliography(&params.into_query(), state.policy)
            .await,
    )
}

async fn metrics_handler(
    State(state): State<AppState>,
    HttpQuery(params): HttpQuery<ListParams>,
) -> Response {
    respond(
        state
            .store
            .fetch_metrics(&params.into_query(), state.policy)
            .await,
    )
}

// --- Admin mutation handlers ---

#[derive(Debug, Deserialize)]
struct MutationBody {
    fields: serde_json::Map<String, Value>,
}

async fn create_record_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(body): Json<MutationBody>,
) -> Response {
    match state.store.create(&table, body.fields).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn update_record_handler(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Json(body): Json<MutationBody>,
) -> Response {
    match state.store.update(&table, &id, body.fields).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_record_handler(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Response {
    match state.store.delete(&table, &id).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(e) => error_response(e),
    }
}

// --- Service handlers ---

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "mode": match state.store.config().mode {
            DataMode::Live => "live",
            DataMode::Mock => "mock",
        },
        "store_configured": state.store.is_configured(),
    }))
}

async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
