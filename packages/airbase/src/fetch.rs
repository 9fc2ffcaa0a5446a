use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::client::{Connection, DataMode, Store};
use crate::error::StoreError;
use crate::fallback;
use crate::types::{Query, Record, RecordSet};

/// What a read does when the remote store fails: surface the typed
/// error, or quietly serve sample data so rendering never hard-fails.
/// Decided once at the boundary and threaded explicitly through every
/// fetch, never inferred from ambient globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResiliencePolicy {
    Strict,
    DegradeToFallback,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<RawRecord>,
    offset: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct RawRecord {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) fields: serde_json::Map<String, Value>,
}

impl Store {
    /// Fetch rows from one table, in store view order.
    ///
    /// Missing credentials degrade to sample data under both policies;
    /// remote and timeout failures obey `policy`. A table with zero
    /// matching rows is an empty live result, not an error.
    pub async fn fetch(
        &self,
        table: &str,
        query: &Query,
        policy: ResiliencePolicy,
    ) -> Result<RecordSet, StoreError> {
        if self.config().mode == DataMode::Mock {
            debug!(table = %table, "Mock mode; serving sample records");
            return Ok(RecordSet::sample(fallback::sample_records(table)));
        }

        let conn = match self.connection() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(table = %table, error = %e, "Record store unavailable; serving sample records");
                return Ok(RecordSet::sample(fallback::sample_records(table)));
            }
        };

        let bound = self.config().fetch_timeout;
        let outcome = match timeout(bound, fetch_rows(&conn, table, query)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(bound)),
        };

        match outcome {
            Ok(records) => {
                debug!(table = %table, count = records.len(), "Fetched records");
                Ok(RecordSet::live(records))
            }
            Err(e) => match policy {
                ResiliencePolicy::Strict => Err(e),
                ResiliencePolicy::DegradeToFallback => {
                    warn!(table = %table, error = %e, "Fetch failed; serving sample records");
                    Ok(RecordSet::sample(fallback::sample_records(table)))
                }
            },
        }
    }
}

async fn fetch_rows(
    conn: &Connection,
    table: &str,
    query: &Query,
) -> Result<Vec<Record>, StoreError> {
    let max_records = query.max_records.unwrap_or(Query::DEFAULT_MAX_RECORDS);
    let mut records: Vec<Record> = Vec::new();
    let mut offset: Option<String> = None;

    loop {
        let mut params: Vec<(&str, String)> = vec![("maxRecords", max_records.to_string())];
        if let Some(view) = &query.view {
            params.push(("view", view.clone()));
        }
        if let Some(formula) = &query.filter_by_formula {
            params.push(("filterByFormula", formula.clone()));
        }
        if let Some(fields) = &query.fields {
            for field in fields {
                params.push(("fields[]", field.clone()));
            }
        }
        if let Some(cursor) = &offset {
            params.push(("offset", cursor.clone()));
        }

        let response = conn
            .request(Method::GET, &conn.table_url(table))
            .query(&params)
            .send()
            .await
            .map_err(remote_error)?;
        let page: ListResponse = decode(response).await?;

        records.extend(
            page.records
                .into_iter()
                .map(|raw| Record::from_raw(raw.id, raw.fields)),
        );

        offset = page.offset;
        if offset.is_none() || records.len() >= max_records as usize {
            break;
        }
    }

    records.truncate(max_records as usize);
    Ok(records)
}

pub(crate) fn remote_error(err: reqwest::Error) -> StoreError {
    StoreError::Remote {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Remote {
            status: Some(status.as_u16()),
            message: remote_message(&body, status),
        });
    }
    response.json::<T>().await.map_err(remote_error)
}

/// Pull the human-readable message out of the store's error body. The
/// store sends either {"error": "NOT_FOUND"} or
/// {"error": {"type": ..., "message": ...}}.
fn remote_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => match v.get("error") {
            Some(Value::String(code)) => code.clone(),
            Some(detail) => detail
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| detail.to_string()),
            None => status.to_string(),
        },
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod fetch_tests {
    use super::*;

    #[test]
    fn test_remote_message_string_form() {
        assert_eq!(
            remote_message(r#"{"error":"NOT_FOUND"}"#, StatusCode::NOT_FOUND),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_remote_message_object_form() {
        let body = r#"{"error":{"type":"TABLE_NOT_FOUND","message":"Could not find table People"}}"#;
        assert_eq!(
            remote_message(body, StatusCode::NOT_FOUND),
            "Could not find table People"
        );
    }

    #[test]
    fn test_remote_message_falls_back_to_status() {
        assert_eq!(
            remote_message("", StatusCode::BAD_GATEWAY),
            StatusCode::BAD_GATEWAY.to_string()
        );
    }
}
