use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::client::Store;
use crate::error::StoreError;
use crate::fetch::{decode, remote_error, RawRecord};
use crate::types::{DeleteReceipt, Record};

#[derive(Serialize)]
struct FieldsBody<'a> {
    fields: &'a serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
struct DeleteResponse {
    id: String,
    #[serde(default)]
    deleted: bool,
}

/// Mutations always require a live connection and always surface their
/// errors - a silent failure to write would be worse than a loud one.
/// One remote call each, no retry; backoff is the caller's business.
impl Store {
    pub async fn create(
        &self,
        table: &str,
        fields: serde_json::Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let conn = self.connection()?;
        let bound = self.config().fetch_timeout;

        let call = async {
            let response = conn
                .request(Method::POST, &conn.table_url(table))
                .json(&FieldsBody { fields: &fields })
                .send()
                .await
                .map_err(remote_error)?;
            let raw: RawRecord = decode(response).await?;
            Ok(Record::from_raw(raw.id, raw.fields))
        };

        let record: Record = timeout(bound, call)
            .await
            .map_err(|_| StoreError::Timeout(bound))??;
        debug!(table = %table, id = %record.id, "Created record");
        Ok(record)
    }

    pub async fn update(
        &self,
        table: &str,
        id: &str,
        fields: serde_json::Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let conn = self.connection()?;
        let bound = self.config().fetch_timeout;

        let call = async {
            let response = conn
                .request(Method::PATCH, &conn.record_url(table, id))
                .json(&FieldsBody { fields: &fields })
                .send()
                .await
                .map_err(remote_error)?;
            let raw: RawRecord = decode(response).await?;
            Ok(Record::from_raw(raw.id, raw.fields))
        };

        let record: Record = timeout(bound, call)
            .await
            .map_err(|_| StoreError::Timeout(bound))??;
        debug!(table = %table, id = %record.id, "Updated record");
        Ok(record)
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<DeleteReceipt, StoreError> {
        let conn = self.connection()?;
        let bound = self.config().fetch_timeout;

        let call = async {
            let response = conn
                .request(Method::DELETE, &conn.record_url(table, id))
                .send()
                .await
                .map_err(remote_error)?;
            let body: DeleteResponse = decode(response).await?;
            Ok(DeleteReceipt {
                id: body.id,
                deleted: body.deleted,
            })
        };

        let receipt: DeleteReceipt = timeout(bound, call)
            .await
            .map_err(|_| StoreError::Timeout(bound))??;
        debug!(table = %table, id = %receipt.id, "Deleted record");
        Ok(receipt)
    }
}
