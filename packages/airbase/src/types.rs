use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::FieldValue;

/// Marks whether a response carries live store rows or hard-coded
/// sample content, so the presentation layer can show a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Sample,
}

/// One row from the record store: an opaque id plus whatever named
/// columns the row happened to have. No schema is declared ahead of
/// time; the field set is discovered per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Merge a row id with its raw field map. The `id` name is reserved
    /// for the record identifier; a column of that name is dropped so it
    /// can never shadow the real id.
    pub fn from_raw(id: String, fields: serde_json::Map<String, Value>) -> Self {
        let fields = fields
            .into_iter()
            .filter(|(name, _)| name != "id")
            .map(|(name, value)| (name, FieldValue::from(value)))
            .collect();
        Self { id, fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// The envelope every read returns: rows in store view order plus
/// where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSet {
    pub provenance: Provenance,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn live(records: Vec<Record>) -> Self {
        Self {
            provenance: Provenance::Live,
            records,
        }
    }

    pub fn sample(records: Vec<Record>) -> Self {
        Self {
            provenance: Provenance::Sample,
            records,
        }
    }

    pub fn is_sample(&self) -> bool {
        self.provenance == Provenance::Sample
    }
}

/// Query options for a table fetch. Everything is optional; defaults
/// are applied at fetch time (max 100 records, store default view).
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub max_records: Option<u32>,
    pub view: Option<String>,
    pub fields: Option<Vec<String>>,
    pub filter_by_formula: Option<String>,
}

impl Query {
    pub const DEFAULT_MAX_RECORDS: u32 = 100;

    pub fn with_filter(formula: impl Into<String>) -> Self {
        Self {
            filter_by_formula: Some(formula.into()),
            ..Self::default()
        }
    }
}

/// Acknowledgement of a remote delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReceipt {
    pub id: String,
    pub deleted: bool,
}
