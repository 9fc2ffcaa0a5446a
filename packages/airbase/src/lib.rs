pub mod client;
pub mod env;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod mutate;
pub mod tables;
pub mod types;
pub mod value;

pub use client::{DataMode, Store, StoreConfig};
pub use env::{check_env, EnvReport, REQUIRED_KEYS};
pub use error::StoreError;
pub use fetch::ResiliencePolicy;
pub use types::{DeleteReceipt, Provenance, Query, Record, RecordSet};
pub use value::{Attachment, FieldValue};
