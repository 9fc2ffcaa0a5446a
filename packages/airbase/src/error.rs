use std::time::Duration;
use thiserror::Error;

/// Errors produced by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required credentials are missing or malformed. Fatal for
    /// mutations; read paths degrade to sample data instead.
    #[error("record store not configured: {0}")]
    Configuration(String),

    /// The remote store rejected the request (bad table, bad formula,
    /// permission denied, rate limited, ...).
    #[error("record store request failed: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// The remote call did not complete within the bound. The in-flight
    /// request is abandoned, not cancelled remotely.
    #[error("record store request timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }

    /// HTTP status returned by the remote store, if the failure got that far.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            StoreError::Remote { status, .. } => *status,
            _ => None,
        }
    }
}
