use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::StoreError;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

/// Hard bound on a single remote call.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(6);

/// How long a built connection handle is reused before being rebuilt.
pub const HANDLE_TTL: Duration = Duration::from_secs(300);

/// Whether reads go to the live store or straight to sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Live,
    Mock,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub api_url: String,
    pub mode: DataMode,
    pub force_sample_case_studies: bool,
    pub fetch_timeout: Duration,
    pub handle_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_id: None,
            api_url: DEFAULT_API_URL.to_string(),
            mode: DataMode::Live,
            force_sample_case_studies: false,
            fetch_timeout: FETCH_TIMEOUT,
            handle_ttl: HANDLE_TTL,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_var("AIRTABLE_API_KEY"),
            base_id: non_empty_var("AIRTABLE_BASE_ID"),
            api_url: std::env::var("AIRTABLE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            mode: match std::env::var("DATA_MODE")
                .unwrap_or_else(|_| "live".to_string())
                .to_lowercase()
                .as_str()
            {
                "mock" => DataMode::Mock,
                _ => DataMode::Live,
            },
            force_sample_case_studies: env_flag("FORCE_SAMPLE_CASE_STUDIES"),
            fetch_timeout: FETCH_TIMEOUT,
            handle_ttl: HANDLE_TTL,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.base_id.is_some()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key)
            .unwrap_or_default()
            .to_lowercase()
            .as_str(),
        "1" | "true" | "yes"
    )
}

/// Strip path-like suffixes from a misconfigured base id,
/// e.g. "app123/tbl456/viw789" -> "app123".
pub(crate) fn normalize_base_id(raw: &str) -> &str {
    raw.split(['/', '?']).next().unwrap_or(raw).trim()
}

/// An authenticated connection to one base in the record store. Bound
/// to a single credential pair; never shared across credentials.
#[derive(Debug)]
pub struct Connection {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl Connection {
    fn build(config: &StoreConfig) -> Result<Self, StoreError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| StoreError::Configuration("AIRTABLE_API_KEY is not set".to_string()))?;
        let base_id = config
            .base_id
            .as_deref()
            .ok_or_else(|| StoreError::Configuration("AIRTABLE_BASE_ID is not set".to_string()))?;
        let base_id = normalize_base_id(base_id);
        if base_id.is_empty() {
            return Err(StoreError::Configuration(
                "AIRTABLE_BASE_ID is empty after normalization".to_string(),
            ));
        }

        // The client-level timeout sits above the per-call race so the
        // transport can never outlive the caller by much.
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout + Duration::from_secs(2))
            .build()
            .map_err(|e| StoreError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: format!("{}/{}", config.api_url.trim_end_matches('/'), base_id),
        })
    }

    pub(crate) fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    pub(crate) fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, table, id)
    }

    pub(crate) fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.api_key)
    }
}

struct CachedConnection {
    handle: Arc<Connection>,
    expires_at: Instant,
}

/// Explicit context object for all record store access: configuration
/// plus a time-boxed memo of the connection handle. Passed to call
/// sites instead of living in a process-wide singleton.
pub struct Store {
    config: StoreConfig,
    cached: Mutex<Option<CachedConnection>>,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            cached: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Return the cached connection handle, rebuilding it once the TTL
    /// window has elapsed. Construction is cheap and side-effect free,
    /// so concurrent first use is fine: last writer wins.
    pub fn connection(&self) -> Result<Arc<Connection>, StoreError> {
        let mut slot = match self.cached.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.handle.clone());
            }
        }

        let handle = Arc::new(Connection::build(&self.config)?);
        debug!("Built record store connection");
        *slot = Some(CachedConnection {
            handle: handle.clone(),
            expires_at: Instant::now() + self.config.handle_ttl,
        });

        Ok(handle)
    }
}
