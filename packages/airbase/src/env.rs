use tracing::{info, warn};

/// Environment variables the full deployment expects. The store
/// credentials gate live reads; the rest belong to the admin/session
/// boundary next door.
pub const REQUIRED_KEYS: &[&str] = &[
    "AIRTABLE_API_KEY",
    "AIRTABLE_BASE_ID",
    "SESSION_SECRET",
    "ADMIN_EMAIL",
    "ADMIN_PASSWORD",
];

#[derive(Debug, Clone, Default)]
pub struct EnvReport {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl EnvReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Whether the record store credentials themselves are in place.
    pub fn store_access(&self) -> bool {
        !self
            .missing
            .iter()
            .any(|key| key == "AIRTABLE_API_KEY" || key == "AIRTABLE_BASE_ID")
    }
}

/// One-shot check of required configuration keys. Never fails; reports
/// what is present and what is missing and warns about the degraded
/// capability once.
pub fn check_env(required: &[&str]) -> EnvReport {
    let mut report = EnvReport::default();

    for key in required {
        match std::env::var(key) {
            Ok(value) if !value.trim().is_empty() => report.present.push(key.to_string()),
            _ => report.missing.push(key.to_string()),
        }
    }

    if report.missing.is_empty() {
        info!("All required environment variables are set");
    } else {
        warn!(
            missing = %report.missing.join(", "),
            "Missing required environment variables"
        );
        if !report.store_access() {
            warn!("Record store access disabled; read endpoints will serve sample data");
        }
    }

    report
}
