use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level settings shared by every page the widget runtime serves.
///
/// Page-specific settings (mall, page, flags) live in
/// [`crate::WidgetConfig`] instead.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first HTTP 429 response.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `retry_backoff_base_ms * 2^attempt`.
    pub retry_backoff_base_ms: u64,
    /// Default page size for category listings.
    pub product_limit: u32,
    pub refresh_interval_secs: u64,
    pub coupon_reload_delay_ms: u64,
    pub storage_path: PathBuf,
}
