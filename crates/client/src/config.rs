use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

// ── REST API ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the dashboard REST API.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max retries on transient failures (transport errors and 5xx).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds (doubled per attempt).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

// ── Event streams ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Base URL of the server-sent event endpoints.
    #[serde(default = "default_stream_base_url")]
    pub base_url: String,

    /// Initial reconnect delay in milliseconds.
    #[serde(default = "default_initial_reconnect_ms")]
    pub initial_reconnect_ms: u64,

    /// Reconnect delay cap in milliseconds.
    #[serde(default = "default_max_reconnect_ms")]
    pub max_reconnect_ms: u64,
}

// ── Defaults ───────────────────────────────────────────────────────

fn default_api_base_url() -> String {
    "http://localhost:8000/api".into()
}
fn default_stream_base_url() -> String {
    "http://localhost:8000/sse".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_initial_reconnect_ms() -> u64 {
    1_000
}
fn default_max_reconnect_ms() -> u64 {
    60_000
}

// ── Default impls ──────────────────────────────────────────────────

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_stream_base_url(),
            initial_reconnect_ms: default_initial_reconnect_ms(),
            max_reconnect_ms: default_max_reconnect_ms(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing keys.
    pub fn load(path: &str) -> jd_domain::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DashboardConfig =
            toml::from_str(&content).map_err(|e| jd_domain::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }
}
