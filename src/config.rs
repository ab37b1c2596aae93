use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Quaylog";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory.
/// `QUAYLOG_DATA_DIR` overrides the default of ~/Quaylog/.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("QUAYLOG_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Quaylog")
}

/// Get the SQLite database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("quaylog.db")
}

/// Get the upload storage root
pub fn storage_dir() -> PathBuf {
    app_data_dir().join("uploads")
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub completion_base_url: String,
    pub completion_api_key: Option<String>,
    pub completion_model: String,
    pub completion_timeout_secs: u64,
    /// Documents stuck in `processing` longer than this are swept to
    /// `failed`.
    pub stale_processing_secs: i64,
    pub stale_sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
            completion_base_url: "https://api.openai.com".to_string(),
            completion_api_key: None,
            completion_model: "gpt-4o-mini".to_string(),
            completion_timeout_secs: 300,
            stale_processing_secs: 900,
            stale_sweep_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    /// Build from `QUAYLOG_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("QUAYLOG_BIND", defaults.bind_addr),
            completion_base_url: env_or("QUAYLOG_API_BASE", defaults.completion_base_url),
            completion_api_key: std::env::var("QUAYLOG_API_KEY").ok(),
            completion_model: env_or("QUAYLOG_MODEL", defaults.completion_model),
            completion_timeout_secs: env_parse_or(
                "QUAYLOG_TIMEOUT_SECS",
                defaults.completion_timeout_secs,
            ),
            stale_processing_secs: env_parse_or(
                "QUAYLOG_STALE_SECS",
                defaults.stale_processing_secs,
            ),
            stale_sweep_interval_secs: env_parse_or(
                "QUAYLOG_SWEEP_INTERVAL_SECS",
                defaults.stale_sweep_interval_secs,
            ),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
