use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Historia";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Historia/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Historia")
}

/// Database file path, overridable with HISTORIA_DB
pub fn database_path() -> PathBuf {
    match std::env::var("HISTORIA_DB") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => app_data_dir().join("historia.db"),
    }
}

/// Listen address for the HTTP server, overridable with HISTORIA_ADDR
pub fn bind_addr() -> String {
    std::env::var("HISTORIA_ADDR").unwrap_or_else(|_| "127.0.0.1:8420".to_string())
}

/// Fallback log filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

/// Bounds on one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationLimits {
    /// Per-category fetch deadline. A slow source degrades to a
    /// TimedOut diagnostic, never a hung request.
    pub category_timeout: Duration,
    /// Maximum entries an unbounded index listing returns.
    pub index_page_cap: usize,
}

impl Default for AggregationLimits {
    fn default() -> Self {
        AggregationLimits {
            category_timeout: Duration::from_secs(5),
            index_page_cap: 50,
        }
    }
}

impl AggregationLimits {
    /// Defaults overlaid with HISTORIA_CATEGORY_TIMEOUT_MS and
    /// HISTORIA_PAGE_CAP where those parse.
    pub fn from_env() -> Self {
        let mut limits = AggregationLimits::default();
        if let Ok(ms) = std::env::var("HISTORIA_CATEGORY_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                limits.category_timeout = Duration::from_millis(ms);
            }
        }
        if let Ok(cap) = std::env::var("HISTORIA_PAGE_CAP") {
            if let Ok(cap) = cap.parse::<usize>() {
                limits.index_page_cap = cap;
            }
        }
        limits
    }
}
