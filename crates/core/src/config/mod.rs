//! Application configuration with layered loading.
//!
//! Configuration is assembled with figment from, highest priority first:
//!
//! 1. Environment variables (HVSUM_*)
//! 2. TOML config file (HVSUM_CONFIG_FILE, or `<config_dir>/config.toml` when present)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::{ConfigError, MAX_SEARCH_CONCURRENCY};

const ENV_PREFIX: &str = "HVSUM_";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory for the cache, sessions and the config file.
    ///
    /// Set via HVSUM_CONFIG_DIR environment variable.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// When false every cache read misses and writes are dropped.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Lifetime of a cache entry in hours.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u32,

    /// Age after which an uncommitted entry counts as abandoned.
    #[serde(default = "default_pending_grace_hours")]
    pub pending_grace_hours: u32,

    /// Whether interactive sessions are written to disk.
    #[serde(default = "default_true")]
    pub session_persist: bool,

    /// Sessions not accessed for this many days are removed by `session clean`.
    #[serde(default = "default_session_max_age_days")]
    pub session_max_age_days: u32,

    /// Cap on the merged result list of a search batch.
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    /// Results requested from the provider for each query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Maximum provider calls in flight per batch.
    #[serde(default = "default_search_concurrency")]
    pub search_concurrency: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via HVSUM_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Brave API subscription token. Enables the Brave engine.
    ///
    /// Set via HVSUM_BRAVE_API_KEY environment variable.
    #[serde(default)]
    pub brave_api_key: Option<String>,

    /// Brave freshness filter (`pd`, `pw`, `pm`, `py` or `YYYY-MM-DDtoYYYY-MM-DD`).
    ///
    /// Set via HVSUM_BRAVE_FRESHNESS environment variable.
    #[serde(default)]
    pub brave_freshness: Option<String>,

    /// SerpAPI key. Enables the SerpAPI engine.
    ///
    /// Set via HVSUM_SERPAPI_KEY environment variable.
    #[serde(default)]
    pub serpapi_key: Option<String>,

    #[serde(default)]
    pub debug_mode: bool,
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("hvsum")
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_hours() -> u32 {
    24
}

fn default_pending_grace_hours() -> u32 {
    crate::cache::DEFAULT_PENDING_GRACE_HOURS
}

fn default_session_max_age_days() -> u32 {
    30
}

fn default_max_search_results() -> usize {
    crate::search::orchestrator::DEFAULT_MAX_RESULTS
}

fn default_results_per_query() -> usize {
    crate::search::orchestrator::DEFAULT_LIMIT_PER_QUERY
}

fn default_search_concurrency() -> usize {
    crate::search::orchestrator::DEFAULT_CONCURRENCY
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    concat!("hvsum/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            cache_enabled: true,
            cache_ttl_hours: default_cache_ttl_hours(),
            pending_grace_hours: default_pending_grace_hours(),
            session_persist: true,
            session_max_age_days: default_session_max_age_days(),
            max_search_results: default_max_search_results(),
            results_per_query: default_results_per_query(),
            search_concurrency: default_search_concurrency(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            brave_api_key: None,
            brave_freshness: None,
            serpapi_key: None,
            debug_mode: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Directory holding one JSON file per cache entry.
    pub fn cache_dir(&self) -> PathBuf {
        self.config_dir.join("cache")
    }

    /// Directory holding one JSON file per saved session.
    pub fn sessions_dir(&self) -> PathBuf {
        self.config_dir.join("sessions")
    }

    pub fn pending_grace(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.pending_grace_hours))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file or environment cannot be
    /// parsed, or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = Self::config_file() {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Toml::file(&path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The TOML file to merge, if any.
    ///
    /// An explicit `HVSUM_CONFIG_FILE` always wins; the default location is
    /// only used when it exists.
    fn config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("HVSUM_CONFIG_FILE") {
            return Some(PathBuf::from(path));
        }

        let dir = std::env::var_os("HVSUM_CONFIG_DIR").map(PathBuf::from).unwrap_or_else(default_config_dir);
        let path = dir.join("config.toml");
        path.is_file().then_some(path)
    }

    /// Brave API key, for callers that need it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_brave_api_key(&self) -> Result<&str, ConfigError> {
        self.brave_api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| ConfigError::Missing {
            field: "brave_api_key".into(),
            hint: "Set HVSUM_BRAVE_API_KEY environment variable".into(),
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_serpapi_key(&self) -> Result<&str, ConfigError> {
        self.serpapi_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| ConfigError::Missing {
            field: "serpapi_key".into(),
            hint: "Set HVSUM_SERPAPI_KEY environment variable".into(),
        })
    }
}
