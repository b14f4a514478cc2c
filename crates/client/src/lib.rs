//! HTTP search providers for hvsum.
//!
//! Every client implements [`hvsum_core::SearchProvider`], so the core
//! orchestrator never sees HTTP details.

pub mod brave;
pub mod duckduckgo;
pub mod error;
pub mod http;
pub mod serpapi;

use std::sync::Arc;

use hvsum_core::{AppConfig, MultiProvider, SearchProvider};

pub use brave::{BraveClient, BraveConfig};
pub use duckduckgo::DuckDuckGoClient;
pub use error::ProviderError;
pub use http::HttpSettings;
pub use serpapi::SerpApiClient;

/// Build the configured engine set.
///
/// DuckDuckGo is always present. Brave and SerpAPI join when their keys are set.
pub fn providers_from_config(config: &AppConfig) -> Result<MultiProvider, ProviderError> {
    let settings = HttpSettings::from_config(config);
    let mut engines: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(DuckDuckGoClient::new(&settings)?)];

    if let Ok(key) = config.require_brave_api_key() {
        let freshness = config.brave_freshness.clone().filter(|f| !f.is_empty());
        let brave = BraveConfig { freshness, ..BraveConfig::new(key, settings.clone()) };
        engines.push(Arc::new(BraveClient::new(brave)?));
    }

    if let Ok(key) = config.require_serpapi_key() {
        engines.push(Arc::new(SerpApiClient::new(key, &settings)?));
    }

    let multi = MultiProvider::new(engines);
    tracing::debug!(engines = ?multi.engine_names(), "search engines configured");
    Ok(multi)
}
