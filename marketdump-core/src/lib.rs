//! marketdump core: symbol scraping, market-data fetchers, CSV export.
//!
//! This crate holds everything the `marketdump` binary runs:
//! - Domain types (bars, quotes, trades, time windows, data kinds)
//! - Export configuration with TOML loading and documented defaults
//! - Symbol lister over the S&P 500 constituents page
//! - Market-data provider trait and the Alpaca v2 HTTP adapter
//! - Chunked bars fetcher and cursor-driven quote/trade pager
//! - Headerless CSV writer with fixed row layouts
//! - Stage orchestrator

pub mod alpaca;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod provider;
pub mod symbols;

pub use config::{ConfigError, Credentials, ExportConfig};
pub use error::ExportError;
pub use pipeline::{run_export, run_stages, ExportSummary};
pub use provider::{ApiError, MarketDataApi, Page};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the provider and its records cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Quote>();
        require_sync::<domain::Quote>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<alpaca::AlpacaProvider>();
        require_sync::<alpaca::AlpacaProvider>();
        require_send::<ExportError>();
        require_sync::<ExportError>();
    }

    /// Compile-time check: fetchers take `&dyn MarketDataApi`, so the trait
    /// must stay object safe.
    #[allow(dead_code)]
    fn assert_provider_object_safe(api: &dyn MarketDataApi) -> &str {
        api.name()
    }
}
