//! Market-data provider trait and structured error types.
//!
//! The MarketDataApi trait abstracts over the remote data service so the
//! fetchers can run against the Alpaca HTTP adapter in production and against
//! scripted fakes in tests.

use crate::domain::{Bar, Quote, TimeFrame, TimeWindow, Trade};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors returned by a market-data provider.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// One batched bars request: many symbols, one timeframe, one window.
#[derive(Debug, Clone, Copy)]
pub struct BarsRequest<'a> {
    pub symbols: &'a [String],
    pub timeframe: TimeFrame,
    pub window: TimeWindow,
    /// Cap on the number of bars returned per symbol.
    pub limit: u32,
}

/// One page of a cursor-driven tick pull for a single symbol.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub symbol: &'a str,
    /// The cursor: earliest timestamp (inclusive) to return.
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Maximum records in this page.
    pub limit: u32,
}

/// A page of records in ascending timestamp order.
///
/// `done` is the provider's end-of-stream signal: no further records exist
/// in the requested range beyond this page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub done: bool,
}

impl<T> Page<T> {
    pub fn last(records: Vec<T>) -> Self {
        Self {
            records,
            done: true,
        }
    }

    pub fn more(records: Vec<T>) -> Self {
        Self {
            records,
            done: false,
        }
    }
}

/// Trait for market-data providers (Alpaca, test fakes).
///
/// Implementations block until the response is complete. Rate limiting is the
/// caller's concern; providers never sleep or retry.
pub trait MarketDataApi: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for a batch of symbols. Symbols with no bars in the window
    /// may be absent from the returned map.
    fn list_bars(&self, request: &BarsRequest<'_>) -> Result<BTreeMap<String, Vec<Bar>>, ApiError>;

    /// Fetch one page of quotes starting at the request cursor.
    fn quotes_page(&self, request: &PageRequest<'_>) -> Result<Page<Quote>, ApiError>;

    /// Fetch one page of trades starting at the request cursor.
    fn trades_page(&self, request: &PageRequest<'_>) -> Result<Page<Trade>, ApiError>;
}
