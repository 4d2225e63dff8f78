//! Bar: one OHLCV record at a fixed timeframe.

use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a fixed timeframe (daily or one-minute).
///
/// `time` is the bar's opening instant in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
