//! Quote and trade ticks: nanosecond-stamped records keyed by their timestamp.

use serde::{Deserialize, Serialize};

/// A record stamped with a nanosecond epoch timestamp.
///
/// Tick collections are keyed by `time_ns`, so two ticks with the same
/// timestamp collapse to one entry (last write wins).
pub trait Tick {
    fn time_ns(&self) -> i64;
}

/// Bid/ask snapshot at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub time_ns: i64,
    pub ask_price: f64,
    pub ask_size: u64,
    pub bid_price: f64,
    pub bid_size: u64,
}

impl Tick for Quote {
    fn time_ns(&self) -> i64 {
        self.time_ns
    }
}

/// An executed trade's price and size at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub time_ns: i64,
    pub price: f64,
    pub size: u64,
}

impl Tick for Trade {
    fn time_ns(&self) -> i64 {
        self.time_ns
    }
}
