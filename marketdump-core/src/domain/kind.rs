//! Data kinds (export stages) and bar timeframes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Bar aggregation interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    Day,
    Minute,
}

impl TimeFrame {
    /// Timeframe string understood by the Alpaca v2 bars endpoint.
    pub const fn api_name(&self) -> &'static str {
        match self {
            Self::Day => "1Day",
            Self::Minute => "1Min",
        }
    }

    /// Short suffix used in output directory and file names.
    pub const fn file_suffix(&self) -> &'static str {
        match self {
            Self::Day => "1D",
            Self::Minute => "1Min",
        }
    }
}

/// One of the four export stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    DailyBars,
    MinuteBars,
    Quotes,
    Trades,
}

impl DataKind {
    pub const ALL: [DataKind; 4] = [
        DataKind::DailyBars,
        DataKind::MinuteBars,
        DataKind::Quotes,
        DataKind::Trades,
    ];

    pub const fn timeframe(&self) -> Option<TimeFrame> {
        match self {
            Self::DailyBars => Some(TimeFrame::Day),
            Self::MinuteBars => Some(TimeFrame::Minute),
            Self::Quotes | Self::Trades => None,
        }
    }

    /// Output directory name, relative to the output root.
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::DailyBars => "data_1D",
            Self::MinuteBars => "data_1Min",
            Self::Quotes => "data_Quote",
            Self::Trades => "data_Trade",
        }
    }

    /// File name for one symbol of this kind.
    pub fn file_name(&self, symbol: &str) -> String {
        match self.timeframe() {
            Some(tf) => format!("{symbol}_{}.csv", tf.file_suffix()),
            None => format!("{symbol}.csv"),
        }
    }

    /// Full output path for one symbol under `root`.
    pub fn output_path(&self, root: &Path, symbol: &str) -> PathBuf {
        root.join(self.dir_name()).join(self.file_name(symbol))
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DailyBars => "daily_bars",
            Self::MinuteBars => "minute_bars",
            Self::Quotes => "quotes",
            Self::Trades => "trades",
        };
        f.write_str(name)
    }
}
