//! CSV export: one headerless file per symbol per data kind.
//!
//! Row layouts:
//! - bar:   `epoch_seconds,open,high,low,close,volume`
//! - quote: `epoch_nanos,ask_price,ask_size,bid_price,bid_size`
//! - trade: `epoch_nanos,price,size`
//!
//! Prices are written as the shortest decimal that round-trips at 32-bit
//! precision, except the quote bid price which keeps 64-bit precision.

use crate::domain::{Bar, Quote, Trade};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from writing a CSV file. Every variant carries the target path.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("create CSV file {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("write data to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("write/flush data to {}", path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A record with a fixed CSV row layout.
pub trait CsvRow {
    fn fields(&self) -> Vec<String>;
}

/// Shortest round-trip text at 32-bit precision.
pub fn format_f32(v: f64) -> String {
    (v as f32).to_string()
}

/// Shortest round-trip text at 64-bit precision.
pub fn format_f64(v: f64) -> String {
    v.to_string()
}

impl CsvRow for Bar {
    fn fields(&self) -> Vec<String> {
        vec![
            self.time.to_string(),
            format_f32(self.open),
            format_f32(self.high),
            format_f32(self.low),
            format_f32(self.close),
            self.volume.to_string(),
        ]
    }
}

impl CsvRow for Quote {
    fn fields(&self) -> Vec<String> {
        vec![
            self.time_ns.to_string(),
            format_f32(self.ask_price),
            self.ask_size.to_string(),
            format_f64(self.bid_price),
            self.bid_size.to_string(),
        ]
    }
}

impl CsvRow for Trade {
    fn fields(&self) -> Vec<String> {
        vec![
            self.time_ns.to_string(),
            format_f32(self.price),
            self.size.to_string(),
        ]
    }
}

/// Create (or truncate) `path` and write one row per record, in iteration order.
///
/// Returns the number of rows written.
pub fn write_csv<'a, R, I>(path: &Path, records: I) -> Result<usize, WriteError>
where
    R: CsvRow + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|source| WriteError::Create {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = 0;
    for record in records {
        wtr.write_record(record.fields())
            .map_err(|source| WriteError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        rows += 1;
    }

    wtr.flush().map_err(|source| WriteError::Flush {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows, "wrote CSV");
    Ok(rows)
}

/// Make sure a directory exists.
pub fn ensure_dir(path: &Path) -> Result<(), WriteError> {
    std::fs::create_dir_all(path).map_err(|source| WriteError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
