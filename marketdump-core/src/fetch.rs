//! Batch fetchers: bars in symbol chunks, quotes and trades per symbol.
//!
//! Everything runs sequentially. Rate limiting is preventive only: a fixed
//! pause after each bars chunk and after each tick symbol. Any provider or
//! write error aborts the stage immediately.

use crate::config::{BarStage, TickStage};
use crate::domain::{DataKind, Tick, TimeFrame, TimeWindow};
use crate::error::ExportError;
use crate::export::{write_csv, CsvRow};
use crate::provider::{ApiError, BarsRequest, MarketDataApi, Page, PageRequest};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// What one stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub kind: DataKind,
    /// Remote calls issued (bars chunks, or tick pages).
    pub requests: usize,
    pub files: usize,
    pub records: usize,
}

impl StageReport {
    fn new(kind: DataKind) -> Self {
        Self {
            kind,
            requests: 0,
            files: 0,
            records: 0,
        }
    }
}

/// Split symbols into consecutive chunks of at most `size`, preserving order.
///
/// A `size` of zero is treated as one.
pub fn chunk_symbols(symbols: &[String], size: usize) -> std::slice::Chunks<'_, String> {
    symbols.chunks(size.max(1))
}

/// Short human description of a symbol chunk for logs and errors.
fn describe_chunk(chunk: &[String]) -> String {
    match chunk {
        [] => "no symbols".into(),
        [only] => only.clone(),
        [first, .., last] => format!("{} symbols {first}..{last}", chunk.len()),
    }
}

fn pause(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

/// Fetch bars for every symbol at one timeframe and write one file per symbol.
///
/// One `list_bars` call per chunk; each symbol keeps at most `stage.limit`
/// bars, stable-sorted by time. Symbols the provider returns no bars for get
/// no file.
pub fn fetch_bars(
    api: &dyn MarketDataApi,
    timeframe: TimeFrame,
    symbols: &[String],
    stage: &BarStage,
    window: TimeWindow,
    root: &Path,
) -> Result<StageReport, ExportError> {
    let kind = match timeframe {
        TimeFrame::Day => DataKind::DailyBars,
        TimeFrame::Minute => DataKind::MinuteBars,
    };
    let mut report = StageReport::new(kind);
    let operation = format!("list bars {}", timeframe.api_name());

    for chunk in chunk_symbols(symbols, stage.chunk_size) {
        info!(
            provider = api.name(),
            timeframe = timeframe.api_name(),
            symbols = ?chunk,
            start = %window.start,
            end = %window.end,
            limit = stage.limit,
            "list bars"
        );

        let request = BarsRequest {
            symbols: chunk,
            timeframe,
            window,
            limit: stage.limit,
        };
        let by_symbol = api
            .list_bars(&request)
            .map_err(|source| ExportError::Api {
                operation: operation.clone(),
                subject: describe_chunk(chunk),
                source,
            })?;
        report.requests += 1;

        for (symbol, mut bars) in by_symbol {
            bars.sort_by_key(|b| b.time);
            bars.truncate(stage.limit as usize);
            let path = kind.output_path(root, &symbol);
            report.records += write_csv(&path, &bars)?;
            report.files += 1;
        }

        pause(stage.pause());
    }

    Ok(report)
}

/// Ticks collected for one symbol, keyed and ordered by nanosecond timestamp.
#[derive(Debug, Clone)]
pub struct TickPull<T> {
    pub ticks: BTreeMap<i64, T>,
    pub pages: usize,
}

/// Pull every tick in `window` for one symbol through a cursor-driven pager.
///
/// Each page request starts at the cursor and spans the window's length. The
/// cursor advances to one nanosecond past each consumed record, so repeats of
/// the last timestamp are skipped on the next page. Pulling stops when:
/// - a record at or past `window.end` is seen,
/// - the page reports `done`,
/// - the cursor reaches `window.end`, or
/// - a page fails to advance the cursor (empty page without `done`).
///
/// Within the window, a later record with the same timestamp replaces an
/// earlier one.
pub fn collect_ticks<T, F>(
    symbol: &str,
    window: TimeWindow,
    page_limit: u32,
    mut next_page: F,
) -> Result<TickPull<T>, ApiError>
where
    T: Tick,
    F: FnMut(&PageRequest<'_>) -> Result<Page<T>, ApiError>,
{
    let end_ns = window.end.timestamp_nanos_opt().unwrap_or(i64::MAX);
    let span = window.length();
    let mut cursor = window.start;
    let mut ticks = BTreeMap::new();
    let mut pages = 0;

    loop {
        let request = PageRequest {
            symbol,
            start: cursor,
            end: cursor.checked_add_signed(span).unwrap_or(window.end),
            limit: page_limit,
        };
        info!(symbol, start = %request.start, end = %request.end, limit = page_limit, "request page");

        let page = next_page(&request)?;
        pages += 1;

        let before = cursor;
        let mut exhausted = false;
        for record in page.records {
            let ts = record.time_ns();
            if ts >= end_ns {
                exhausted = true;
                break;
            }
            let next = DateTime::<Utc>::from_timestamp_nanos(ts.saturating_add(1));
            if next > cursor {
                cursor = next;
            }
            ticks.insert(ts, record);
        }

        if exhausted || page.done || cursor >= window.end {
            break;
        }
        if cursor == before {
            warn!(symbol, cursor = %cursor, "page did not advance the cursor; stopping");
            break;
        }
    }

    Ok(TickPull { ticks, pages })
}

fn fetch_ticks<T, F>(
    kind: DataKind,
    operation: &str,
    symbols: &[String],
    stage: &TickStage,
    root: &Path,
    mut next_page: F,
) -> Result<StageReport, ExportError>
where
    T: Tick + CsvRow,
    F: FnMut(&PageRequest<'_>) -> Result<Page<T>, ApiError>,
{
    let mut report = StageReport::new(kind);
    let window = stage.window()?;

    for symbol in symbols {
        let pull = collect_ticks(symbol, window, stage.page_limit, &mut next_page).map_err(
            |source| ExportError::Api {
                operation: operation.to_string(),
                subject: symbol.clone(),
                source,
            },
        )?;
        report.requests += pull.pages;

        let path = kind.output_path(root, symbol);
        report.records += write_csv(&path, pull.ticks.values())?;
        report.files += 1;

        pause(stage.pause());
    }

    Ok(report)
}

/// Pull one day of quotes per symbol and write `data_Quote/<SYMBOL>.csv`.
pub fn fetch_quotes(
    api: &dyn MarketDataApi,
    symbols: &[String],
    stage: &TickStage,
    root: &Path,
) -> Result<StageReport, ExportError> {
    fetch_ticks(DataKind::Quotes, "get quotes", symbols, stage, root, |req| {
        api.quotes_page(req)
    })
}

/// Pull one day of trades per symbol and write `data_Trade/<SYMBOL>.csv`.
pub fn fetch_trades(
    api: &dyn MarketDataApi,
    symbols: &[String],
    stage: &TickStage,
    root: &Path,
) -> Result<StageReport, ExportError> {
    fetch_ticks(DataKind::Trades, "get trades", symbols, stage, root, |req| {
        api.trades_page(req)
    })
}
