//! Alpaca market-data v2 provider.
//!
//! Thin blocking adapter over the REST endpoints:
//! - `GET /v2/stocks/bars`: multi-symbol bars, paginated by `next_page_token`
//! - `GET /v2/stocks/{symbol}/quotes`
//! - `GET /v2/stocks/{symbol}/trades`
//!
//! Bars pages are followed inside `list_bars`, so one call returns the whole
//! batch. Quote and trade pages are not: the caller drives them with a
//! timestamp cursor, and a missing `next_page_token` is reported as `done`.

use crate::config::{ApiSettings, Credentials, DataFeed};
use crate::domain::{Bar, Quote, Trade};
use crate::provider::{ApiError, BarsRequest, MarketDataApi, Page, PageRequest};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Largest page the v2 endpoints accept.
const MAX_PAGE_LIMIT: u32 = 10_000;

const KEY_ID_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";

#[derive(Debug, Deserialize)]
struct BarsResponse {
    #[serde(default)]
    bars: Option<BTreeMap<String, Vec<BarData>>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BarData {
    t: DateTime<Utc>,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: u64,
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    #[serde(default)]
    quotes: Option<Vec<QuoteData>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    t: DateTime<Utc>,
    ap: f64,
    #[serde(rename = "as")]
    ask_size: u64,
    bp: f64,
    bs: u64,
}

#[derive(Debug, Deserialize)]
struct TradesResponse {
    #[serde(default)]
    trades: Option<Vec<TradeData>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TradeData {
    t: DateTime<Utc>,
    p: f64,
    s: u64,
}

/// Build the blocking HTTP client shared by the symbol lister and the provider.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("marketdump/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Alpaca market-data provider.
pub struct AlpacaProvider {
    client: reqwest::blocking::Client,
    credentials: Credentials,
    base_url: String,
    feed: Option<DataFeed>,
}

impl AlpacaProvider {
    pub fn new(
        client: reqwest::blocking::Client,
        settings: &ApiSettings,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            credentials,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            feed: settings.feed,
        }
    }

    fn stocks_url(&self, path: &str) -> String {
        format!("{}/v2/stocks/{path}", self.base_url)
    }

    /// Issue one authenticated GET and decode the JSON body.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut req = self
            .client
            .get(url)
            .header(KEY_ID_HEADER, self.credentials.key_id())
            .header(SECRET_KEY_HEADER, self.credentials.secret_key())
            .query(query);
        if let Some(feed) = self.feed {
            req = req.query(&[("feed", feed.as_str())]);
        }

        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let body = resp.text()?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("failed to parse response from {url}: {e}")))
    }
}

impl MarketDataApi for AlpacaProvider {
    fn name(&self) -> &str {
        "alpaca"
    }

    fn list_bars(&self, request: &BarsRequest<'_>) -> Result<BTreeMap<String, Vec<Bar>>, ApiError> {
        let url = self.stocks_url("bars");
        let page_limit = page_limit_for(request.limit, request.symbols.len());
        let mut out: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("symbols", request.symbols.join(",")),
                ("timeframe", request.timeframe.api_name().to_string()),
                ("start", rfc3339(request.window.start)),
                ("end", rfc3339(request.window.end)),
                ("limit", page_limit.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("page_token", token));
            }

            let resp: BarsResponse = self.get_json(&url, &query)?;
            merge_bars(&mut out, resp.bars.unwrap_or_default());

            match resp.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(out)
    }

    fn quotes_page(&self, request: &PageRequest<'_>) -> Result<Page<Quote>, ApiError> {
        let url = self.stocks_url(&format!("{}/quotes", request.symbol));
        let resp: QuotesResponse = self.get_json(&url, &page_query(request))?;
        let records = resp
            .quotes
            .unwrap_or_default()
            .into_iter()
            .map(QuoteData::into_quote)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(page_of(records, resp.next_page_token))
    }

    fn trades_page(&self, request: &PageRequest<'_>) -> Result<Page<Trade>, ApiError> {
        let url = self.stocks_url(&format!("{}/trades", request.symbol));
        let resp: TradesResponse = self.get_json(&url, &page_query(request))?;
        let records = resp
            .trades
            .unwrap_or_default()
            .into_iter()
            .map(TradeData::into_trade)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(page_of(records, resp.next_page_token))
    }
}

impl BarData {
    fn into_bar(self) -> Bar {
        Bar {
            time: self.t.timestamp(),
            open: self.o,
            high: self.h,
            low: self.l,
            close: self.c,
            volume: self.v,
        }
    }
}

impl QuoteData {
    fn into_quote(self) -> Result<Quote, ApiError> {
        Ok(Quote {
            time_ns: epoch_nanos(self.t)?,
            ask_price: self.ap,
            ask_size: self.ask_size,
            bid_price: self.bp,
            bid_size: self.bs,
        })
    }
}

impl TradeData {
    fn into_trade(self) -> Result<Trade, ApiError> {
        Ok(Trade {
            time_ns: epoch_nanos(self.t)?,
            price: self.p,
            size: self.s,
        })
    }
}

fn merge_bars(out: &mut BTreeMap<String, Vec<Bar>>, page: BTreeMap<String, Vec<BarData>>) {
    for (symbol, bars) in page {
        out.entry(symbol)
            .or_default()
            .extend(bars.into_iter().map(BarData::into_bar));
    }
}

fn page_of<T>(records: Vec<T>, next_page_token: Option<String>) -> Page<T> {
    match next_page_token {
        Some(token) if !token.is_empty() => Page::more(records),
        _ => Page::last(records),
    }
}

fn page_query(request: &PageRequest<'_>) -> Vec<(&'static str, String)> {
    vec![
        ("start", rfc3339(request.start)),
        ("end", rfc3339(request.end)),
        ("limit", request.limit.min(MAX_PAGE_LIMIT).to_string()),
    ]
}

/// Bars page size: enough for every symbol's cap, bounded by the API maximum.
fn page_limit_for(per_symbol: u32, symbols: usize) -> u32 {
    let wanted = u64::from(per_symbol).saturating_mul(symbols.max(1) as u64);
    wanted.min(u64::from(MAX_PAGE_LIMIT)) as u32
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn epoch_nanos(t: DateTime<Utc>) -> Result<i64, ApiError> {
    t.timestamp_nanos_opt()
        .ok_or_else(|| ApiError::Decode(format!("timestamp out of range: {t}")))
}
