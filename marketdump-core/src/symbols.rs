//! Symbol lister: scrapes the S&P 500 constituent tickers from a web page.
//!
//! The page is an external, unversioned source: a layout change shows up as
//! an empty list rather than an error, because HTML parsing is lenient.

use crate::config::SymbolSource;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::info;

/// Errors from fetching or parsing the symbol page.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("get symbol page {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("get symbol page {url}: HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("parse symbol page: {0}")]
    Parse(String),
}

/// Fetch the symbol page and extract tickers in document order.
pub fn fetch_symbols(
    client: &reqwest::blocking::Client,
    source: &SymbolSource,
) -> Result<Vec<String>, SymbolError> {
    let selector = compile_selector(&source.selector)?;

    let resp = client
        .get(&source.url)
        .send()
        .map_err(|e| SymbolError::Fetch {
            url: source.url.clone(),
            source: e,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SymbolError::Status {
            url: source.url.clone(),
            status,
        });
    }

    let body = resp
        .text()
        .map_err(|e| SymbolError::Parse(format!("read body from {}: {e}", source.url)))?;

    let symbols = select_symbols(&body, &selector);
    info!(url = %source.url, count = symbols.len(), "scraped symbols");
    Ok(symbols)
}

/// Extract tickers from an HTML document using a CSS selector string.
pub fn parse_symbols(html: &str, selector: &str) -> Result<Vec<String>, SymbolError> {
    let selector = compile_selector(selector)?;
    Ok(select_symbols(html, &selector))
}

fn compile_selector(selector: &str) -> Result<Selector, SymbolError> {
    Selector::parse(selector)
        .map_err(|e| SymbolError::Parse(format!("invalid selector '{selector}': {e}")))
}

fn select_symbols(html: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: &[(&str, &str)]) -> String {
        let body: String = rows
            .iter()
            .map(|(ticker, name)| {
                format!(
                    "<tr><td><a href=\"/quote/{ticker}\">{ticker}</a></td>\
                     <td><a href=\"/wiki/{name}\">{name}</a></td></tr>"
                )
            })
            .collect();
        format!(
            "<html><body>\
             <table id=\"other\"><tbody><tr><td><a>NOPE</a></td></tr></tbody></table>\
             <table id=\"constituents\"><thead><tr><th>Symbol</th><th>Security</th></tr></thead>\
             <tbody>{body}</tbody></table></body></html>"
        )
    }

    fn default_selector() -> String {
        SymbolSource::default().selector
    }

    #[test]
    fn extracts_first_column_in_order() {
        let html = page(&[("AAPL", "Apple"), ("MSFT", "Microsoft"), ("GOOGL", "Alphabet")]);
        let symbols = parse_symbols(&html, &default_selector()).unwrap();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "GOOGL"]);
    }

    #[test]
    fn empty_table_yields_empty_list() {
        let html = page(&[]);
        let symbols = parse_symbols(&html, &default_selector()).unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn missing_table_yields_empty_list() {
        let symbols = parse_symbols("<html><body><p>moved</p></body></html>", &default_selector())
            .unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let html = page(&[("BRK.B", "Berkshire"), ("BRK.B", "Berkshire")]);
        let symbols = parse_symbols(&html, &default_selector()).unwrap();
        assert_eq!(symbols, vec!["BRK.B", "BRK.B"]);
    }

    #[test]
    fn implicit_tbody_is_matched() {
        // html5ever inserts <tbody> when the markup omits it
        let html = "<table id=\"constituents\"><tr><td><a> MMM </a></td><td>3M</td></tr></table>";
        let symbols = parse_symbols(html, &default_selector()).unwrap();
        assert_eq!(symbols, vec!["MMM"]);
    }

    #[test]
    fn invalid_selector_is_a_parse_error() {
        let result = parse_symbols("<html></html>", "table[[");
        assert!(matches!(result, Err(SymbolError::Parse(_))));
    }
}
