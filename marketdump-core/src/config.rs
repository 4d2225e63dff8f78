//! Serializable export configuration.
//!
//! Every constant the export depends on (dates, window sizes, chunk sizes,
//! page limits, rate-limit pauses) lives here with a default, so a run can be
//! reproduced from a single TOML file.

use crate::domain::{DataKind, TimeWindow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the API key ID.
pub const API_KEY_ID_ENV: &str = "API_KEY_ID";
/// Environment variable holding the API secret key.
pub const API_SECRET_KEY_ENV: &str = "API_SECRET_KEY";

const DEFAULT_SYMBOLS_URL: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";
const DEFAULT_SYMBOLS_SELECTOR: &str = "table#constituents > tbody > tr > td:first-of-type > a";
const DEFAULT_API_BASE_URL: &str = "https://data.alpaca.markets";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Alpaca API credentials.
#[derive(Clone)]
pub struct Credentials {
    key_id: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read both credentials from the process environment.
    ///
    /// Values are opaque: only presence is checked.
    pub fn from_env() -> Result<Self, ConfigError> {
        let key_id =
            std::env::var(API_KEY_ID_ENV).map_err(|_| ConfigError::MissingEnv(API_KEY_ID_ENV))?;
        let secret_key = std::env::var(API_SECRET_KEY_ENV)
            .map_err(|_| ConfigError::MissingEnv(API_SECRET_KEY_ENV))?;
        Ok(Self::new(key_id, secret_key))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Where the ticker list comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SymbolSource {
    pub url: String,
    /// CSS selector matching one element per ticker, in document order.
    pub selector: String,
}

impl Default for SymbolSource {
    fn default() -> Self {
        Self {
            url: DEFAULT_SYMBOLS_URL.into(),
            selector: DEFAULT_SYMBOLS_SELECTOR.into(),
        }
    }
}

/// Market data feed for the Alpaca v2 endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFeed {
    /// Securities Information Processor: full consolidated tape.
    Sip,
    /// Investors Exchange: free tier.
    Iex,
}

impl DataFeed {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Iex => "iex",
        }
    }
}

/// HTTP settings for the data API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Feed override; the account default applies when unset.
    pub feed: Option<DataFeed>,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            feed: None,
            timeout_secs: 30,
        }
    }
}

/// How a stage's time window is derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowSpec {
    /// The trailing `days` ending at run time.
    Trailing { days: i64 },
    /// One fixed UTC calendar day.
    Day { date: NaiveDate },
}

impl WindowSpec {
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<TimeWindow, ConfigError> {
        match *self {
            Self::Trailing { days } => TimeWindow::trailing(now, days).ok_or_else(|| {
                ConfigError::Invalid(format!("trailing window of {days} days is out of range"))
            }),
            Self::Day { date } => day_window(date),
        }
    }
}

fn day_window(date: NaiveDate) -> Result<TimeWindow, ConfigError> {
    TimeWindow::day(date)
        .ok_or_else(|| ConfigError::Invalid(format!("date {date} is outside the supported range")))
}

/// Settings for a batched bars stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BarStage {
    pub window: WindowSpec,
    /// Maximum symbols per request.
    pub chunk_size: usize,
    /// Maximum bars kept per symbol.
    pub limit: u32,
    /// Pause after each chunk request.
    pub pause_ms: u64,
}

impl BarStage {
    pub fn daily() -> Self {
        Self {
            window: WindowSpec::Trailing { days: 365 },
            chunk_size: 100,
            limit: 1000,
            pause_ms: 500,
        }
    }

    pub fn minute() -> Self {
        Self {
            window: WindowSpec::Day {
                date: default_minute_day(),
            },
            chunk_size: 100,
            limit: 1000,
            pause_ms: 500,
        }
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// Settings for a per-symbol paginated tick stage (quotes or trades).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickStage {
    /// UTC day to export.
    pub date: NaiveDate,
    /// Maximum records per page request.
    pub page_limit: u32,
    /// Pause after each symbol.
    pub pause_ms: u64,
}

impl TickStage {
    pub fn quotes() -> Self {
        Self {
            date: default_tick_day(),
            page_limit: 10_000,
            pause_ms: 500,
        }
    }

    pub fn trades() -> Self {
        Self {
            date: default_tick_day(),
            page_limit: 10_000,
            pause_ms: 1000,
        }
    }

    pub fn window(&self) -> Result<TimeWindow, ConfigError> {
        day_window(self.date)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

fn default_minute_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 11, 16).unwrap_or(NaiveDate::MIN)
}

fn default_tick_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 11, 17).unwrap_or(NaiveDate::MIN)
}

/// Complete configuration for one export run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Root under which the `data_*` directories live.
    pub output_root: PathBuf,
    /// Create missing output directories instead of failing on the first write.
    pub create_dirs: bool,
    /// Enabled stages. They always run in `DataKind::ALL` order.
    pub stages: Vec<DataKind>,
    pub symbols: SymbolSource,
    pub api: ApiSettings,
    pub daily_bars: BarStage,
    pub minute_bars: BarStage,
    pub quotes: TickStage,
    pub trades: TickStage,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            create_dirs: false,
            stages: DataKind::ALL.to_vec(),
            symbols: SymbolSource::default(),
            api: ApiSettings::default(),
            daily_bars: BarStage::daily(),
            minute_bars: BarStage::minute(),
            quotes: TickStage::quotes(),
            trades: TickStage::trades(),
        }
    }
}

impl ExportConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, stage) in [("daily_bars", &self.daily_bars), ("minute_bars", &self.minute_bars)] {
            if stage.chunk_size == 0 {
                return Err(ConfigError::Invalid(format!("{name}.chunk_size must be at least 1")));
            }
            if stage.limit == 0 {
                return Err(ConfigError::Invalid(format!("{name}.limit must be at least 1")));
            }
            match stage.window {
                WindowSpec::Trailing { days } if !(1..=36_500).contains(&days) => {
                    return Err(ConfigError::Invalid(format!(
                        "{name}.window.days must be between 1 and 36500, got {days}"
                    )));
                }
                WindowSpec::Day { date } => check_day(&format!("{name}.window.date"), date)?,
                WindowSpec::Trailing { .. } => {}
            }
        }
        for (name, stage) in [("quotes", &self.quotes), ("trades", &self.trades)] {
            if stage.page_limit == 0 {
                return Err(ConfigError::Invalid(format!("{name}.page_limit must be at least 1")));
            }
            check_day(&format!("{name}.date"), stage.date)?;
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether `kind` is enabled for this run.
    pub fn runs(&self, kind: DataKind) -> bool {
        self.stages.contains(&kind)
    }

    /// Point the minute-bar, quote, and trade stages at one UTC day.
    pub fn set_day(&mut self, date: NaiveDate) {
        self.minute_bars.window = WindowSpec::Day { date };
        self.quotes.date = date;
        self.trades.date = date;
    }
}

fn check_day(field: &str, date: NaiveDate) -> Result<(), ConfigError> {
    if TimeWindow::day(date).is_none() {
        return Err(ConfigError::Invalid(format!(
            "{field} {date} is outside the supported range"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExportConfig::default();
        assert_eq!(c.daily_bars.window, WindowSpec::Trailing { days: 365 });
        assert_eq!(c.daily_bars.chunk_size, 100);
        assert_eq!(c.daily_bars.limit, 1000);
        assert_eq!(c.daily_bars.pause(), Duration::from_millis(500));
        assert_eq!(
            c.minute_bars.window,
            WindowSpec::Day {
                date: NaiveDate::from_ymd_opt(2021, 11, 16).unwrap()
            }
        );
        assert_eq!(c.quotes.page_limit, 10_000);
        assert_eq!(c.quotes.pause(), Duration::from_millis(500));
        assert_eq!(c.trades.pause(), Duration::from_secs(1));
        assert_eq!(c.stages, DataKind::ALL.to_vec());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn minute_default_window_ends_at_tick_day() {
        let c = ExportConfig::default();
        let minute = c.minute_bars.window.resolve(Utc::now()).unwrap();
        assert_eq!(minute.end, c.quotes.window().unwrap().start);
    }

    #[test]
    fn toml_roundtrip() {
        let c = ExportConfig::default();
        let toml_str = c.to_toml().unwrap();
        let parsed = ExportConfig::from_toml(&toml_str).unwrap();
        assert_eq!(c, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = ExportConfig::from_toml(
            r#"
output_root = "/tmp/out"
stages = ["quotes"]

[quotes]
date = "2022-03-01"
page_limit = 500
pause_ms = 0
"#,
        )
        .unwrap();
        assert_eq!(c.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(c.quotes.page_limit, 500);
        assert_eq!(c.trades, TickStage::trades());
        assert!(c.runs(DataKind::Quotes));
        assert!(!c.runs(DataKind::DailyBars));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut c = ExportConfig::default();
        c.minute_bars.chunk_size = 0;
        match c.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("minute_bars.chunk_size")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn far_future_tick_date_is_rejected() {
        let c = ExportConfig::from_toml(
            r#"
[quotes]
date = "9999-12-31"
page_limit = 10000
pause_ms = 500
"#,
        );
        match c {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("quotes.date")),
            other => panic!("expected Invalid, got {other:?}"),
        }

        let mut c = ExportConfig::default();
        c.trades.date = NaiveDate::MAX;
        assert!(matches!(c.trades.window(), Err(ConfigError::Invalid(_))));
        assert!(c.validate().is_err());
    }

    #[test]
    fn out_of_range_minute_day_is_rejected() {
        let mut c = ExportConfig::default();
        c.set_day(NaiveDate::from_ymd_opt(2300, 1, 1).unwrap());
        match c.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("minute_bars.window.date")),
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(c.minute_bars.window.resolve(Utc::now()).is_err());
    }

    #[test]
    fn set_day_moves_all_fixed_day_stages() {
        let mut c = ExportConfig::default();
        let day = NaiveDate::from_ymd_opt(2023, 5, 2).unwrap();
        c.set_day(day);
        assert_eq!(c.minute_bars.window, WindowSpec::Day { date: day });
        assert_eq!(c.quotes.date, day);
        assert_eq!(c.trades.date, day);
        assert_eq!(c.daily_bars.window, WindowSpec::Trailing { days: 365 });
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials::new("my-key", "my-secret");
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("my-key"));
        assert!(!dbg.contains("my-secret"));
        assert!(dbg.contains("REDACTED"));
    }
}
