use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Weekday};
use serde::Deserialize;

use crate::types::polling_policy::PollingIntervals;
use crate::types::session_window::{SessionWindow, parse_clock_minute};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,

    #[serde(default)]
    pub polling: PollingIntervals,

    #[serde(default)]
    pub holidays: HolidayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// IANA zone of the exchange, e.g. `America/New_York`.
    pub timezone: String,

    /// Regular session open, `HH:MM` exchange time.
    pub open: String,

    /// Regular session close, `HH:MM` exchange time. Final capture is the minute after.
    pub close: String,

    pub first_trading_day: Weekday,
    pub last_trading_day: Weekday,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            open: "09:30".to_string(),
            close: "16:30".to_string(),
            first_trading_day: Weekday::Mon,
            last_trading_day: Weekday::Fri,
        }
    }
}

impl ExchangeConfig {
    pub fn session_window(&self) -> Result<SessionWindow> {
        let open = parse_clock_minute(&self.open).context("invalid exchange.open")?;
        let close = parse_clock_minute(&self.close).context("invalid exchange.close")?;

        SessionWindow::new(open, close, self.first_trading_day, self.last_trading_day)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolidayConfig {
    /// Unscheduled closures on top of the regular holiday rules.
    #[serde(default)]
    pub additional_closures: Vec<NaiveDate>,
}

impl SessionConfig {
    pub const FILE_NAME: &'static str = "market_session.yml";

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config {}", path.display()))?;

        Self::from_yaml(&raw)
            .with_context(|| format!("failed to load session config {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: SessionConfig =
            serde_yaml::from_str(raw).context("failed to parse session config")?;

        config
            .validate()
            .context("session config validation failed")?;

        Ok(config)
    }

    pub fn session_window(&self) -> Result<SessionWindow> {
        self.exchange.session_window()
    }

    fn validate(&self) -> Result<()> {
        if self.exchange.timezone.trim().is_empty() {
            bail!("exchange.timezone must not be empty");
        }
        self.session_window()?;
        self.polling
            .validate()
            .context("invalid polling intervals")?;
        Ok(())
    }
}
