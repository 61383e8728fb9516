use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::types::session_state::SessionState;

/// Refresh cadence for one session state. Rebuilt whenever the state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollingPolicy {
    /// `None` disables price polling entirely.
    pub price_interval_millis: Option<u64>,
    pub news_interval_millis: u64,
    pub should_poll: bool,
}

impl PollingPolicy {
    pub fn price_interval(&self) -> Option<Duration> {
        self.price_interval_millis.map(Duration::from_millis)
    }

    pub fn news_interval(&self) -> Duration {
        Duration::from_millis(self.news_interval_millis)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollingIntervals {
    /// Price refresh while the market is open or capturing the close.
    pub live_price_ms: u64,

    /// News refresh while the market is open.
    pub open_news_ms: u64,

    /// News refresh while closed or on weekends.
    pub closed_news_ms: u64,
}

impl Default for PollingIntervals {
    fn default() -> Self {
        Self {
            live_price_ms: 60_000,
            open_news_ms: 900_000,
            closed_news_ms: 7_200_000,
        }
    }
}

impl PollingIntervals {
    pub fn policy_for(&self, state: SessionState) -> PollingPolicy {
        if state.is_trading() {
            PollingPolicy {
                price_interval_millis: Some(self.live_price_ms),
                news_interval_millis: self.open_news_ms,
                should_poll: true,
            }
        } else {
            PollingPolicy {
                price_interval_millis: None,
                news_interval_millis: self.closed_news_ms,
                should_poll: false,
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.live_price_ms == 0 {
            bail!("live_price_ms must be > 0");
        }
        if self.open_news_ms == 0 {
            bail!("open_news_ms must be > 0");
        }
        if self.closed_news_ms == 0 {
            bail!("closed_news_ms must be > 0");
        }
        Ok(())
    }
}
