pub mod exchange_clock;
pub mod manual_clock;

use anyhow::{Result, anyhow};
use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::types::session_window::minutes_since_midnight;

pub trait SessionClock: Send + Sync {
    fn now(&self) -> ClockReading;
}

/// One observation of "now", in absolute and exchange-local terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    pub utc: DateTime<Utc>,

    /// Exchange-local wall-clock time, or host-local time when degraded.
    pub local: NaiveDateTime,

    /// `None` when the exchange timezone could not be resolved.
    pub timezone: Option<Tz>,
}

impl ClockReading {
    pub fn in_timezone(utc: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            utc,
            local: utc.with_timezone(&timezone).naive_local(),
            timezone: Some(timezone),
        }
    }

    pub fn host_local(utc: DateTime<Utc>) -> Self {
        Self {
            utc,
            local: utc.with_timezone(&Local).naive_local(),
            timezone: None,
        }
    }

    /// Reading for an exchange-local wall-clock time. Ambiguous times resolve
    /// to the earlier instant.
    pub fn at_local(local: NaiveDateTime, timezone: Tz) -> Result<Self> {
        let resolved = timezone
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| anyhow!("{local} does not exist in {timezone}"))?;

        Ok(Self::in_timezone(resolved.with_timezone(&Utc), timezone))
    }

    pub fn is_degraded(&self) -> bool {
        self.timezone.is_none()
    }

    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn weekday(&self) -> Weekday {
        self.local.weekday()
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        minutes_since_midnight(self.local.time())
    }

    /// Milliseconds from this reading until the exchange-local `target`,
    /// rounded up so a wake never lands before the target.
    ///
    /// The target is resolved in the exchange timezone, so daylight-saving
    /// shifts between now and the target are accounted for. Degraded
    /// readings fall back to wall-clock difference.
    pub fn millis_until(&self, target: NaiveDateTime) -> Result<i64> {
        let delta = match self.timezone {
            Some(timezone) => {
                let target = timezone
                    .from_local_datetime(&target)
                    .earliest()
                    .ok_or_else(|| anyhow!("{target} does not exist in {timezone}"))?;

                target.with_timezone(&Utc) - self.utc
            }
            None => target - self.local,
        };

        Ok(ceil_millis(delta))
    }
}

fn ceil_millis(delta: Duration) -> i64 {
    let millis = delta.num_milliseconds();
    if delta > Duration::milliseconds(millis) {
        millis + 1
    } else {
        millis
    }
}
