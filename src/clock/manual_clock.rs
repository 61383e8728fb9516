use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::clock::{ClockReading, SessionClock};

/// Clock that only moves when told to. Used to pin "now" in tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    timezone: Tz,
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            timezone,
            now: Mutex::new(now),
        }
    }

    pub fn at_local(local: NaiveDateTime, timezone: Tz) -> Result<Self> {
        let reading = ClockReading::at_local(local, timezone)?;

        Ok(Self::new(reading.utc, timezone))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.lock() {
            Ok(mut current) => *current = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub fn advance(&self, by: Duration) {
        let current = self.instant();
        let next = chrono::Duration::from_std(by)
            .ok()
            .and_then(|by| current.checked_add_signed(by))
            .unwrap_or(current);

        self.set(next);
    }

    fn instant(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl SessionClock for ManualClock {
    fn now(&self) -> ClockReading {
        ClockReading::in_timezone(self.instant(), self.timezone)
    }
}
