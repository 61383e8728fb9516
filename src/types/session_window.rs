use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Regular session bounds in exchange-local time.
///
/// Minutes are counted from exchange-local midnight. The close minute itself
/// is outside the session, and the single minute after it is the final
/// capture window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    /// First minute of the regular session (inclusive).
    pub open_minute: u32,

    /// Session end (exclusive).
    pub close_minute: u32,

    /// First trading weekday of the week (inclusive).
    pub first_trading_day: Weekday,

    /// Last trading weekday of the week (inclusive).
    pub last_trading_day: Weekday,
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            open_minute: 9 * 60 + 30,  // 09:30
            close_minute: 16 * 60 + 30, // 16:30
            first_trading_day: Weekday::Mon,
            last_trading_day: Weekday::Fri,
        }
    }
}

impl SessionWindow {
    pub fn new(
        open_minute: u32,
        close_minute: u32,
        first_trading_day: Weekday,
        last_trading_day: Weekday,
    ) -> Result<Self> {
        let window = Self {
            open_minute,
            close_minute,
            first_trading_day,
            last_trading_day,
        };
        window.validate()?;

        Ok(window)
    }

    pub fn final_capture_minute(&self) -> u32 {
        self.close_minute + 1
    }

    pub fn is_trading_weekday(&self, weekday: Weekday) -> bool {
        let day = weekday.num_days_from_monday();

        day >= self.first_trading_day.num_days_from_monday()
            && day <= self.last_trading_day.num_days_from_monday()
    }

    /// Exchange-local timestamp for `minute` on `date`.
    pub fn at_minute(date: NaiveDate, minute: u32) -> Option<NaiveDateTime> {
        date.and_hms_opt(minute / 60, minute % 60, 0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.open_minute >= self.close_minute {
            bail!("open must be before close");
        }
        // the final capture minute and the minute after it must stay on the same day
        if self.close_minute + 2 >= MINUTES_PER_DAY {
            bail!("close must leave room for the final capture minute before midnight");
        }
        if self.first_trading_day.num_days_from_monday()
            > self.last_trading_day.num_days_from_monday()
        {
            bail!(
                "first trading day {} must not come after last trading day {}",
                self.first_trading_day,
                self.last_trading_day
            );
        }
        Ok(())
    }
}

pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Parses an `HH:MM` wall-clock time into minutes since midnight.
pub fn parse_clock_minute(raw: &str) -> Result<u32> {
    let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .with_context(|| format!("invalid clock time \"{raw}\", expected HH:MM"))?;

    Ok(minutes_since_midnight(time))
}
