//! US equity market holiday rules.
//!
//! Holidays are derived from the observance rules rather than a fixed table,
//! so any year in [`FIRST_RULE_YEAR`, `LAST_RULE_YEAR`] is covered. Weekend
//! holidays move to the adjacent weekday, except New Year's Day on a Saturday,
//! which is not observed (the exchange does not close on the last trading day
//! of the prior year).

use std::collections::BTreeSet;

use anyhow::{Result, bail};
use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::calendar::HolidayCalendar;

pub const FIRST_RULE_YEAR: i32 = 1998;
pub const LAST_RULE_YEAR: i32 = 2099;

/// Rule-based exchange holidays plus ad-hoc closures from configuration.
#[derive(Debug, Clone, Default)]
pub struct ExchangeHolidayCalendar {
    additional_closures: BTreeSet<NaiveDate>,
}

impl ExchangeHolidayCalendar {
    pub fn new(additional_closures: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            additional_closures: additional_closures.into_iter().collect(),
        }
    }

    pub fn holidays_for_year(year: i32) -> Result<Vec<NaiveDate>> {
        if !(FIRST_RULE_YEAR..=LAST_RULE_YEAR).contains(&year) {
            bail!("holiday rules not defined for {year}");
        }

        let mut holidays = Vec::with_capacity(10);

        let new_year = ymd(year, 1, 1)?;
        match new_year.weekday() {
            Weekday::Sat => {}
            Weekday::Sun => holidays.push(ymd(year, 1, 2)?),
            _ => holidays.push(new_year),
        }

        holidays.push(nth_weekday(year, 1, Weekday::Mon, 3)?); // Martin Luther King Jr. Day
        holidays.push(nth_weekday(year, 2, Weekday::Mon, 3)?); // Washington's Birthday
        holidays.push(good_friday(year)?);
        holidays.push(last_weekday(year, 5, Weekday::Mon)?); // Memorial Day
        if year >= 2022 {
            holidays.push(observed(ymd(year, 6, 19)?)?); // Juneteenth
        }
        holidays.push(observed(ymd(year, 7, 4)?)?);
        holidays.push(nth_weekday(year, 9, Weekday::Mon, 1)?); // Labor Day
        holidays.push(nth_weekday(year, 11, Weekday::Thu, 4)?); // Thanksgiving
        holidays.push(observed(ymd(year, 12, 25)?)?);

        Ok(holidays)
    }
}

impl HolidayCalendar for ExchangeHolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        if self.additional_closures.contains(&date) {
            return Ok(true);
        }

        Ok(Self::holidays_for_year(date.year())?.contains(&date))
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Ok(date),
        None => bail!("invalid date {year}-{month:02}-{day:02}"),
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Result<NaiveDate> {
    match NaiveDate::from_weekday_of_month_opt(year, month, weekday, n) {
        Some(date) => Ok(date),
        None => bail!("no {weekday} #{n} in {year}-{month:02}"),
    }
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Result<NaiveDate> {
    let first_of_next = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };

    let mut day = first_of_next.pred_opt();
    while let Some(date) = day {
        if date.weekday() == weekday {
            return Ok(date);
        }
        day = date.pred_opt();
    }

    bail!("no {weekday} in {year}-{month:02}")
}

/// Saturday holidays are observed on Friday, Sunday holidays on Monday.
fn observed(date: NaiveDate) -> Result<NaiveDate> {
    let shifted = match date.weekday() {
        Weekday::Sat => date.checked_sub_days(Days::new(1)),
        Weekday::Sun => date.checked_add_days(Days::new(1)),
        _ => Some(date),
    };

    match shifted {
        Some(shifted) => Ok(shifted),
        None => bail!("cannot shift holiday {date}"),
    }
}

/// Two days before Easter Sunday (anonymous Gregorian computus).
fn good_friday(year: i32) -> Result<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    let easter = ymd(year, month as u32, day as u32)?;
    match easter.checked_sub_days(Days::new(2)) {
        Some(date) => Ok(date),
        None => bail!("cannot derive Good Friday for {year}"),
    }
}
