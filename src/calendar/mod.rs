pub mod exchange_holidays;

use anyhow::Result;
use chrono::NaiveDate;

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};

pub trait HolidayCalendar: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> Result<bool>;
}

impl<F> HolidayCalendar for F
where
    F: Fn(NaiveDate) -> Result<bool> + Send + Sync,
{
    fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        self(date)
    }
}

/// Fail-open holiday check: a calendar error is reported and the date is
/// treated as a normal trading day.
pub fn check_holiday(
    calendar: &dyn HolidayCalendar,
    sink: &dyn DiagnosticSink,
    date: NaiveDate,
) -> bool {
    match calendar.is_holiday(date) {
        Ok(is_holiday) => is_holiday,
        Err(error) => {
            sink.emit(DiagnosticEvent::HolidayCheckFailed {
                date,
                reason: format!("{error:#}"),
            });

            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    #[test]
    fn calendar_errors_fail_open() {
        let sink = RecordingSink::new();
        let broken = |_: NaiveDate| -> Result<bool> { anyhow::bail!("calendar service offline") };
        let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();

        assert!(!check_holiday(&broken, &sink, date));
        assert_eq!(
            sink.events(),
            vec![DiagnosticEvent::HolidayCheckFailed {
                date,
                reason: "calendar service offline".to_string(),
            }]
        );
    }
}
