use std::cell::Cell;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::clock::ClockReading;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::scheduling::session_classifier::classify;
use crate::types::session_state::SessionState;
use crate::types::session_window::SessionWindow;
use crate::types::transition_plan::TransitionPlan;

pub const FALLBACK_DELAY: Duration = Duration::from_secs(60);

/// How far ahead to search for the next trading day before giving up.
pub const MAX_LOOKAHEAD_DAYS: u32 = 14;

/// Plans the wake for the next session state change after `reading`.
///
/// Never fails: any planning error is reported to `sink` and replaced by a
/// short fallback wake that keeps the current state. The calendar is asked
/// about today at most once per plan.
pub fn next_transition<H>(
    reading: &ClockReading,
    window: &SessionWindow,
    is_holiday: H,
    sink: &dyn DiagnosticSink,
) -> TransitionPlan
where
    H: Fn(NaiveDate) -> bool,
{
    let today = reading.date();
    let today_is_holiday = Cell::new(None);
    let is_holiday = |date: NaiveDate| {
        if date != today {
            return is_holiday(date);
        }

        let holiday = today_is_holiday.get().unwrap_or_else(|| is_holiday(date));
        today_is_holiday.set(Some(holiday));
        holiday
    };

    match plan_transition(reading, window, &is_holiday) {
        Ok(plan) => plan,
        Err(error) => {
            let last_state = classify(reading, window, &is_holiday);
            let reason = format!("{error:#}");

            sink.emit(DiagnosticEvent::SchedulerDegraded {
                reason: reason.clone(),
                last_state,
                fallback: FALLBACK_DELAY,
            });

            TransitionPlan {
                milliseconds_until_change: FALLBACK_DELAY.as_millis() as u64,
                predicted_next_state: last_state,
                description: format!("degraded: re-checking session in 60s ({reason})"),
                degraded: true,
            }
        }
    }
}

fn plan_transition<H>(
    reading: &ClockReading,
    window: &SessionWindow,
    is_holiday: &H,
) -> Result<TransitionPlan>
where
    H: Fn(NaiveDate) -> bool,
{
    let today = reading.date();
    let minute = reading.minutes_since_midnight();

    let (target, next_state, description) =
        if !window.is_trading_weekday(today.weekday()) || is_holiday(today) {
            let open = next_open_after(today, window, is_holiday)?;
            (open, SessionState::Open, describe_open(open))
        } else if minute < window.open_minute {
            let open = at_minute(today, window.open_minute)?;
            (open, SessionState::Open, describe_open(open))
        } else if minute < window.close_minute {
            (
                at_minute(today, window.close_minute)?,
                SessionState::Closed,
                "regular session closes; final capture follows".to_string(),
            )
        } else if minute == window.close_minute {
            (
                at_minute(today, window.final_capture_minute())?,
                SessionState::FinalCapture,
                "final capture window begins".to_string(),
            )
        } else if minute == window.final_capture_minute() {
            (
                at_minute(today, window.final_capture_minute() + 1)?,
                SessionState::Closed,
                "final capture window ends".to_string(),
            )
        } else {
            let open = next_open_after(today, window, is_holiday)?;
            (open, SessionState::Open, describe_open(open))
        };

    let millis = reading
        .millis_until(target)
        .with_context(|| format!("cannot resolve transition target {target}"))?;
    if millis <= 0 {
        bail!("transition target {target} is not in the future ({millis}ms)");
    }

    Ok(TransitionPlan {
        milliseconds_until_change: millis as u64,
        predicted_next_state: next_state,
        description,
        degraded: false,
    })
}

/// Open of the first trading day strictly after `today`.
fn next_open_after<H>(
    today: NaiveDate,
    window: &SessionWindow,
    is_holiday: &H,
) -> Result<NaiveDateTime>
where
    H: Fn(NaiveDate) -> bool,
{
    let mut candidate = today;

    for _ in 0..MAX_LOOKAHEAD_DAYS {
        candidate = candidate
            .succ_opt()
            .with_context(|| format!("calendar overflow after {candidate}"))?;

        if window.is_trading_weekday(candidate.weekday()) && !is_holiday(candidate) {
            return at_minute(candidate, window.open_minute);
        }
    }

    bail!("no trading day within {MAX_LOOKAHEAD_DAYS} days after {today}")
}

fn at_minute(date: NaiveDate, minute: u32) -> Result<NaiveDateTime> {
    SessionWindow::at_minute(date, minute)
        .with_context(|| format!("minute {minute} is outside the day {date}"))
}

fn describe_open(open: NaiveDateTime) -> String {
    format!("market opens {}", open.format("%a %Y-%m-%d %H:%M"))
}
