use chrono::NaiveDate;

use crate::clock::ClockReading;
use crate::types::session_state::SessionState;
use crate::types::session_window::SessionWindow;

/// Session state at `reading`. Holiday beats weekend beats time of day.
pub fn classify<H>(reading: &ClockReading, window: &SessionWindow, is_holiday: H) -> SessionState
where
    H: Fn(NaiveDate) -> bool,
{
    if is_holiday(reading.date()) {
        return SessionState::Closed;
    }

    if !window.is_trading_weekday(reading.weekday()) {
        return SessionState::Weekend;
    }

    let minute = reading.minutes_since_midnight();
    if minute >= window.open_minute && minute < window.close_minute {
        SessionState::Open
    } else if minute == window.final_capture_minute() {
        SessionState::FinalCapture
    } else {
        SessionState::Closed
    }
}
