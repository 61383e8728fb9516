use chrono::Utc;
use chrono_tz::Tz;

use crate::clock::{ClockReading, SessionClock};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};

/// System clock read in the exchange's timezone.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeClock {
    timezone: Option<Tz>,
}

impl ExchangeClock {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone: Some(timezone),
        }
    }

    /// Resolves an IANA zone name. An unknown zone degrades the clock to host
    /// local time instead of failing.
    pub fn from_name(timezone: &str, sink: &dyn DiagnosticSink) -> Self {
        match timezone.parse::<Tz>() {
            Ok(timezone) => Self::new(timezone),
            Err(error) => {
                sink.emit(DiagnosticEvent::ClockDegraded {
                    timezone: timezone.to_string(),
                    reason: error.to_string(),
                });

                Self { timezone: None }
            }
        }
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }
}

impl SessionClock for ExchangeClock {
    fn now(&self) -> ClockReading {
        let now = Utc::now();

        match self.timezone {
            Some(timezone) => ClockReading::in_timezone(now, timezone),
            None => ClockReading::host_local(now),
        }
    }
}
