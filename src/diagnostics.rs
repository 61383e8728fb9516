use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::types::session_state::SessionState;

/// Degraded-mode and timer events raised by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    ClockDegraded {
        timezone: String,
        reason: String,
    },
    HolidayCheckFailed {
        date: NaiveDate,
        reason: String,
    },
    SchedulerDegraded {
        reason: String,
        last_state: SessionState,
        fallback: Duration,
    },
    WakeArmed {
        id: Uuid,
        delay: Duration,
        predicted_next_state: SessionState,
    },
    WakeCancelled {
        id: Uuid,
    },
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::ClockDegraded { timezone, reason } => {
                warn!(%timezone, %reason, "exchange timezone unavailable; using host clock");
            }
            DiagnosticEvent::HolidayCheckFailed { date, reason } => {
                error!(%date, %reason, "holiday check failed; treating date as a trading day");
            }
            DiagnosticEvent::SchedulerDegraded {
                reason,
                last_state,
                fallback,
            } => {
                warn!(%reason, %last_state, ?fallback, "scheduler degraded to fallback wake");
            }
            DiagnosticEvent::WakeArmed {
                id,
                delay,
                predicted_next_state,
            } => {
                debug!(%id, ?delay, %predicted_next_state, "transition wake armed");
            }
            DiagnosticEvent::WakeCancelled { id } => {
                debug!(%id, "transition wake cancelled");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, event: DiagnosticEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
