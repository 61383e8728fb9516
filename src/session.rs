use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::calendar::exchange_holidays::ExchangeHolidayCalendar;
use crate::calendar::{HolidayCalendar, check_holiday};
use crate::clock::exchange_clock::ExchangeClock;
use crate::clock::{ClockReading, SessionClock};
use crate::config::SessionConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::scheduling::session_classifier::classify;
use crate::scheduling::transition_scheduler::next_transition;
use crate::scheduling::wake::{CancelHandle, TransitionTimer, arm_once};
use crate::types::polling_policy::{PollingIntervals, PollingPolicy};
use crate::types::session_state::SessionState;
use crate::types::session_window::SessionWindow;
use crate::types::transition_plan::TransitionPlan;

/// Entry point for consumers: current session state, polling cadence and the
/// next transition, all derived from a fresh clock reading on every call.
pub struct MarketSession {
    clock: Arc<dyn SessionClock>,
    calendar: Arc<dyn HolidayCalendar>,
    window: SessionWindow,
    intervals: PollingIntervals,
    sink: Arc<dyn DiagnosticSink>,
}

/// State, policy and plan computed from a single reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub observed_at: DateTime<Utc>,
    pub exchange_time: NaiveDateTime,
    pub clock_degraded: bool,
    pub state: SessionState,
    pub policy: PollingPolicy,
    pub next_transition: TransitionPlan,
}

impl MarketSession {
    pub fn new(
        clock: Arc<dyn SessionClock>,
        calendar: Arc<dyn HolidayCalendar>,
        window: SessionWindow,
        intervals: PollingIntervals,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            clock,
            calendar,
            window,
            intervals,
            sink,
        }
    }

    /// Wires the system clock and the rule-based holiday calendar from config.
    pub fn from_config(config: &SessionConfig, sink: Arc<dyn DiagnosticSink>) -> Result<Self> {
        let window = config.session_window()?;
        let clock = ExchangeClock::from_name(&config.exchange.timezone, sink.as_ref());
        let calendar =
            ExchangeHolidayCalendar::new(config.holidays.additional_closures.iter().copied());

        tracing::info!(
            timezone = %config.exchange.timezone,
            open = %config.exchange.open,
            close = %config.exchange.close,
            "market session configured"
        );

        Ok(Self::new(
            Arc::new(clock),
            Arc::new(calendar),
            window,
            config.polling,
            sink,
        ))
    }

    pub fn session_state(&self) -> SessionState {
        self.state_at(&self.clock.now())
    }

    pub fn polling_policy(&self) -> PollingPolicy {
        self.intervals.policy_for(self.session_state())
    }

    pub fn policy_for(&self, state: SessionState) -> PollingPolicy {
        self.intervals.policy_for(state)
    }

    pub fn next_transition_plan(&self) -> TransitionPlan {
        self.plan_at(&self.clock.now())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let reading = self.clock.now();
        let state = self.state_at(&reading);

        SessionSnapshot {
            observed_at: reading.utc,
            exchange_time: reading.local,
            clock_degraded: reading.is_degraded(),
            state,
            policy: self.intervals.policy_for(state),
            next_transition: self.plan_at(&reading),
        }
    }

    pub fn state_at(&self, reading: &ClockReading) -> SessionState {
        classify(reading, &self.window, |date| self.is_holiday(date))
    }

    pub fn plan_at(&self, reading: &ClockReading) -> TransitionPlan {
        next_transition(
            reading,
            &self.window,
            |date| self.is_holiday(date),
            self.sink.as_ref(),
        )
    }

    /// Arms a one-shot wake for `plan`. The caller owns the handle and must
    /// cancel it on teardown.
    pub fn arm_once<F>(&self, plan: &TransitionPlan, on_fire: F) -> CancelHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = arm_once(plan, on_fire);

        self.sink.emit(DiagnosticEvent::WakeArmed {
            id: handle.id(),
            delay: handle.delay(),
            predicted_next_state: plan.predicted_next_state,
        });

        handle
    }

    /// Cancels whatever `timer` holds, then arms it for `plan`.
    pub fn rearm<F>(
        &self,
        timer: &mut TransitionTimer,
        plan: &TransitionPlan,
        on_fire: F,
    ) -> CancelHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.disarm(timer);

        let handle = timer.arm(plan, on_fire).clone();
        self.sink.emit(DiagnosticEvent::WakeArmed {
            id: handle.id(),
            delay: handle.delay(),
            predicted_next_state: plan.predicted_next_state,
        });

        handle
    }

    /// Cancels `handle`. Reports nothing once the wake has fired or was
    /// already cancelled.
    pub fn cancel(&self, handle: &CancelHandle) {
        if handle.cancel() {
            self.sink
                .emit(DiagnosticEvent::WakeCancelled { id: handle.id() });
        }
    }

    /// Cancels whatever `timer` still holds.
    pub fn disarm(&self, timer: &mut TransitionTimer) {
        if let Some(handle) = timer.cancel() {
            self.sink
                .emit(DiagnosticEvent::WakeCancelled { id: handle.id() });
        }
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        check_holiday(self.calendar.as_ref(), self.sink.as_ref(), date)
    }
}
