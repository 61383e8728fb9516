use std::time::Duration;

use serde::Serialize;

use crate::types::session_state::SessionState;

/// When the next session state change happens and what it changes to.
///
/// Computed fresh for every wake and consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    pub milliseconds_until_change: u64,
    pub predicted_next_state: SessionState,
    pub description: String,

    /// Set when the plan is the fixed fallback rather than a computed transition.
    pub degraded: bool,
}

impl TransitionPlan {
    pub fn until_change(&self) -> Duration {
        Duration::from_millis(self.milliseconds_until_change)
    }
}
