pub mod calendar;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod orchestrator;
pub mod run_mode;
pub mod scheduling;
pub mod session;
pub mod types;

pub use crate::config::SessionConfig;
pub use crate::session::{MarketSession, SessionSnapshot};
pub use crate::types::polling_policy::PollingPolicy;
pub use crate::types::session_state::SessionState;
pub use crate::types::transition_plan::TransitionPlan;
