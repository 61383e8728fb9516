pub mod polling_policy;
pub mod session_state;
pub mod session_window;
pub mod transition_plan;
