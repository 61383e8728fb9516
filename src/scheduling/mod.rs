pub mod session_classifier;
pub mod transition_scheduler;
pub mod wake;
