use std::fmt;

use serde::Serialize;

/// Trading-activity phase at a given instant. Always derived from a clock
/// reading, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Open,
    Closed,
    FinalCapture,
    Weekend,
}

impl SessionState {
    pub fn is_trading(self) -> bool {
        matches!(self, Self::Open | Self::FinalCapture)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::FinalCapture => write!(f, "final-capture"),
            Self::Weekend => write!(f, "weekend"),
        }
    }
}
