use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Print the current session snapshot as JSON and exit.
    Status,
    /// Drive the dry-run refresher at the session cadence until interrupted.
    Watch,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => write!(f, "status"),
            Self::Watch => write!(f, "watch"),
        }
    }
}

impl FromStr for RunMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "status" | "snapshot" => Ok(Self::Status),
            "watch" | "run" => Ok(Self::Watch),
            other => Err(anyhow!("unknown run mode: {other}")),
        }
    }
}
