use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Consumption state of a watch record or season.
///
/// There is no enforced transition graph: any state can move to any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchedStatus {
    Planned,
    Watching,
    Finished,
    Hold,
    Dropped,
}

impl WatchedStatus {
    pub const ALL: [WatchedStatus; 5] = [
        Self::Planned,
        Self::Watching,
        Self::Finished,
        Self::Hold,
        Self::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Watching => "WATCHING",
            Self::Finished => "FINISHED",
            Self::Hold => "HOLD",
            Self::Dropped => "DROPPED",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for WatchedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLANNED" => Ok(Self::Planned),
            "WATCHING" => Ok(Self::Watching),
            "FINISHED" => Ok(Self::Finished),
            "HOLD" => Ok(Self::Hold),
            "DROPPED" => Ok(Self::Dropped),
            other => Err(format!(
                "Invalid status: {}. Use one of planned, watching, finished, hold, dropped",
                other
            )),
        }
    }
}
