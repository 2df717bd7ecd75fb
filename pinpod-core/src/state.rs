//! Value types held in the controller's state register.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the background peer node, as reported by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    Nonexistent,
    Starting,
    Started,
    Stopping,
    Stopped,
    Error,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Nonexistent => "nonexistent",
            NodeState::Starting => "starting",
            NodeState::Started => "started",
            NodeState::Stopping => "stopping",
            NodeState::Stopped => "stopped",
            NodeState::Error => "error",
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, NodeState::Started)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS-level foreground status of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    #[default]
    Unknown,
    Active,
    Background,
    Inactive,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Unknown => "unknown",
            AppState::Active => "active",
            AppState::Background => "background",
            AppState::Inactive => "inactive",
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(AppState::Unknown),
            "active" => Ok(AppState::Active),
            "background" => Ok(AppState::Background),
            "inactive" => Ok(AppState::Inactive),
            other => Err(ParseError::UnknownAppState(other.to_string())),
        }
    }
}

/// Error parsing a state name received from the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown app state: {0}")]
    UnknownAppState(String),
}

/// Opaque identifier of a thread owned by the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        ThreadId(s.to_string())
    }
}

/// Content-addressed identifier of a block produced by pinning a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory the SDK prepared from a local file, ready to be added to a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedDir {
    pub hash: String,
}

/// Parameters for creating a new thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadConfig {
    pub key: String,
    pub name: String,
    pub shared: bool,
}

/// Aggregate counters reported by the SDK. Each field is [`SummaryCounters::UNKNOWN`]
/// until the first refresh completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounters {
    #[serde(alias = "thread_cnt")]
    pub thread_count: i64,
    #[serde(alias = "file_cnt")]
    pub file_count: i64,
    #[serde(alias = "account_peer_cnt")]
    pub peer_count: i64,
    #[serde(alias = "contact_cnt")]
    pub contact_count: i64,
}

impl SummaryCounters {
    pub const UNKNOWN: i64 = -1;

    pub fn unknown() -> Self {
        Self {
            thread_count: Self::UNKNOWN,
            file_count: Self::UNKNOWN,
            peer_count: Self::UNKNOWN,
            contact_count: Self::UNKNOWN,
        }
    }
}

impl Default for SummaryCounters {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Latest failure, kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}
