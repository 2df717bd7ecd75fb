//! Messages between host and controller: inputs the host delivers, actions the host executes.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::state::{
    AppState, BlockId, NodeState, PreparedDir, SummaryCounters, ThreadConfig, ThreadId,
};

/// Everything the host can deliver to the controller. Encoding over the C ABI is JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    /// OS app-state observer reported a foreground/background transition.
    AppForegroundChanged(AppState),
    /// SDK event channel reported a node lifecycle change.
    NodeStateChanged(NodeState),
    /// SDK reported an internal failure.
    SdkError { kind: String, message: String },
    /// A previously issued action finished successfully.
    QueryCompleted(Outcome),
    /// A previously issued action was rejected by the SDK.
    QueryFailed { query: ActionKind, message: String },
    /// User asked to start or stop the node.
    ToggleNode,
    /// User asked for a new thread.
    CreateThread,
    /// User asked to pin the demo file.
    AddPin,
}

/// Work the host performs against the SDK on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    FetchVersion,
    FetchPeerId,
    FetchThreads,
    FetchSummary,
    StartNode,
    StopNode,
    CreateThread(ThreadConfig),
    PrepareFile {
        path: PathBuf,
        thread: ThreadId,
    },
    AddFile {
        dir: PreparedDir,
        thread: ThreadId,
        caption: String,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::FetchVersion => ActionKind::Version,
            Action::FetchPeerId => ActionKind::PeerId,
            Action::FetchThreads => ActionKind::Threads,
            Action::FetchSummary => ActionKind::Summary,
            Action::StartNode => ActionKind::StartNode,
            Action::StopNode => ActionKind::StopNode,
            Action::CreateThread(_) => ActionKind::CreateThread,
            Action::PrepareFile { .. } => ActionKind::PrepareFile,
            Action::AddFile { .. } => ActionKind::AddFile,
        }
    }
}

/// Payload-free tag of an [`Action`], used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Version,
    PeerId,
    Threads,
    Summary,
    StartNode,
    StopNode,
    CreateThread,
    PrepareFile,
    AddFile,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Version => "version",
            ActionKind::PeerId => "peer_id",
            ActionKind::Threads => "threads",
            ActionKind::Summary => "summary",
            ActionKind::StartNode => "start_node",
            ActionKind::StopNode => "stop_node",
            ActionKind::CreateThread => "create_thread",
            ActionKind::PrepareFile => "prepare_file",
            ActionKind::AddFile => "add_file",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful action, fed back through [`Input::QueryCompleted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Version(String),
    PeerId(String),
    Threads(Vec<ThreadId>),
    Summary(SummaryCounters),
    /// StartNode/StopNode accepted; the new state arrives as a node event.
    NodeCommandAccepted(ActionKind),
    ThreadCreated(ThreadId),
    /// `dir` is `None` when the SDK could not prepare the file.
    FilePrepared {
        thread: ThreadId,
        dir: Option<PreparedDir>,
    },
    FileAdded(BlockId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_json_shape() {
        let input: Input = serde_json::from_str(r#"{"node_state_changed":"started"}"#).unwrap();
        assert_eq!(input, Input::NodeStateChanged(NodeState::Started));

        let input: Input = serde_json::from_str(r#""toggle_node""#).unwrap();
        assert_eq!(input, Input::ToggleNode);

        let input: Input = serde_json::from_str(
            r#"{"query_failed":{"query":"summary","message":"node offline"}}"#,
        )
        .unwrap();
        assert_eq!(
            input,
            Input::QueryFailed {
                query: ActionKind::Summary,
                message: "node offline".into()
            }
        );
    }

    #[test]
    fn action_kind_matches_variant() {
        let action = Action::PrepareFile {
            path: PathBuf::from("/tmp/demo.png"),
            thread: ThreadId::from("t1"),
        };
        assert_eq!(action.kind(), ActionKind::PrepareFile);
        assert_eq!(Action::FetchSummary.kind().to_string(), "summary");
    }
}
