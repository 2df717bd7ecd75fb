//! Host-driven API: Controller receives events from host, returns actions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::event::{Action, ActionKind, Input, Outcome};
use crate::state::{
    AppState, BlockId, ErrorReport, NodeState, SummaryCounters, ThreadConfig, ThreadId,
};

/// Default prefix for generated thread keys.
pub const DEFAULT_THREAD_KEY_PREFIX: &str = "textile-ipfs-demo";

/// Error kind recorded when an issued action fails.
pub const QUERY_FAILURE_KIND: &str = "query";

/// Host-supplied settings for the user triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// File pinned by `add_pin`.
    #[serde(default = "default_demo_file_path")]
    pub demo_file_path: PathBuf,
    #[serde(default = "default_thread_key_prefix")]
    pub thread_key_prefix: String,
}

fn default_demo_file_path() -> PathBuf {
    PathBuf::from("demo.png")
}
fn default_thread_key_prefix() -> String {
    DEFAULT_THREAD_KEY_PREFIX.to_string()
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            demo_file_path: default_demo_file_path(),
            thread_key_prefix: default_thread_key_prefix(),
        }
    }
}

/// Read-only copy of the state register for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub node_state: NodeState,
    pub current_app_state: AppState,
    pub previous_app_state: AppState,
    pub threads: Vec<ThreadId>,
    pub summary: SummaryCounters,
    pub api_version: String,
    pub peer_id: String,
    pub recent_pin: Option<BlockId>,
    pub last_error: Option<ErrorReport>,
    pub can_create_thread: bool,
    pub can_pin: bool,
}

/// Lifecycle reconciliation controller. Host passes events; controller returns actions.
///
/// The register is only mutated through these methods. Node state is taken from
/// node events as-is and never changed by the controller's own actions.
pub struct Controller {
    config: ControllerConfig,
    node_state: NodeState,
    current_app_state: AppState,
    previous_app_state: AppState,
    threads: Vec<ThreadId>,
    summary: SummaryCounters,
    api_version: String,
    peer_id: String,
    recent_pin: Option<BlockId>,
    last_error: Option<ErrorReport>,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            node_state: NodeState::Nonexistent,
            current_app_state: AppState::Active,
            previous_app_state: AppState::Unknown,
            threads: Vec::new(),
            summary: SummaryCounters::unknown(),
            api_version: "unknown".to_string(),
            peer_id: "unknown".to_string(),
            recent_pin: None,
            last_error: None,
        }
    }

    pub fn node_state(&self) -> NodeState {
        self.node_state
    }

    pub fn threads(&self) -> &[ThreadId] {
        &self.threads
    }

    pub fn summary(&self) -> SummaryCounters {
        self.summary
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            node_state: self.node_state,
            current_app_state: self.current_app_state,
            previous_app_state: self.previous_app_state,
            threads: self.threads.clone(),
            summary: self.summary,
            api_version: self.api_version.clone(),
            peer_id: self.peer_id.clone(),
            recent_pin: self.recent_pin.clone(),
            last_error: self.last_error.clone(),
            can_create_thread: self.node_state.is_started(),
            can_pin: self.can_pin(),
        }
    }

    /// Single dispatch point for every host input.
    pub fn handle(&mut self, input: Input) -> Vec<Action> {
        match input {
            Input::AppForegroundChanged(next) => {
                self.on_app_state_changed(next);
                Vec::new()
            }
            Input::NodeStateChanged(state) => self.on_node_state_changed(state),
            Input::SdkError { kind, message } => {
                self.on_sdk_error(kind, message);
                Vec::new()
            }
            Input::QueryCompleted(outcome) => self.on_query_completed(outcome),
            Input::QueryFailed { query, message } => {
                self.on_query_failed(query, message);
                Vec::new()
            }
            Input::ToggleNode => self.toggle_node().into_iter().collect(),
            Input::CreateThread => self.create_thread().into_iter().collect(),
            Input::AddPin => self.add_pin().into_iter().collect(),
        }
    }

    /// App moved between foreground/background/inactive. Previous value is kept for one transition.
    pub fn on_app_state_changed(&mut self, next: AppState) {
        info!(previous = %self.current_app_state, next = %next, "app state changed");
        self.previous_app_state = std::mem::replace(&mut self.current_app_state, next);
    }

    /// Node lifecycle changed. Entering `started` from any other state issues the refresh bundle.
    pub fn on_node_state_changed(&mut self, state: NodeState) -> Vec<Action> {
        if state == self.node_state {
            debug!(%state, "node state unchanged");
            return Vec::new();
        }
        let previous = std::mem::replace(&mut self.node_state, state);
        info!(%previous, %state, "node state changed");
        if !state.is_started() {
            return Vec::new();
        }
        vec![
            Action::FetchVersion,
            Action::FetchPeerId,
            Action::FetchThreads,
            Action::FetchSummary,
        ]
    }

    /// SDK-side failure. Recorded for display only.
    pub fn on_sdk_error(&mut self, kind: String, message: String) {
        warn!(%kind, %message, "sdk error");
        self.last_error = Some(ErrorReport { kind, message });
    }

    /// An issued action failed. No slot other than the error slot changes; nothing is retried.
    pub fn on_query_failed(&mut self, query: ActionKind, message: String) {
        warn!(%query, %message, "query failed");
        self.last_error = Some(ErrorReport {
            kind: QUERY_FAILURE_KIND.to_string(),
            message: format!("{query}: {message}"),
        });
    }

    /// An issued action completed. Returns follow-up actions.
    pub fn on_query_completed(&mut self, outcome: Outcome) -> Vec<Action> {
        match outcome {
            Outcome::Version(v) => {
                self.api_version = v;
                Vec::new()
            }
            Outcome::PeerId(id) => {
                self.peer_id = id;
                Vec::new()
            }
            Outcome::Threads(ids) => {
                let before = self.threads.len();
                for id in ids {
                    self.insert_thread(id);
                }
                self.on_thread_count_changed(before)
            }
            Outcome::Summary(summary) => {
                self.summary = summary;
                Vec::new()
            }
            Outcome::NodeCommandAccepted(kind) => {
                debug!(%kind, "node command accepted");
                Vec::new()
            }
            Outcome::ThreadCreated(id) => {
                let before = self.threads.len();
                self.insert_thread(id);
                self.on_thread_count_changed(before)
            }
            Outcome::FilePrepared { thread, dir } => match dir {
                Some(dir) => vec![Action::AddFile {
                    dir,
                    thread,
                    caption: String::new(),
                }],
                None => {
                    warn!(
                        %thread,
                        path = %self.config.demo_file_path.display(),
                        "file not prepared; pin abandoned"
                    );
                    Vec::new()
                }
            },
            Outcome::FileAdded(block) => {
                info!(%block, "file pinned");
                self.recent_pin = Some(block);
                Vec::new()
            }
        }
    }

    /// Start a stopped node or stop a started one. Transitional states are ignored.
    pub fn toggle_node(&mut self) -> Option<Action> {
        match self.node_state {
            NodeState::Stopped => Some(Action::StartNode),
            NodeState::Started => Some(Action::StopNode),
            other => {
                debug!(state = %other, "toggle ignored");
                None
            }
        }
    }

    /// Request a new thread. Only valid while the node is running.
    pub fn create_thread(&mut self) -> Option<Action> {
        if !self.node_state.is_started() {
            debug!(state = %self.node_state, "create thread ignored");
            return None;
        }
        let key = format!(
            "{}-{}",
            self.config.thread_key_prefix,
            uuid::Uuid::new_v4()
        );
        Some(Action::CreateThread(ThreadConfig {
            key,
            name: format!("Thread #{}", self.threads.len()),
            shared: true,
        }))
    }

    /// Pin the demo file into the first known thread. No-op without a running node and a thread.
    pub fn add_pin(&mut self) -> Option<Action> {
        if !self.can_pin() {
            debug!(threads = self.threads.len(), "pin ignored");
            return None;
        }
        let thread = self.threads.first()?.clone();
        Some(Action::PrepareFile {
            path: self.config.demo_file_path.clone(),
            thread,
        })
    }

    fn can_pin(&self) -> bool {
        self.node_state.is_started() && !self.threads.is_empty()
    }

    fn insert_thread(&mut self, id: ThreadId) {
        if !self.threads.contains(&id) {
            self.threads.push(id);
        }
    }

    fn on_thread_count_changed(&self, before: usize) -> Vec<Action> {
        let after = self.threads.len();
        if after == before {
            return Vec::new();
        }
        if !self.node_state.is_started() {
            debug!(before, after, "summary refresh suppressed; node not started");
            return Vec::new();
        }
        vec![Action::FetchSummary]
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}
