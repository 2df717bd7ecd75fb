//! Capability set the host needs from the node SDK, and the events it emits.

use std::future::Future;
use std::path::PathBuf;

use pinpod_core::{
    Action, ActionKind, AppState, BlockId, Input, NodeState, Outcome, PreparedDir,
    SummaryCounters, ThreadConfig, ThreadId,
};

/// One-time node configuration passed to [`Sdk::setup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSetup {
    pub release_type: String,
    pub cafe_gateway_url: String,
    pub cafe_override: Option<String>,
    pub repo_path: PathBuf,
}

/// Event pushed by the SDK (or the OS app-state observer) to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkEvent {
    AppNextState(AppState),
    NodeState(NodeState),
    Error { kind: String, message: String },
}

impl From<SdkEvent> for Input {
    fn from(ev: SdkEvent) -> Self {
        match ev {
            SdkEvent::AppNextState(s) => Input::AppForegroundChanged(s),
            SdkEvent::NodeState(s) => Input::NodeStateChanged(s),
            SdkEvent::Error { kind, message } => Input::SdkError { kind, message },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("node is not set up")]
    NotSetUp,
    #[error("node is not running")]
    NodeNotRunning,
    #[error("unknown thread {0}")]
    UnknownThread(ThreadId),
    #[error("unknown prepared directory {0}")]
    UnknownDirectory(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Node SDK. Every call is asynchronous and may fail; the host never retries.
pub trait Sdk: Send + Sync + 'static {
    fn setup(&self, setup: NodeSetup) -> impl Future<Output = Result<(), SdkError>> + Send;
    fn version(&self) -> impl Future<Output = Result<String, SdkError>> + Send;
    fn peer_id(&self) -> impl Future<Output = Result<String, SdkError>> + Send;
    fn list_threads(&self) -> impl Future<Output = Result<Vec<ThreadId>, SdkError>> + Send;
    fn summary(&self) -> impl Future<Output = Result<SummaryCounters, SdkError>> + Send;
    fn create_thread(
        &self,
        config: ThreadConfig,
    ) -> impl Future<Output = Result<ThreadId, SdkError>> + Send;
    /// `Ok(None)` when the file cannot be prepared (e.g. it does not exist yet).
    fn prepare_file(
        &self,
        path: PathBuf,
        thread: ThreadId,
    ) -> impl Future<Output = Result<Option<PreparedDir>, SdkError>> + Send;
    fn add_file(
        &self,
        dir: PreparedDir,
        thread: ThreadId,
        caption: String,
    ) -> impl Future<Output = Result<BlockId, SdkError>> + Send;
    fn start_node(&self) -> impl Future<Output = Result<(), SdkError>> + Send;
    fn stop_node(&self) -> impl Future<Output = Result<(), SdkError>> + Send;
}

/// Run one controller action against the SDK and turn the result into the input that reports it.
pub async fn execute<S: Sdk>(sdk: &S, action: Action) -> Input {
    let query = action.kind();
    let result = match action {
        Action::FetchVersion => sdk.version().await.map(Outcome::Version),
        Action::FetchPeerId => sdk.peer_id().await.map(Outcome::PeerId),
        Action::FetchThreads => sdk.list_threads().await.map(Outcome::Threads),
        Action::FetchSummary => sdk.summary().await.map(Outcome::Summary),
        Action::StartNode => sdk
            .start_node()
            .await
            .map(|()| Outcome::NodeCommandAccepted(ActionKind::StartNode)),
        Action::StopNode => sdk
            .stop_node()
            .await
            .map(|()| Outcome::NodeCommandAccepted(ActionKind::StopNode)),
        Action::CreateThread(config) => sdk.create_thread(config).await.map(Outcome::ThreadCreated),
        Action::PrepareFile { path, thread } => sdk
            .prepare_file(path, thread.clone())
            .await
            .map(|dir| Outcome::FilePrepared { thread, dir }),
        Action::AddFile {
            dir,
            thread,
            caption,
        } => sdk.add_file(dir, thread, caption).await.map(Outcome::FileAdded),
    };
    match result {
        Ok(outcome) => Input::QueryCompleted(outcome),
        Err(e) => Input::QueryFailed {
            query,
            message: e.to_string(),
        },
    }
}
