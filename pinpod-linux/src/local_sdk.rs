//! In-process node standing in for the mobile SDK: threads, pins and counters kept in memory.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

use pinpod_core::{
    ActionKind, BlockId, NodeState, PreparedDir, SummaryCounters, ThreadConfig, ThreadId,
};

use crate::sdk::{NodeSetup, Sdk, SdkError, SdkEvent};

const VERSION: &str = env!("CARGO_PKG_VERSION");

struct NodeInner {
    setup: Option<NodeSetup>,
    running: bool,
    peer_id: String,
    threads: Vec<(ThreadId, ThreadConfig)>,
    /// Prepared directory hash -> file size.
    prepared: HashMap<String, u64>,
    pins: Vec<BlockId>,
    failures: HashSet<ActionKind>,
}

pub struct LocalSdk {
    inner: Mutex<NodeInner>,
    events: UnboundedSender<SdkEvent>,
}

impl LocalSdk {
    pub fn new(events: UnboundedSender<SdkEvent>) -> Self {
        Self {
            inner: Mutex::new(NodeInner {
                setup: None,
                running: false,
                peer_id: format!("12D3KooW{}", uuid::Uuid::new_v4().simple()),
                threads: Vec::new(),
                prepared: HashMap::new(),
                pins: Vec::new(),
                failures: HashSet::new(),
            }),
            events,
        }
    }

    /// Make the next call of `kind` fail with `SdkError::Rejected`.
    #[cfg(test)]
    pub async fn fail_next(&self, kind: ActionKind) {
        self.inner.lock().await.failures.insert(kind);
    }

    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.running
    }

    fn emit(&self, state: NodeState) {
        let _ = self.events.send(SdkEvent::NodeState(state));
    }
}

impl NodeInner {
    fn check(&mut self, kind: ActionKind) -> Result<(), SdkError> {
        if self.failures.remove(&kind) {
            return Err(SdkError::Rejected(format!("{kind} failed")));
        }
        Ok(())
    }

    fn check_running(&mut self, kind: ActionKind) -> Result<(), SdkError> {
        self.check(kind)?;
        if !self.running {
            return Err(SdkError::NodeNotRunning);
        }
        Ok(())
    }
}

impl Sdk for LocalSdk {
    async fn setup(&self, setup: NodeSetup) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().await;
        tracing::info!(
            release = %setup.release_type,
            gateway = %setup.cafe_gateway_url,
            cafe_override = ?setup.cafe_override,
            repo = %setup.repo_path.display(),
            "node setup"
        );
        let first = inner.setup.is_none();
        inner.setup = Some(setup);
        if first {
            self.emit(NodeState::Stopped);
        }
        Ok(())
    }

    async fn version(&self) -> Result<String, SdkError> {
        self.inner.lock().await.check(ActionKind::Version)?;
        Ok(VERSION.to_string())
    }

    async fn peer_id(&self) -> Result<String, SdkError> {
        let mut inner = self.inner.lock().await;
        inner.check(ActionKind::PeerId)?;
        if inner.setup.is_none() {
            return Err(SdkError::NotSetUp);
        }
        Ok(inner.peer_id.clone())
    }

    async fn list_threads(&self) -> Result<Vec<ThreadId>, SdkError> {
        let mut inner = self.inner.lock().await;
        inner.check_running(ActionKind::Threads)?;
        Ok(inner.threads.iter().map(|(id, _)| id.clone()).collect())
    }

    async fn summary(&self) -> Result<SummaryCounters, SdkError> {
        let mut inner = self.inner.lock().await;
        inner.check_running(ActionKind::Summary)?;
        Ok(SummaryCounters {
            thread_count: inner.threads.len() as i64,
            file_count: inner.pins.len() as i64,
            peer_count: 0,
            contact_count: 0,
        })
    }

    async fn create_thread(&self, config: ThreadConfig) -> Result<ThreadId, SdkError> {
        let mut inner = self.inner.lock().await;
        inner.check_running(ActionKind::CreateThread)?;
        let digest = hex::encode(Sha256::digest(config.key.as_bytes()));
        let id = ThreadId(format!("12D3KooW{}", &digest[..40]));
        if !inner.threads.iter().any(|(t, _)| *t == id) {
            inner.threads.push((id.clone(), config));
        }
        Ok(id)
    }

    async fn prepare_file(
        &self,
        path: PathBuf,
        thread: ThreadId,
    ) -> Result<Option<PreparedDir>, SdkError> {
        {
            let mut inner = self.inner.lock().await;
            inner.check_running(ActionKind::PrepareFile)?;
            if !inner.threads.iter().any(|(t, _)| *t == thread) {
                return Err(SdkError::UnknownThread(thread));
            }
        }
        let data = match tokio::fs::read(&path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let hash = format!("Qm{}", hex::encode(Sha256::digest(&data)));
        self.inner
            .lock()
            .await
            .prepared
            .insert(hash.clone(), data.len() as u64);
        Ok(Some(PreparedDir { hash }))
    }

    async fn add_file(
        &self,
        dir: PreparedDir,
        thread: ThreadId,
        caption: String,
    ) -> Result<BlockId, SdkError> {
        let mut inner = self.inner.lock().await;
        inner.check_running(ActionKind::AddFile)?;
        if !inner.threads.iter().any(|(t, _)| *t == thread) {
            return Err(SdkError::UnknownThread(thread));
        }
        if !inner.prepared.contains_key(&dir.hash) {
            return Err(SdkError::UnknownDirectory(dir.hash));
        }
        let mut h = Sha256::new();
        h.update(thread.as_str().as_bytes());
        h.update(dir.hash.as_bytes());
        h.update(caption.as_bytes());
        h.update((inner.pins.len() as u64).to_le_bytes());
        let block = BlockId(hex::encode(h.finalize()));
        inner.pins.push(block.clone());
        Ok(block)
    }

    async fn start_node(&self) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().await;
        inner.check(ActionKind::StartNode)?;
        if inner.setup.is_none() {
            let _ = self.events.send(SdkEvent::Error {
                kind: "NODE_START_ERROR".to_string(),
                message: SdkError::NotSetUp.to_string(),
            });
            return Err(SdkError::NotSetUp);
        }
        if inner.running {
            return Ok(());
        }
        self.emit(NodeState::Starting);
        inner.running = true;
        self.emit(NodeState::Started);
        Ok(())
    }

    async fn stop_node(&self) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().await;
        inner.check(ActionKind::StopNode)?;
        if !inner.running {
            return Ok(());
        }
        self.emit(NodeState::Stopping);
        inner.running = false;
        self.emit(NodeState::Stopped);
        Ok(())
    }
}
