//! Owns the controller on one task: feeds it events and completions, runs its actions on the SDK.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use pinpod_core::{Action, Controller, Input, Snapshot};

use crate::commands::Command;
use crate::sdk::{self, Sdk, SdkEvent};
use crate::status;

pub struct Driver<S: Sdk> {
    controller: Controller,
    sdk: Arc<S>,
    done_tx: UnboundedSender<Input>,
    done_rx: UnboundedReceiver<Input>,
    in_flight: usize,
}

impl<S: Sdk> Driver<S> {
    pub fn new(controller: Controller, sdk: Arc<S>) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            sdk,
            done_tx,
            done_rx,
            in_flight: 0,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.controller.snapshot()
    }

    /// Number of spawned SDK calls whose completion has not been handled yet.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Deliver one input and spawn the resulting actions. Each action runs on its own task;
    /// its completion comes back through the done channel, so mutation stays on this task.
    pub fn handle(&mut self, input: Input) {
        for action in self.controller.handle(input) {
            self.dispatch(action);
        }
    }

    fn dispatch(&mut self, action: Action) {
        tracing::debug!(?action, in_flight = self.in_flight, "dispatch");
        self.in_flight += 1;
        let sdk = self.sdk.clone();
        let tx = self.done_tx.clone();
        tokio::spawn(async move {
            let input = sdk::execute(&*sdk, action).await;
            let _ = tx.send(input);
        });
    }

    fn complete(&mut self, input: Input) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.handle(input);
    }

    /// Process pending events and completions until no SDK call is outstanding.
    #[cfg(test)]
    pub async fn settle(&mut self, events: &mut UnboundedReceiver<SdkEvent>) {
        loop {
            while let Ok(ev) = events.try_recv() {
                self.handle(ev.into());
            }
            if self.in_flight == 0 {
                break;
            }
            match self.done_rx.recv().await {
                Some(input) => self.complete(input),
                None => break,
            }
        }
    }

    /// Main loop. Returns the final snapshot on `quit` or when `shutdown` resolves.
    pub async fn run(
        mut self,
        mut events: UnboundedReceiver<SdkEvent>,
        mut commands: UnboundedReceiver<Command>,
        shutdown: impl Future<Output = ()>,
    ) -> Snapshot {
        tokio::pin!(shutdown);
        let mut commands_open = true;
        let mut events_open = true;
        loop {
            tokio::select! {
                Some(input) = self.done_rx.recv() => self.complete(input),
                ev = events.recv(), if events_open => match ev {
                    Some(ev) => self.handle(ev.into()),
                    None => events_open = false,
                },
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(Command::Quit) => break,
                    Some(Command::Status) => println!("{}", status::render(&self.snapshot())),
                    Some(Command::StatusJson) => match serde_json::to_string_pretty(&self.snapshot()) {
                        Ok(s) => println!("{s}"),
                        Err(e) => tracing::warn!(error = %e, "cannot encode snapshot"),
                    },
                    Some(cmd) => {
                        if let Some(input) = cmd.as_input() {
                            self.handle(input);
                        }
                    }
                    None => {
                        tracing::debug!("command input closed");
                        commands_open = false;
                    }
                },
                _ = &mut shutdown => break,
            }
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_sdk::LocalSdk;
    use crate::sdk::NodeSetup;
    use pinpod_core::{ActionKind, AppState, ControllerConfig, NodeState};
    use std::path::PathBuf;

    struct Harness {
        driver: Driver<LocalSdk>,
        sdk: Arc<LocalSdk>,
        events: UnboundedReceiver<SdkEvent>,
        _dir: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let demo = dir.path().join("demo.png");
        std::fs::write(&demo, b"\x89PNG demo").unwrap();
        let (tx, events) = mpsc::unbounded_channel();
        let sdk = Arc::new(LocalSdk::new(tx));
        let controller = Controller::new(ControllerConfig {
            demo_file_path: demo,
            thread_key_prefix: "test".into(),
        });
        let driver = Driver::new(controller, sdk.clone());
        sdk.setup(NodeSetup {
            release_type: "beta".into(),
            cafe_gateway_url: "https://gateway.textile.cafe".into(),
            cafe_override: None,
            repo_path: PathBuf::from("/tmp/repo"),
        })
        .await
        .unwrap();
        Harness {
            driver,
            sdk,
            events,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn start_create_pin_stop() {
        let mut h = harness().await;
        h.driver.settle(&mut h.events).await;
        assert_eq!(h.driver.snapshot().node_state, NodeState::Stopped);

        h.driver.handle(Input::ToggleNode);
        h.driver.settle(&mut h.events).await;
        let snap = h.driver.snapshot();
        assert_eq!(snap.node_state, NodeState::Started);
        assert_eq!(snap.api_version, env!("CARGO_PKG_VERSION"));
        assert!(snap.peer_id.starts_with("12D3KooW"));
        assert_eq!(snap.summary.thread_count, 0);
        assert_eq!(snap.summary.file_count, 0);

        h.driver.handle(Input::CreateThread);
        h.driver.settle(&mut h.events).await;
        let snap = h.driver.snapshot();
        assert_eq!(snap.threads.len(), 1);
        assert_eq!(snap.summary.thread_count, 1);

        h.driver.handle(Input::AddPin);
        h.driver.settle(&mut h.events).await;
        let snap = h.driver.snapshot();
        assert!(snap.recent_pin.is_some());
        // Pins do not change thread cardinality, so counters stay as last fetched.
        assert_eq!(snap.summary.file_count, 0);
        assert!(snap.last_error.is_none());

        h.driver.handle(Input::ToggleNode);
        h.driver.settle(&mut h.events).await;
        assert_eq!(h.driver.snapshot().node_state, NodeState::Stopped);
        assert!(!h.sdk.is_running().await);
        assert_eq!(h.driver.in_flight(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_summary() {
        let mut h = harness().await;
        h.driver.settle(&mut h.events).await;
        h.driver.handle(Input::ToggleNode);
        h.driver.settle(&mut h.events).await;
        assert_eq!(h.driver.snapshot().node_state, NodeState::Started);
        assert_eq!(h.driver.snapshot().summary.thread_count, 0);

        h.sdk.fail_next(ActionKind::Summary).await;
        h.driver.handle(Input::CreateThread);
        h.driver.settle(&mut h.events).await;
        let snap = h.driver.snapshot();
        assert_eq!(snap.threads.len(), 1);
        assert_eq!(snap.summary.thread_count, 0);
        let err = snap.last_error.expect("error recorded");
        assert_eq!(err.kind, "query");
        assert!(err.message.starts_with("summary:"));
    }

    #[tokio::test]
    async fn pin_without_thread_makes_no_sdk_call() {
        let mut h = harness().await;
        h.driver.settle(&mut h.events).await;
        h.driver.handle(Input::ToggleNode);
        h.driver.settle(&mut h.events).await;
        assert_eq!(h.driver.snapshot().node_state, NodeState::Started);
        h.driver.handle(Input::AddPin);
        assert_eq!(h.driver.in_flight(), 0);
    }

    #[tokio::test]
    async fn app_events_arrive_on_the_event_channel() {
        let (app_tx, mut events) = mpsc::unbounded_channel();
        let mut driver = Driver::new(Controller::default(), Arc::new(LocalSdk::new(app_tx.clone())));
        app_tx.send(SdkEvent::AppNextState(AppState::Background)).unwrap();
        driver.settle(&mut events).await;
        assert_eq!(driver.in_flight(), 0);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        cmd_tx.send(Command::Quit).unwrap();
        let snap = driver.run(events, cmd_rx, std::future::pending()).await;
        assert_eq!(snap.current_app_state, AppState::Background);
        assert_eq!(snap.previous_app_state, AppState::Active);
    }

    #[tokio::test]
    async fn run_exits_on_shutdown() {
        let h = harness().await;
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let snap = h.driver.run(h.events, cmd_rx, async {}).await;
        assert_eq!(snap.threads.len(), 0);
    }
}
