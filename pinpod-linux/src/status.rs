//! Text rendering of a controller snapshot.

use std::fmt::Write;

use pinpod_core::Snapshot;

const PEER_ID_PREFIX_LEN: usize = 12;

pub fn render(s: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "API Version: {}", s.api_version);
    let _ = writeln!(out, "Node State: {}", s.node_state);
    let _ = writeln!(out, "Peer ID: {}...", short(&s.peer_id));
    let _ = writeln!(out, "Pin Count: {}", s.summary.file_count);
    let _ = writeln!(out, "Thread Count: {}", s.summary.thread_count);
    let _ = writeln!(out, "App Status: {}", s.current_app_state);
    let _ = writeln!(out, "Previous App Status: {}", s.previous_app_state);
    let _ = writeln!(
        out,
        "Recent Pin: {}",
        s.recent_pin.as_ref().map(|b| b.as_str()).unwrap_or("none")
    );
    if let Some(e) = &s.last_error {
        let _ = writeln!(out, "Last Error: {} ({})", e.message, e.kind);
    }
    let _ = write!(
        out,
        "[toggle] [thread{}] [pin{}]",
        if s.can_create_thread { "" } else { ": disabled" },
        if s.can_pin { "" } else { ": disabled" }
    );
    out
}

fn short(id: &str) -> &str {
    match id.char_indices().nth(PEER_ID_PREFIX_LEN) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpod_core::{Controller, NodeState, Outcome};

    #[test]
    fn renders_initial_state() {
        let text = render(&Controller::default().snapshot());
        assert!(text.contains("API Version: unknown"));
        assert!(text.contains("Node State: nonexistent"));
        assert!(text.contains("Pin Count: -1"));
        assert!(text.contains("Previous App Status: unknown"));
        assert!(text.contains("Recent Pin: none"));
        assert!(text.contains("[thread: disabled] [pin: disabled]"));
        assert!(!text.contains("Last Error"));
    }

    #[test]
    fn truncates_peer_id() {
        let mut c = Controller::default();
        c.on_node_state_changed(NodeState::Started);
        c.on_query_completed(Outcome::PeerId("12D3KooWabcdefghijklmnop".into()));
        let text = render(&c.snapshot());
        assert!(text.contains("Peer ID: 12D3KooWabcd..."));
        assert!(text.contains("[thread] [pin: disabled]"));
    }
}
