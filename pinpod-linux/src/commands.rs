//! Line commands on stdin: user triggers and app-state changes.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;

use pinpod_core::{AppState, Input};

use crate::sdk::SdkEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    CreateThread,
    Pin,
    App(AppState),
    Status,
    StatusJson,
    Quit,
}

impl Command {
    /// Parse one line. Blank lines and unknown words yield `None`.
    pub fn parse(line: &str) -> Option<Command> {
        match line.trim().to_ascii_lowercase().as_str() {
            "toggle" => Some(Command::Toggle),
            "thread" => Some(Command::CreateThread),
            "pin" => Some(Command::Pin),
            "foreground" => Some(Command::App(AppState::Active)),
            "status" => Some(Command::Status),
            "json" => Some(Command::StatusJson),
            "quit" | "exit" => Some(Command::Quit),
            other => match other.parse::<AppState>() {
                Ok(AppState::Unknown) | Err(_) => None,
                Ok(state) => Some(Command::App(state)),
            },
        }
    }

    /// Controller input for the user triggers. App-state changes travel as SDK events instead.
    pub fn as_input(&self) -> Option<Input> {
        match self {
            Command::Toggle => Some(Input::ToggleNode),
            Command::CreateThread => Some(Input::CreateThread),
            Command::Pin => Some(Input::AddPin),
            Command::App(_) | Command::Status | Command::StatusJson | Command::Quit => None,
        }
    }
}

/// Read stdin until EOF, sending each parsed command. App-state changes go out on the
/// SDK event channel, the way the OS observer reports them. Unknown lines are logged and skipped.
pub async fn read_stdin(
    tx: UnboundedSender<Command>,
    app_events: UnboundedSender<SdkEvent>,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Some(Command::App(state)) => {
                let _ = app_events.send(SdkEvent::AppNextState(state));
            }
            Some(cmd) => {
                if tx.send(cmd).is_err() {
                    break;
                }
            }
            None => tracing::warn!(%line, "unknown command"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("toggle"), Some(Command::Toggle));
        assert_eq!(Command::parse("  Thread \n"), Some(Command::CreateThread));
        assert_eq!(Command::parse("pin"), Some(Command::Pin));
        assert_eq!(
            Command::parse("foreground"),
            Some(Command::App(AppState::Active))
        );
        assert_eq!(
            Command::parse("background"),
            Some(Command::App(AppState::Background))
        );
        assert_eq!(
            Command::parse("Inactive"),
            Some(Command::App(AppState::Inactive))
        );
        assert_eq!(Command::parse("unknown"), None);
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(Command::parse("reboot"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn forwards_triggers_only() {
        assert_eq!(Command::Pin.as_input(), Some(Input::AddPin));
        assert_eq!(Command::App(AppState::Inactive).as_input(), None);
        assert_eq!(Command::Status.as_input(), None);
        assert_eq!(Command::Quit.as_input(), None);
    }
}
