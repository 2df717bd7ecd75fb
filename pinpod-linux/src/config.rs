//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

use pinpod_core::ControllerConfig;

use crate::sdk::NodeSetup;

/// Name of the pinned demo file inside the data directory.
pub const DEMO_FILE_NAME: &str = "demo.png";

/// Host configuration. File: ~/.config/pinpod/config.toml or /etc/pinpod/config.toml.
/// Env overrides: PINPOD_DATA_DIR, PINPOD_DEMO_FILE_URL, PINPOD_RELEASE_TYPE,
/// PINPOD_AUTO_START, PINPOD_LOG_LEVEL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SDK release channel (default "beta").
    #[serde(default = "default_release_type")]
    pub release_type: String,
    #[serde(default = "default_cafe_gateway_url")]
    pub cafe_gateway_url: String,
    #[serde(default)]
    pub cafe_override: Option<String>,
    /// Image downloaded once at start-up and used for pins.
    #[serde(default = "default_demo_file_url")]
    pub demo_file_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_thread_key_prefix")]
    pub thread_key_prefix: String,
    /// Start the node right after setup (default true).
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    /// Log filter used when RUST_LOG is unset (default "info").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_release_type() -> String {
    "beta".to_string()
}
fn default_cafe_gateway_url() -> String {
    "https://gateway.textile.cafe".to_string()
}
fn default_demo_file_url() -> String {
    "https://ipfs.textile.io:5050/ipfs/QmT3jRTd57HrM4K5cCNkSk9uQidjLrZPAnKe8V9oxfX2Bp".to_string()
}
fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(h) => PathBuf::from(h).join(".local/share/pinpod"),
        None => PathBuf::from("/var/lib/pinpod"),
    }
}
fn default_thread_key_prefix() -> String {
    pinpod_core::controller::DEFAULT_THREAD_KEY_PREFIX.to_string()
}
fn default_auto_start() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            release_type: default_release_type(),
            cafe_gateway_url: default_cafe_gateway_url(),
            cafe_override: None,
            demo_file_url: default_demo_file_url(),
            data_dir: default_data_dir(),
            thread_key_prefix: default_thread_key_prefix(),
            auto_start: default_auto_start(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn demo_file_path(&self) -> PathBuf {
        self.data_dir.join(DEMO_FILE_NAME)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            demo_file_path: self.demo_file_path(),
            thread_key_prefix: self.thread_key_prefix.clone(),
        }
    }

    pub fn node_setup(&self) -> NodeSetup {
        NodeSetup {
            release_type: self.release_type.clone(),
            cafe_gateway_url: self.cafe_gateway_url.clone(),
            cafe_override: self.cafe_override.clone(),
            repo_path: self.data_dir.join("repo"),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let c = load_file().unwrap_or_default();
    apply_env(c, |key| std::env::var(key).ok())
}

/// Apply PINPOD_* overrides. Unparseable values are ignored.
pub fn apply_env(mut c: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(s) = var("PINPOD_DATA_DIR") {
        c.data_dir = PathBuf::from(s);
    }
    if let Some(s) = var("PINPOD_DEMO_FILE_URL") {
        c.demo_file_url = s;
    }
    if let Some(s) = var("PINPOD_RELEASE_TYPE") {
        c.release_type = s;
    }
    if let Some(s) = var("PINPOD_AUTO_START") {
        if let Ok(b) = s.parse::<bool>() {
            c.auto_start = b;
        }
    }
    if let Some(s) = var("PINPOD_LOG_LEVEL") {
        c.log_level = s;
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/pinpod/config.toml"));
    }
    out.push(PathBuf::from("/etc/pinpod/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            return parse_file(&p);
        }
    }
    None
}

/// Read and parse one config file. A file that fails to parse is skipped with a warning.
pub fn parse_file(path: &std::path::Path) -> Option<Config> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read config");
            return None;
        }
    };
    match toml::from_str::<Config>(&s) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid config");
            None
        }
    }
}
