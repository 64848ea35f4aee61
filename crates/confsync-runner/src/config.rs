use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use confsync_core::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Agent configuration, loaded from `confsync.toml`. Every component gets its
/// knobs from here instead of ambient globals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub node: NodeConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Installation asset code. When absent the identity is derived from a
    /// non-loopback interface address.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Download and extraction cache.
    pub local_tarballs: String,
    /// Server-side path segment under the base URL, no leading slash.
    #[serde(default = "default_remote_tarballs")]
    pub remote_tarballs: String,
    /// The symlink the convergence engine reads through.
    pub active_pointer: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "salt-call".to_string(),
            args: vec![
                "--local".to_string(),
                "state.highstate".to_string(),
                "--retcode-passthrough".to_string(),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_remote_tarballs() -> String {
    "tarballs".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

impl Config {
    pub fn default_path() -> PathBuf {
        PathBuf::from("/etc/confsync/confsync.toml")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: Config =
            toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn local_tarballs(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.paths.local_tarballs).to_string())
    }

    pub fn active_pointer(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.paths.active_pointer).to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.transport.max_attempts,
            Duration::from_secs(self.transport.retry_delay_secs),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.transport.timeout_secs)
    }
}
