use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Branch terminal configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    pub bind_addr: SocketAddr,
    /// Base address of the distribution service.
    pub server_url: String,
    pub cache_dir: PathBuf,
    pub rotation_interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5002)),
            server_url: "http://127.0.0.1:5000".into(),
            cache_dir: PathBuf::from("slides"),
            rotation_interval_secs: 10,
            fetch_timeout_secs: 30,
        }
    }
}

impl BranchConfig {
    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))
    }

    pub fn server_url(&self) -> SyncResult<Url> {
        let url = Url::parse(&self.server_url)
            .map_err(|e| SyncError::Config(format!("server_url {:?}: {e}", self.server_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SyncError::Config(format!("server_url: unsupported scheme {other:?}"))),
        }
    }

    pub fn rotation_interval(&self) -> SyncResult<Duration> {
        if self.rotation_interval_secs == 0 {
            return Err(SyncError::Config("rotation_interval_secs must be at least 1".into()));
        }
        Ok(Duration::from_secs(self.rotation_interval_secs))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
