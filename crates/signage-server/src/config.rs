use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use signage_raster::ConverterConfig;

use crate::error::{ServerError, ServerResult};

/// Distribution service configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Root for the inventory backing, scratch space, and deck archive.
    pub data_dir: PathBuf,
    /// Overrides `<data_dir>/scratch` for conversion scratch directories.
    pub scratch_dir: Option<PathBuf>,
    /// Base addresses of the branch terminals, e.g. `http://10.0.0.12:5002`.
    pub branches: Vec<String>,
    pub notify_timeout_secs: u64,
    pub max_upload_size: usize,
    /// Keep a copy of every successfully rasterized deck under `<data_dir>/decks`.
    pub archive_decks: bool,
    pub converter: ConverterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            data_dir: PathBuf::from("signage-data"),
            scratch_dir: None,
            branches: Vec::new(),
            notify_timeout_secs: 5,
            max_upload_size: 200 * 1024 * 1024,
            archive_decks: false,
            converter: ConverterConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn inventory_dir(&self) -> PathBuf {
        self.data_dir.join("inventory")
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("scratch"))
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("decks")
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    /// Parse the branch registry; only `http` and `https` addresses are accepted.
    pub fn branch_urls(&self) -> ServerResult<Vec<Url>> {
        self.branches
            .iter()
            .map(|raw| {
                let url = Url::parse(raw)
                    .map_err(|e| ServerError::Config(format!("branch address {raw:?}: {e}")))?;
                match url.scheme() {
                    "http" | "https" => Ok(url),
                    other => Err(ServerError::Config(format!(
                        "branch address {raw:?}: unsupported scheme {other}"
                    ))),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_upload_size, 200 * 1024 * 1024);
        assert_eq!(c.notify_timeout(), Duration::from_secs(5));
        assert!(c.branches.is_empty());
        assert!(!c.archive_decks);
        assert_eq!(c.scratch_root(), PathBuf::from("signage-data/scratch"));
        assert_eq!(c.inventory_dir(), PathBuf::from("signage-data/inventory"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c: ServerConfig = toml::from_str(
            r#"
            bind_addr = "127.0.0.1:8080"
            branches = ["http://10.0.0.2:5002", "http://10.0.0.3:5002"]

            [converter]
            dpi = 96
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.branches.len(), 2);
        assert_eq!(c.converter.dpi, 96);
        assert_eq!(c.converter.timeout_secs, 120);
        assert_eq!(c.notify_timeout_secs, 5);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "data_dir = \"/var/lib/signage\"\narchive_decks = true\n").unwrap();
        let c = ServerConfig::load(&path).unwrap();
        assert_eq!(c.archive_dir(), PathBuf::from("/var/lib/signage/decks"));
        assert!(c.archive_decks);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "bind_addr = 12").unwrap();
        assert!(matches!(ServerConfig::load(&path), Err(ServerError::Config(_))));
    }

    #[test]
    fn branch_urls_validated() {
        let mut c = ServerConfig::default();
        c.branches = vec!["http://10.0.0.2:5002".into()];
        assert_eq!(c.branch_urls().unwrap()[0].port(), Some(5002));

        c.branches = vec!["ftp://10.0.0.2".into()];
        assert!(matches!(c.branch_urls(), Err(ServerError::Config(_))));

        c.branches = vec!["not a url".into()];
        assert!(c.branch_urls().is_err());
    }
}
