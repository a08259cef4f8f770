//! Process-level configuration shared by all subcommands.

use std::path::PathBuf;

use wfmap_core::defaults::{
    CHROMESTATUS_FILE, DATA_DIR, SERVER_HOST, SERVER_PORT, WEB_FEATURES_FILE,
};
use wfmap_store::FilesystemBackend;

/// Where the data files live and where the review server listens.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding snapshots, the mapping store, the review queue
    /// and the export.
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Directory served at `/` and `/static` by the review server.
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_DIR),
            host: SERVER_HOST.to_string(),
            port: SERVER_PORT,
            static_dir: None,
        }
    }
}

impl AppConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `WFMAP_DATA_DIR` | `.` | Data directory |
    /// | `HOST` | `127.0.0.1` | Review server bind address |
    /// | `PORT` | `5001` | Review server port |
    /// | `WFMAP_STATIC_DIR` | unset | Static UI directory |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("WFMAP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            static_dir: std::env::var("WFMAP_STATIC_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn backend(&self) -> FilesystemBackend {
        FilesystemBackend::new(self.data_dir.clone())
    }

    pub fn chromestatus_path(&self) -> PathBuf {
        self.data_dir.join(CHROMESTATUS_FILE)
    }

    pub fn web_features_path(&self) -> PathBuf {
        self.data_dir.join(WEB_FEATURES_FILE)
    }
}
