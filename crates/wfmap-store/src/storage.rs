//! Data directory access with atomic whole-file writes.
//!
//! Every wfmap file (snapshots, mapping store, review queue, export) lives
//! in one data directory and is replaced in full on each save. Writes go to
//! a sibling temp file which is then renamed over the target, so a crash
//! never leaves a half-written store behind.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use wfmap_core::Result;

/// Filesystem backend rooted at the data directory.
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Absolute-or-relative path of a file inside the data directory.
    pub fn full_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Replace `name` with `data` atomically (temp file + rename).
    pub async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(name);
        debug!(
            subsystem = "store",
            component = "storage",
            op = "write",
            path = %full_path.display(),
            size = data.len(),
            "Writing file"
        );

        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    warn!(parent = %parent.display(), error = %e, "storage: create_dir_all failed");
                    e
                })?;
            }
        }

        let temp_path = self.full_path(&format!("{}.tmp", name));
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "storage: File::create failed");
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "storage: rename failed");
            e
        })?;

        Ok(())
    }

    /// Read `name`, or `None` if it does not exist.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.full_path(name)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(name)).await?)
    }

    /// Serialize `value` as pretty JSON (trailing newline) and write it.
    pub async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(value)?;
        data.push(b'\n');
        self.write(name, &data).await
    }

    /// Read and decode a JSON file, or `None` if it does not exist.
    pub async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.read(name).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }
}
