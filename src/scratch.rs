//! Request-scoped files in scratch directories.
//!
//! A [`ScratchFile`] owns its path and removes the file when dropped, so
//! uploads and rendered reports are cleaned up on every exit path of a
//! handler, including early returns through `?`.

use crate::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Creates `dir/name` with `contents`, creating `dir` when absent.
    ///
    /// Fails if the file already exists; a scratch file never replaces
    /// another request's file.
    pub async fn create(dir: &Path, name: &str, contents: &[u8]) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        // From here on the guard owns the file, so a failed write still cleans up
        let scratch = Self { path };
        file.write_all(contents).await?;
        file.flush().await?;

        debug!(
            "Created scratch file {} ({} bytes)",
            scratch.path.display(),
            contents.len()
        );
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
