//! The temporary directory the checker writes into.

use crate::error::TscError;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

/// Owns a temporary directory for the length of a build.
///
/// Acquiring clears whatever a previous run left behind; dropping the guard
/// removes the directory, whether the build succeeded or not.
#[derive(Debug)]
pub struct ScratchDir {
    path: Utf8PathBuf,
}

impl ScratchDir {
    pub fn acquire(path: impl Into<Utf8PathBuf>) -> Result<Self, TscError> {
        let path = path.into();
        if path.exists() {
            debug!(%path, "clearing stale scratch directory");
            std::fs::remove_dir_all(&path).map_err(TscError::io(&path))?;
        }
        std::fs::create_dir_all(&path).map_err(TscError::io(&path))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn join(&self, path: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        self.path.join(path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path, "removed scratch directory"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path, "failed to remove scratch directory: {err}"),
        }
    }
}
