//! Upload intake
//!
//! Incoming files are parked in a transient directory and removed exactly
//! once, as soon as the operation that accepted them no longer needs them.
//! Release is tied to scope: dropping a [`TempUpload`] deletes its backing
//! file on every exit path, success or failure.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::store::{unique_stamp, ArtifactStore};

/// Writes uploaded bodies into the transient upload directory.
#[derive(Clone)]
pub struct UploadIntake {
    upload_dir: PathBuf,
}

impl UploadIntake {
    /// Create an intake over `upload_dir`, creating the directory if needed.
    pub fn new(upload_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let upload_dir = upload_dir.into();
        std::fs::create_dir_all(&upload_dir)?;
        Ok(Self { upload_dir })
    }

    /// Park one uploaded body on disk under a unique stamp-based name,
    /// keeping the original extension.
    pub fn save(&self, bytes: &[u8], original_name: Option<&str>) -> std::io::Result<TempUpload> {
        let stamp = unique_stamp();
        let file_name = match original_name.and_then(extension_of) {
            Some(ext) => format!("{}.{}", stamp, ext),
            None => stamp.to_string(),
        };
        let path = self.upload_dir.join(file_name);
        std::fs::write(&path, bytes)?;

        let upload = TempUpload { path };
        debug!(path = %upload.path().display(), "upload parked");
        Ok(upload)
    }
}

fn extension_of(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|ext| ext.to_str())
}

/// Scoped handle to one uploaded file; dropping it removes the file.
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = ArtifactStore::delete_if_present(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove upload");
        }
    }
}
