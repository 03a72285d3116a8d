//! Artifact lifecycle
//!
//! Generated files land in one output directory under collision-resistant
//! names and are deleted by a detached timer once the retention window
//! passes. Several split outputs can additionally be packaged into a zip
//! archive, itself an artifact under the same expiry rule.

use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// A persisted, time-limited output file. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// What an artifact holds; decides the name tag and extension.
#[derive(Debug, Clone)]
pub enum ArtifactKind {
    Merged,
    Split { label: String },
    Bundle,
}

impl ArtifactKind {
    fn file_name(&self, stamp: i64) -> String {
        match self {
            ArtifactKind::Merged => format!("merged_{}.pdf", stamp),
            ArtifactKind::Split { label } => format!("split_{}_{}.pdf", label, stamp),
            ArtifactKind::Bundle => format!("split_results_{}.zip", stamp),
        }
    }
}

/// Strictly increasing millisecond stamp. Keeps generated names unique even
/// when successive calls land in the same wall-clock millisecond.
pub(crate) fn unique_stamp() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = Utc::now().timestamp_millis();
    let mut prev = LAST.load(Ordering::Relaxed);
    loop {
        let next = (prev + 1).max(now);
        match LAST.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Manages the output directory: naming, persistence, scheduled expiry.
#[derive(Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    retention: Duration,
}

impl ArtifactStore {
    /// Create a store over `output_dir`, creating the directory if needed.
    pub fn new(output_dir: impl Into<PathBuf>, retention: Duration) -> std::io::Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            retention,
        })
    }

    /// Write `bytes` to a fresh uniquely-named file and schedule its
    /// deletion after the retention window.
    pub fn persist(&self, bytes: &[u8], kind: &ArtifactKind) -> std::io::Result<Artifact> {
        let file_name = kind.file_name(unique_stamp());
        let path = self.output_dir.join(&file_name);
        std::fs::write(&path, bytes)?;

        let created_at = Utc::now();
        let artifact = Artifact {
            expires_at: created_at + self.retention,
            file_name,
            path,
            created_at,
        };

        self.schedule_expiry(artifact.path.clone());
        debug!(
            file = %artifact.file_name,
            created = %artifact.created_at,
            expires = %artifact.expires_at,
            "artifact persisted"
        );

        Ok(artifact)
    }

    /// Package the given artifacts' files into one zip archive artifact.
    ///
    /// Members are read back from disk and stored under their artifact file
    /// names. The archive gets its own expiry timer; the members keep
    /// theirs and stay on disk alongside it.
    pub fn bundle(&self, artifacts: &[Artifact]) -> std::io::Result<Artifact> {
        let mut zip_buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_buffer));
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);

            for artifact in artifacts {
                let bytes = std::fs::read(&artifact.path)?;
                zip.start_file(artifact.file_name.clone(), options)
                    .map_err(zip_to_io_error)?;
                zip.write_all(&bytes)?;
            }
            zip.finish().map_err(zip_to_io_error)?;
        }

        self.persist(&zip_buffer, &ArtifactKind::Bundle)
    }

    /// Resolve an artifact name to its live path. `None` when the artifact
    /// expired, was never created, or the name is not a plain file name.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        // Only bare file names resolve; anything path-like never touches
        // the filesystem
        let candidate = Path::new(name);
        let mut components = candidate.components();
        if !matches!(components.next(), Some(Component::Normal(_))) || components.next().is_some() {
            return None;
        }

        let path = self.output_dir.join(name);
        path.is_file().then_some(path)
    }

    /// Idempotent removal; absence is not an error.
    pub fn delete_if_present(path: &Path) -> std::io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Fire-and-forget deletion once the retention window passes. Runs
    /// detached from any request lifetime.
    fn schedule_expiry(&self, path: PathBuf) {
        let retention = self.retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            if let Err(e) = Self::delete_if_present(&path) {
                warn!(path = %path.display(), error = %e, "failed to delete expired artifact");
            }
        });
    }
}

fn zip_to_io_error(e: zip::result::ZipError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn store_in(dir: &TempDir, retention: Duration) -> ArtifactStore {
        ArtifactStore::new(dir.path(), retention).unwrap()
    }

    #[test]
    fn test_unique_stamp_strictly_increases() {
        let stamps: Vec<i64> = (0..100).map(|_| unique_stamp()).collect();
        for pair in stamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[tokio::test]
    async fn test_persist_resolve_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, HOUR);

        let artifact = store.persist(b"%PDF-fake", &ArtifactKind::Merged).unwrap();
        assert!(artifact.file_name.starts_with("merged_"));
        assert!(artifact.file_name.ends_with(".pdf"));
        assert!(artifact.expires_at > artifact.created_at);

        let path = store.resolve(&artifact.file_name).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-fake");
    }

    #[tokio::test]
    async fn test_split_artifact_name_carries_label() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, HOUR);

        let kind = ArtifactKind::Split {
            label: "2-5".to_string(),
        };
        let artifact = store.persist(b"x", &kind).unwrap();
        assert!(artifact.file_name.starts_with("split_2-5_"));
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, HOUR);
        assert!(store.resolve("merged_123.pdf").is_none());
    }

    #[tokio::test]
    async fn test_resolve_rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, HOUR);
        store.persist(b"x", &ArtifactKind::Merged).unwrap();

        assert!(store.resolve("").is_none());
        assert!(store.resolve(".").is_none());
        assert!(store.resolve("..").is_none());
        assert!(store.resolve("../etc/passwd").is_none());
        assert!(store.resolve("a/b.pdf").is_none());
    }

    #[tokio::test]
    async fn test_delete_if_present_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, HOUR);

        let artifact = store.persist(b"x", &ArtifactKind::Merged).unwrap();
        ArtifactStore::delete_if_present(&artifact.path).unwrap();
        // Second firing on the same path is a no-op
        ArtifactStore::delete_if_present(&artifact.path).unwrap();
        assert!(store.resolve(&artifact.file_name).is_none());
    }

    #[tokio::test]
    async fn test_artifact_expires() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, Duration::from_millis(50));

        let artifact = store.persist(b"x", &ArtifactKind::Merged).unwrap();
        assert!(store.resolve(&artifact.file_name).is_some());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.resolve(&artifact.file_name).is_none());
    }

    #[tokio::test]
    async fn test_bundle_contains_members() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, HOUR);

        let a = store
            .persist(
                b"first",
                &ArtifactKind::Split {
                    label: "1-1".to_string(),
                },
            )
            .unwrap();
        let b = store
            .persist(
                b"second",
                &ArtifactKind::Split {
                    label: "3-4".to_string(),
                },
            )
            .unwrap();

        let bundle = store.bundle(&[a.clone(), b.clone()]).unwrap();
        assert!(bundle.file_name.starts_with("split_results_"));
        assert!(bundle.file_name.ends_with(".zip"));

        let bytes = std::fs::read(&bundle.path).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), a.file_name);
        assert_eq!(archive.by_index(1).unwrap().name(), b.file_name);

        // Members stay on disk alongside the archive
        assert!(store.resolve(&a.file_name).is_some());
        assert!(store.resolve(&b.file_name).is_some());
    }

    proptest! {
        /// Property: names with separators or traversal never resolve
        #[test]
        fn path_like_names_never_resolve(
            prefix in "[a-z]{1,8}",
            sep in prop_oneof![Just("/"), Just("/../"), Just("/./")],
            suffix in "[a-z]{1,8}",
        ) {
            let dir = TempDir::new().unwrap();
            let store = ArtifactStore::new(dir.path(), HOUR).unwrap();
            let name = format!("{}{}{}", prefix, sep, suffix);
            prop_assert!(store.resolve(&name).is_none());
        }
    }
}
