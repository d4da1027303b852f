// Request-scoped scratch directory
//
// Every temporary artifact of one download lives under `<root>/<id>/`.
// The directory goes away when the ScratchSpace is dropped, including on
// error returns and when the owning future is cancelled.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use super::errors::DownloadError;

#[derive(Debug)]
pub struct ScratchSpace {
    id: String,
    dir: PathBuf,
}

impl ScratchSpace {
    /// Create a fresh directory under `root`, named by a random download id.
    pub async fn create(root: &Path) -> Result<Self, DownloadError> {
        let id = Uuid::new_v4().simple().to_string();
        let dir = root.join(&id);

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            DownloadError::Io(format!(
                "Failed to create scratch dir {}: {}",
                dir.display(),
                e
            ))
        })?;

        debug!(download_id = %id, dir = %dir.display(), "scratch space created");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a named artifact inside this scratch space.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(download_id = %self.id, "scratch space removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                download_id = %self.id,
                dir = %self.dir.display(),
                "failed to remove scratch space: {}",
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_drop_removes_everything() {
        let root = tempdir().unwrap();
        let dir;
        {
            let scratch = ScratchSpace::create(root.path()).await.unwrap();
            dir = scratch.dir().to_path_buf();
            std::fs::write(scratch.path_for("video.webm"), b"v").unwrap();
            std::fs::write(scratch.path_for("audio.m4a"), b"a").unwrap();
            assert!(dir.exists());
            assert!(dir.starts_with(root.path()));
        }
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ids_do_not_collide() {
        let root = tempdir().unwrap();
        let a = ScratchSpace::create(root.path()).await.unwrap();
        let b = ScratchSpace::create(root.path()).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.dir(), b.dir());
        assert_eq!(a.id().len(), 32);
    }

    #[tokio::test]
    async fn test_already_removed_dir_is_ignored() {
        let root = tempdir().unwrap();
        let scratch = ScratchSpace::create(root.path()).await.unwrap();
        std::fs::remove_dir_all(scratch.dir()).unwrap();
        drop(scratch);
    }

    #[tokio::test]
    async fn test_creates_missing_root() {
        let root = tempdir().unwrap();
        let nested = root.path().join("youtube-downloader");
        let scratch = ScratchSpace::create(&nested).await.unwrap();
        assert!(scratch.dir().is_dir());
    }
}
