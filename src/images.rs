//! Persistence for generated images

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::Result;

/// Writes images as `image_<n>.png` into one directory
///
/// Numbering continues after the highest existing `image_<n>.png`, so
/// earlier images are never overwritten across runs.
pub struct ImageStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save one encoded image and return its path
    pub async fn save(&self, bytes: &[u8]) -> Result<PathBuf> {
        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        let next = self.highest_index().await?.checked_add(1).ok_or_else(|| {
            std::io::Error::other(format!(
                "no free image number left in {}",
                self.dir.display()
            ))
        })?;
        let path = self.dir.join(format!("image_{}.png", next));
        tokio::fs::write(&path, bytes).await?;

        debug!("Saved image to {}", path.display());
        Ok(path)
    }

    async fn highest_index(&self) -> Result<u32> {
        let mut highest = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let index = name
                .to_str()
                .and_then(|n| n.strip_prefix("image_"))
                .and_then(|n| n.strip_suffix(".png"))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(i) = index {
                highest = highest.max(i);
            }
        }
        Ok(highest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_numbers_sequentially() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().join("out"));

        let first = store.save(b"one").await.unwrap();
        let second = store.save(b"two").await.unwrap();

        assert!(first.ends_with("image_1.png"));
        assert!(second.ends_with("image_2.png"));
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_continues_after_existing_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("image_7.png"), b"old").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let store = ImageStore::new(dir.path());
        let path = store.save(b"new").await.unwrap();
        assert!(path.ends_with("image_8.png"));
        assert_eq!(std::fs::read(dir.path().join("image_7.png")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_exhausted_numbering_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(format!("image_{}.png", u32::MAX)), b"last").unwrap();

        let store = ImageStore::new(dir.path());
        let err = store.save(b"new").await.unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
        assert!(!dir.path().join("image_0.png").exists());
    }
}
