//! Object store for uploaded files
//!
//! Files are addressed by slash-separated keys such as
//! `gallery/1700000000000-1a2b3c4d.jpg` and served under `/uploads/{key}`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

/// URL prefix under which stored objects are served
pub const PUBLIC_PREFIX: &str = "/uploads";

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Remove the object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Public URL of an object
    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, key)
    }
}

/// Object store backed by a directory on disk
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn boxed(root: impl Into<PathBuf>) -> Arc<dyn ObjectStore> {
        Arc::new(Self::new(root))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Reject keys that could escape the store root
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        bail!("Invalid object key: {}", key);
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        bail!("Invalid object key: {}", key);
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write object {}", key))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete object {}", key)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_exists_delete() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("gallery/one.jpg", b"jpeg").await.unwrap();
        assert!(store.exists("gallery/one.jpg").await.unwrap());
        assert_eq!(std::fs::read(dir.path().join("gallery/one.jpg")).unwrap(), b"jpeg");

        store.delete("gallery/one.jpg").await.unwrap();
        assert!(!store.exists("gallery/one.jpg").await.unwrap());
        store.delete("gallery/one.jpg").await.unwrap();
    }

    #[test]
    fn test_public_url() {
        let store = LocalObjectStore::new("uploads");
        assert_eq!(store.public_url("gallery/a.png"), "/uploads/gallery/a.png");
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        for key in ["../secret", "/etc/passwd", "gallery//a.jpg", "gallery/./a.jpg", ""] {
            assert!(store.put(key, b"x").await.is_err(), "accepted {:?}", key);
        }
    }
}
