// src/storage/blob.rs

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, sync::RwLock};
use url::Url;

use crate::{error::StoreError, storage::bounded};

/// Whole-object storage addressed by relative paths such as
/// `Laborberichte/Pruefbericht_123.pdf`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Public URL of the blob, or `None` if it does not exist.
    async fn url_of(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Creates or replaces the blob and returns its public URL.
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError>;
}

fn public_url(base: &Url, path: &str) -> Result<String, StoreError> {
    base.join(path)
        .map(String::from)
        .map_err(|e| StoreError::Corrupt(format!("cannot build URL for '{}': {}", path, e)))
}

/// Blobs as files below a root directory, served under `base_url`.
///
/// Uploads are staged in a sibling directory (`<root>.tmp`) so the served
/// tree only ever contains complete files.
pub struct LocalBlobStore {
    root: PathBuf,
    staging: PathBuf,
    base_url: Url,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Corrupt(format!("invalid base URL '{}': {}", base_url, e)))?;
        let root = root.into();
        let mut staging = root.clone().into_os_string();
        staging.push(".tmp");
        Ok(Self {
            root,
            staging: PathBuf::from(staging),
            base_url,
        })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || path.is_empty() {
            return Err(StoreError::Corrupt(format!("invalid blob path '{}'", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.resolve(path)?).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn url_of(&self, path: &str) -> Result<Option<String>, StoreError> {
        if tokio::fs::try_exists(self.resolve(path)?).await? {
            Ok(Some(public_url(&self.base_url, path)?))
        } else {
            Ok(None)
        }
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::create_dir_all(&self.staging).await?;

        // One temp file per writer; concurrent puts each rename a complete file.
        let tmp = self.staging.join(format!("{:016x}.part", rand::random::<u64>()));
        if let Err(e) = write_new(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        public_url(&self.base_url, path)
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// In-process blob store for tests and the memory backend.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    base_url: Url,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            base_url: Url::parse("memory://blobs/").expect("static URL is valid"),
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blobs.read().await.get(path).cloned())
    }

    async fn url_of(&self, path: &str) -> Result<Option<String>, StoreError> {
        if self.blobs.read().await.contains_key(path) {
            Ok(Some(public_url(&self.base_url, path)?))
        } else {
            Ok(None)
        }
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        self.blobs.write().await.insert(path.to_string(), bytes);
        public_url(&self.base_url, path)
    }
}

/// Wraps a `BlobStore` with a per-call deadline.
pub struct TimedBlobStore {
    inner: Arc<dyn BlobStore>,
    limit: Duration,
}

impl TimedBlobStore {
    pub fn new(inner: Arc<dyn BlobStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl BlobStore for TimedBlobStore {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        bounded(self.limit, self.inner.get(path)).await
    }

    async fn url_of(&self, path: &str) -> Result<Option<String>, StoreError> {
        bounded(self.limit, self.inner.url_of(path)).await
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        bounded(self.limit, self.inner.put(path, bytes)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("virtual-lab-blobs-{}", rand::random::<u64>()))
    }

    #[tokio::test]
    async fn local_store_round_trips_and_builds_urls() {
        let root = scratch_dir();
        let store = LocalBlobStore::new(&root, "http://localhost:5000/files/").unwrap();

        assert_eq!(store.url_of("Laborberichte/a.pdf").await.unwrap(), None);
        assert_eq!(store.get("Laborberichte/a.pdf").await.unwrap(), None);

        let url = store.put("Laborberichte/a.pdf", b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(url, "http://localhost:5000/files/Laborberichte/a.pdf");
        assert_eq!(store.url_of("Laborberichte/a.pdf").await.unwrap(), Some(url));
        assert_eq!(
            store.get("Laborberichte/a.pdf").await.unwrap(),
            Some(b"%PDF-1.4".to_vec())
        );

        tokio::fs::remove_dir_all(&root).await.unwrap();
        tokio::fs::remove_dir_all(&store.staging).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_uploads_all_get_one_complete_report() {
        use crate::services::archive::{report_path, upload_report};

        for _ in 0..10 {
            let root = scratch_dir();
            let store = Arc::new(LocalBlobStore::new(&root, "http://localhost:5000/files/").unwrap());
            let payloads: Vec<Vec<u8>> = (1..=8).map(|i| vec![b'a' + i as u8; i * 4096]).collect();

            let handles: Vec<_> = payloads
                .iter()
                .cloned()
                .map(|bytes| {
                    let store = store.clone();
                    tokio::spawn(async move { upload_report(store.as_ref(), "u1", bytes).await })
                })
                .collect();

            let mut urls = Vec::new();
            for handle in handles {
                let report = handle.await.unwrap().expect("every upload succeeds");
                urls.push(report.url);
            }
            urls.dedup();
            assert_eq!(urls, vec!["http://localhost:5000/files/Laborberichte/Pruefbericht_u1.pdf"]);

            let stored = store.get(&report_path("u1")).await.unwrap().unwrap();
            assert!(payloads.contains(&stored));

            tokio::fs::remove_dir_all(&root).await.unwrap();
            let _ = tokio::fs::remove_dir_all(&store.staging).await;
        }
    }

    #[tokio::test]
    async fn staged_files_stay_outside_the_served_root() {
        let root = scratch_dir();
        let store = LocalBlobStore::new(&root, "http://localhost/files/").unwrap();
        store.put("Laborberichte/a.pdf", b"%PDF".to_vec()).await.unwrap();

        assert!(!store.staging.starts_with(&root));
        let mut dirs = vec![root.clone()];
        while let Some(dir) = dirs.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
            while let Some(entry) = entries.next_entry().await.unwrap() {
                let path = entry.path();
                assert_ne!(path.extension().and_then(|e| e.to_str()), Some("part"));
                if entry.file_type().await.unwrap().is_dir() {
                    dirs.push(path);
                }
            }
        }

        tokio::fs::remove_dir_all(&root).await.unwrap();
        tokio::fs::remove_dir_all(&store.staging).await.unwrap();
    }

    #[tokio::test]
    async fn local_store_rejects_escaping_paths() {
        let store = LocalBlobStore::new(scratch_dir(), "http://localhost/files/").unwrap();
        assert!(store.put("../outside.csv", Vec::new()).await.is_err());
        assert!(store.get("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn memory_store_replaces_content() {
        let store = MemoryBlobStore::new();
        store.put("x.csv", b"one".to_vec()).await.unwrap();
        let url = store.put("x.csv", b"two".to_vec()).await.unwrap();

        assert_eq!(url, "memory://blobs/x.csv");
        assert_eq!(store.get("x.csv").await.unwrap(), Some(b"two".to_vec()));
    }
}
