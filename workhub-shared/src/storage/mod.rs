/// Blob storage adapter
///
/// Uploaded files are always staged on local disk first, under the uploads
/// directory, with the key `{unix_millis}-{sanitized original name}`. When a
/// remote [`ObjectStore`] is configured the staged file is pushed to it under
/// the same key; on success the local copy is removed, on failure it is kept
/// and served locally from `{public_base}/files/{key}`.
///
/// # Example
///
/// ```no_run
/// use workhub_shared::storage::BlobStorage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = BlobStorage::local("./uploads");
/// storage.ensure_upload_dir().await?;
///
/// let staged = storage.stage("notes.txt", "text/plain", "hello".into()).await?;
/// let stored = storage.upload(staged, "http://localhost:4005").await;
/// assert_eq!(stored.url, format!("http://localhost:4005/files/{}", stored.key));
/// # Ok(())
/// # }
/// ```

pub mod object_store;

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

pub use object_store::{ObjectStore, S3Config, S3ObjectStore};

/// Errors raised by the storage adapter
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Remote object store rejected or failed the request
    #[error("Object store error: {0}")]
    Remote(String),

    /// Local filesystem failure
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Key would escape the uploads directory
    #[error("Invalid file key: {0}")]
    InvalidKey(String),
}

/// A file written to the uploads directory, not yet published
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub key: String,
    pub path: PathBuf,
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    data: Bytes,
}

/// Result of publishing a staged file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub url: String,
    pub key: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
}

/// Local staging area plus optional remote object store
#[derive(Clone)]
pub struct BlobStorage {
    upload_dir: PathBuf,
    remote: Option<Arc<dyn ObjectStore>>,
}

impl BlobStorage {
    /// Storage that only ever uses the local uploads directory
    pub fn local(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            remote: None,
        }
    }

    /// Storage that publishes to `remote`, falling back to the uploads directory
    pub fn with_remote(upload_dir: impl Into<PathBuf>, remote: Arc<dyn ObjectStore>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            remote: Some(remote),
        }
    }

    /// Creates the uploads directory if it doesn't exist
    pub async fn ensure_upload_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    /// Writes an incoming file to the uploads directory
    ///
    /// If a file with the generated key already exists (same name within the
    /// same millisecond), a counter is inserted after the timestamp.
    pub async fn stage(
        &self,
        original_name: &str,
        mimetype: &str,
        data: Bytes,
    ) -> Result<StagedFile, StorageError> {
        let millis = Utc::now().timestamp_millis();
        let name = sanitize_file_name(original_name);

        let mut attempt = 0u32;
        let (key, path, mut file) = loop {
            let key = if attempt == 0 {
                format!("{millis}-{name}")
            } else {
                format!("{millis}-{attempt}-{name}")
            };
            let path = self.upload_dir.join(&key);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (key, path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        };

        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!(key = %key, size = data.len(), "Staged upload");

        Ok(StagedFile {
            key,
            path,
            original_name: original_name.to_string(),
            mimetype: mimetype.to_string(),
            size: data.len() as u64,
            data,
        })
    }

    /// Publishes a staged file
    ///
    /// Never fails: any remote error degrades to the local copy.
    pub async fn upload(&self, staged: StagedFile, public_base: &str) -> StoredFile {
        let StagedFile {
            key,
            path,
            original_name,
            mimetype,
            size,
            data,
        } = staged;

        let local_url = local_url(public_base, &key);

        let url = match &self.remote {
            None => local_url,
            Some(remote) => match remote.put_object(&key, data, &mimetype).await {
                Ok(url) => {
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        tracing::warn!(key = %key, error = %e, "Failed to remove staged copy");
                    }
                    url
                }
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "Remote upload failed, serving from local storage"
                    );
                    local_url
                }
            },
        };

        StoredFile {
            url,
            key,
            original_name,
            mimetype,
            size,
        }
    }

    /// Removes a staged file that will not be published
    pub async fn discard(&self, staged: &StagedFile) {
        if let Err(e) = tokio::fs::remove_file(&staged.path).await {
            tracing::warn!(key = %staged.key, error = %e, "Failed to discard staged file");
        }
    }

    /// Publishes several staged files, applying the fallback per file
    pub async fn upload_all(&self, staged: Vec<StagedFile>, public_base: &str) -> Vec<StoredFile> {
        let mut stored = Vec::with_capacity(staged.len());
        for file in staged {
            stored.push(self.upload(file, public_base).await);
        }
        stored
    }

    /// Deletes a file
    ///
    /// Removes the remote object when a remote store is configured, and the
    /// local copy whenever one exists. Deleting an unknown key succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.local_path(key)?;

        if let Some(remote) = &self.remote {
            remote.delete_object(key).await?;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Removed local copy");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Time-limited download URL
    ///
    /// Presigned by the remote store when configured, the plain local URL
    /// otherwise.
    pub async fn sign_url(
        &self,
        key: &str,
        expires_in: Duration,
        public_base: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        match &self.remote {
            Some(remote) => remote.presign_get(key, expires_in).await,
            None => Ok(local_url(public_base, key)),
        }
    }

    /// Path of a key inside the uploads directory
    pub fn local_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.upload_dir.join(key))
    }
}

fn local_url(public_base: &str, key: &str) -> String {
    format!("{}/files/{}", public_base.trim_end_matches('/'), key)
}

/// Rejects keys that are empty or could name anything outside the uploads directory
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Reduces a client-supplied file name to a safe single path component
///
/// Directory parts are dropped and every character outside
/// `[A-Za-z0-9._-]` becomes `_`. An empty result becomes `file`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records calls and optionally fails every request
    #[derive(Default)]
    struct RecordingStore {
        fail: bool,
        puts: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put_object(&self, key: &str, _body: Bytes, _content_type: &str) -> Result<String, StorageError> {
            if self.fail {
                return Err(StorageError::Remote("connection refused".to_string()));
            }
            self.puts.lock().unwrap().push(key.to_string());
            Ok(format!("https://bucket.example/{key}"))
        }

        async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
            if self.fail {
                return Err(StorageError::Remote("connection refused".to_string()));
            }
            self.deletes.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
            Ok(format!("https://bucket.example/{key}?expires={}", expires_in.as_secs()))
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\doc.txt"), "doc.txt");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("résumé.doc"), "r_sum_.doc");
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("1700000000000-a.txt").is_ok());
        assert!(validate_key("a..b").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a\\b").is_err());
    }

    #[tokio::test]
    async fn test_local_upload_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::local(dir.path());

        let staged = storage
            .stage("notes.txt", "text/plain", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert!(staged.key.ends_with("-notes.txt"));

        let stored = storage.upload(staged, "http://localhost:4005/").await;

        assert_eq!(stored.url, format!("http://localhost:4005/files/{}", stored.key));
        assert_eq!(stored.original_name, "notes.txt");
        assert_eq!(stored.size, 5);
        assert_eq!(
            tokio::fs::read(dir.path().join(&stored.key)).await.unwrap(),
            b"hello"
        );
    }

    #[tokio::test]
    async fn test_same_name_gets_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::local(dir.path());

        let mut keys = Vec::new();
        for _ in 0..3 {
            let staged = storage
                .stage("a.txt", "text/plain", Bytes::from_static(b"x"))
                .await
                .unwrap();
            keys.push(staged.key);
        }

        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn test_remote_success_removes_staged_copy() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(RecordingStore::default());
        let storage = BlobStorage::with_remote(dir.path(), remote.clone());

        let staged = storage
            .stage("a.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        let path = staged.path.clone();

        let stored = storage.upload(staged, "http://localhost:4005").await;

        assert_eq!(stored.url, format!("https://bucket.example/{}", stored.key));
        assert_eq!(remote.puts.lock().unwrap().as_slice(), [stored.key.clone()]);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let storage = BlobStorage::with_remote(dir.path(), remote);

        let staged = storage
            .stage("a.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        let path = staged.path.clone();

        let stored = storage.upload(staged, "http://localhost:4005").await;

        assert_eq!(stored.url, format!("http://localhost:4005/files/{}", stored.key));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_delete_removes_remote_and_local() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(RecordingStore::default());
        let storage = BlobStorage::with_remote(dir.path(), remote.clone());

        tokio::fs::write(dir.path().join("1-a.txt"), b"x").await.unwrap();
        storage.delete("1-a.txt").await.unwrap();

        assert_eq!(remote.deletes.lock().unwrap().as_slice(), ["1-a.txt".to_string()]);
        assert!(!dir.path().join("1-a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_key_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::local(dir.path());

        assert!(storage.delete("missing.txt").await.is_ok());
        assert!(matches!(
            storage.delete("../outside").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_delete_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::with_remote(
            dir.path(),
            Arc::new(RecordingStore {
                fail: true,
                ..Default::default()
            }),
        );

        assert!(matches!(
            storage.delete("1-a.txt").await,
            Err(StorageError::Remote(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_url() {
        let dir = tempfile::tempdir().unwrap();

        let local = BlobStorage::local(dir.path());
        assert_eq!(
            local
                .sign_url("1-a.txt", Duration::from_secs(60), "http://h")
                .await
                .unwrap(),
            "http://h/files/1-a.txt"
        );

        let remote = BlobStorage::with_remote(dir.path(), Arc::new(RecordingStore::default()));
        assert_eq!(
            remote
                .sign_url("1-a.txt", Duration::from_secs(60), "http://h")
                .await
                .unwrap(),
            "https://bucket.example/1-a.txt?expires=60"
        );
    }
}
