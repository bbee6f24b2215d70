//! Storage for uploaded images (avatars, vehicle photos).
//!
//! Registration receives a `ContentStore` instead of writing files itself,
//! so tests and alternative deployments can swap the backing store.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

/// Error types for content storage
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error from the underlying filesystem
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key does not name a storable file
    #[error("Invalid content key: {0}")]
    InvalidKey(String),
}

/// An uploaded file as received from the client.
#[derive(Clone)]
pub struct Upload {
    /// Client-supplied file name, possibly with directory components.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where a stored file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    /// Opaque name used for `load` and `remove`.
    pub key: String,
    /// Public URL the file is served from.
    pub url: String,
}

#[async_trait]
pub trait ContentStore: fmt::Debug + Send + Sync {
    /// Persists `bytes` under a fresh key derived from `file_name`.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<StoredContent, StoreError>;

    /// Returns the file contents, or `None` if nothing is stored under `key`.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Deletes the file. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Strips directory components, leaving the final path segment.
///
/// Returns `None` for `""`, `"."` and `".."`.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    // Treat backslashes as separators regardless of platform
    let normalized = name.replace('\\', "/");
    let base = Path::new(&normalized).file_name()?.to_str()?;
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

/// Longest URL the account tables can hold.
pub const MAX_URL_LEN: usize = 255;

/// Longest file name most filesystems accept, in bytes.
const MAX_FILE_NAME_BYTES: usize = 255;

/// Prefix of `s` no longer than `max_bytes`, cut on a char boundary.
fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Cuts `name` to at most `max_bytes` bytes, keeping the extension.
fn shorten_file_name(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    if extension.len() >= max_bytes {
        return truncate_bytes(name, max_bytes).to_string();
    }

    format!("{}{}", truncate_bytes(stem, max_bytes - extension.len()), extension)
}

/// `<uuid>_<basename>`, with the basename shortened so the key is a valid
/// file name and its public URL stays within `MAX_URL_LEN`.
fn unique_key(base_url: &str, file_name: &str) -> String {
    let base = sanitize_file_name(file_name).unwrap_or_else(|| "upload".to_string());
    let id = Uuid::new_v4().to_string();

    let url_budget = MAX_URL_LEN.saturating_sub(public_url(base_url, "").len() + id.len() + 1);
    let budget = url_budget.min(MAX_FILE_NAME_BYTES - id.len() - 1).max(1);
    format!("{}_{}", id, shorten_file_name(&base, budget))
}

fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/image/{}", base_url.trim_end_matches('/'), key)
}

/// Stores files in a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalContentStore {
    /// `root` is created on first write if it does not exist.
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let safe = sanitize_file_name(key).ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        Ok(self.root.join(safe))
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<StoredContent, StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let key = unique_key(&self.public_base_url, file_name);
        let path = self.root.join(&key);
        trace!("Writing upload to {}", path.display());
        tokio::fs::write(&path, bytes).await?;

        info!("Stored upload as {}", key);
        Ok(StoredContent {
            url: public_url(&self.public_base_url, &key),
            key,
        })
    }

    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(StoreError::InvalidKey(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored file at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Tried to remove missing file {}", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps files in process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    public_base_url: String,
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryContentStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Number of files currently held.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<StoredContent, StoreError> {
        let key = unique_key(&self.public_base_url, file_name);
        self.files.write().await.insert(key.clone(), bytes.to_vec());
        Ok(StoredContent {
            url: public_url(&self.public_base_url, &key),
            key,
        })
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(safe) = sanitize_file_name(key) else {
            return Ok(None);
        };
        Ok(self.files.read().await.get(&safe).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.files.write().await.remove(key);
        Ok(())
    }
}
