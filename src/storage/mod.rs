//! Profile image storage.
//!
//! `ImageStore` is the seam between the services and wherever the bytes
//! end up. `LocalImageStore` writes to a directory that the router serves
//! under `/images`.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported image type '{0}'")]
    UnsupportedType(String),

    #[error("image is empty")]
    Empty,

    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid public base URL: {0}")]
    InvalidBaseUrl(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the bytes and return the public URL
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<String, StorageError>;

    /// Remove a previously stored image; unknown URLs are ignored
    async fn remove(&self, public_url: &str) -> Result<(), StorageError>;
}

/// File extension for the accepted image MIME types
pub fn extension_for(content_type: &str) -> Result<&'static str, StorageError> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => Ok("png"),
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/webp" => Ok("webp"),
        "image/gif" => Ok("gif"),
        _ => Err(StorageError::UnsupportedType(content_type.to_string())),
    }
}

/// Content-addressed file name: identical uploads share one file
pub fn file_name(bytes: &[u8], extension: &str) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}.{}", digest, extension)
}

pub struct LocalImageStore {
    dir: PathBuf,
    base_url: Url,
    max_bytes: usize,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str, max_bytes: usize) -> Result<Self, StorageError> {
        let mut base_url = Url::parse(base_url).map_err(|_| StorageError::InvalidBaseUrl(base_url.to_string()))?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            dir: dir.into(),
            base_url,
            max_bytes,
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(&config.image_dir, &config.public_base_url, config.max_image_bytes)
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn public_url(&self, name: &str) -> Result<String, StorageError> {
        self.base_url
            .join(name)
            .map(String::from)
            .map_err(|_| StorageError::InvalidBaseUrl(self.base_url.to_string()))
    }

    /// File name behind a URL this store produced
    fn local_name<'a>(&self, public_url: &'a str) -> Option<&'a str> {
        let name = public_url.strip_prefix(self.base_url.as_str())?;
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
            && !name.starts_with('.');
        valid.then_some(name)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        let extension = extension_for(content_type)?;
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let name = file_name(bytes, extension);
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("Image {} already stored", name);
        } else {
            // Write then rename so readers never see a partial file
            let partial = self.dir.join(format!(".{}.partial", name));
            tokio::fs::write(&partial, bytes).await?;
            tokio::fs::rename(&partial, &path).await?;
            debug!("Stored image {} ({} bytes)", name, bytes.len());
        }

        self.public_url(&name)
    }

    async fn remove(&self, public_url: &str) -> Result<(), StorageError> {
        let Some(name) = self.local_name(public_url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

    #[test]
    fn maps_content_types() {
        assert_eq!(extension_for("image/png").unwrap(), "png");
        assert_eq!(extension_for("IMAGE/JPEG; charset=binary").unwrap(), "jpg");
        assert!(matches!(extension_for("text/html"), Err(StorageError::UnsupportedType(_))));
    }

    #[test]
    fn names_are_content_addressed() {
        let a = file_name(PNG, "png");
        assert_eq!(a, file_name(PNG, "png"));
        assert_ne!(a, file_name(b"other", "png"));
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), 64 + 4);
    }

    #[tokio::test]
    async fn stores_and_removes_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), "http://localhost:3000/images", 1024).unwrap();

        let url = store.put(PNG, "image/png").await.unwrap();
        assert!(url.starts_with("http://localhost:3000/images/"));
        let name = url.rsplit('/').next().unwrap();
        assert!(dir.path().join(name).exists());

        // Same bytes, same URL
        assert_eq!(store.put(PNG, "image/png").await.unwrap(), url);

        store.remove(&url).await.unwrap();
        assert!(!dir.path().join(name).exists());
        // Removing twice or removing a foreign URL is not an error
        store.remove(&url).await.unwrap();
        store.remove("https://elsewhere.example.com/x.png").await.unwrap();
    }

    #[tokio::test]
    async fn enforces_size_limit_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), "http://localhost/images/", 4).unwrap();
        assert!(matches!(store.put(PNG, "image/png").await, Err(StorageError::TooLarge { .. })));
        assert!(matches!(store.put(b"", "image/png").await, Err(StorageError::Empty)));
        assert!(matches!(store.put(b"abc", "application/pdf").await, Err(StorageError::UnsupportedType(_))));
    }

    #[test]
    fn ignores_paths_outside_the_store() {
        let store = LocalImageStore::new("/tmp/x", "http://localhost/images/", 4).unwrap();
        assert_eq!(store.local_name("http://localhost/images/abc.png"), Some("abc.png"));
        assert_eq!(store.local_name("http://localhost/images/../etc/passwd"), None);
        assert_eq!(store.local_name("http://localhost/other/abc.png"), None);
    }
}
