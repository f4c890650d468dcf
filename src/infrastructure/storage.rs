//! Avatar file storage
//!
//! Boundary contract: the caller submits bytes plus a relative destination
//! path and gets back a retrievable URL. When no backend is configured the
//! submission fails outright; there is no silent fallback.

use async_trait::async_trait;
use di::{inject, injectable};
use log::info;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no storage backend configured")]
    NotConfigured,
    #[error("upload failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `bytes` at the relative `path` and returns the URL the file can
    /// be fetched from afterwards.
    async fn store(&self, path: &str, bytes: Vec<u8>) -> Result<String, StorageError>;
}

/// Disk-backed storage rooted at `AVATAR_STORAGE_DIR`; stored files are
/// served back under `/static/`.
pub struct DiskFileStorage {
    root: Option<PathBuf>,
}

#[injectable(FileStorage)]
impl DiskFileStorage {
    #[inject]
    pub fn create() -> DiskFileStorage {
        dotenvy::dotenv().ok();
        let root = env::var("AVATAR_STORAGE_DIR").ok().map(PathBuf::from);
        if root.is_none() {
            info!("AVATAR_STORAGE_DIR not set, avatar uploads are disabled");
        }
        DiskFileStorage { root }
    }
}

#[async_trait]
impl FileStorage for DiskFileStorage {
    async fn store(&self, path: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let root = self.root.as_ref().ok_or(StorageError::NotConfigured)?;
        let destination = root.join(path);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, bytes).await?;
        info!("stored upload at {}", destination.display());
        Ok(format!("/static/{path}"))
    }
}

/// Keeps the bare filename and drops anything outside `[A-Za-z0-9._-]`, so a
/// submitted name can never escape its `avatars/<user>/` directory.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches('.').to_owned();
    if cleaned.is_empty() {
        "upload".to_owned()
    } else {
        cleaned
    }
}
