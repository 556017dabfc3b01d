//! Object-store boundary for source and page artifacts.
//!
//! References are content-addressed: storing the same bytes twice yields the
//! same reference, which keeps orchestrator re-runs from accumulating copies.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors raised by the artifact store.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No artifact exists for the supplied reference.
    #[error("No asset stored under reference '{0}'")]
    Missing(String),
}

/// Interface implemented by artifact storage backends.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist raw bytes and return an opaque reference.
    async fn store(&self, bytes: Vec<u8>) -> Result<String, AssetError>;

    /// Fetch the bytes previously stored under a reference.
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError>;
}

/// Compute the content-addressed reference for an artifact.
pub fn compute_asset_ref(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// In-process artifact store keyed by content digest.
#[derive(Default)]
pub struct MemoryAssetStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryAssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn store(&self, bytes: Vec<u8>) -> Result<String, AssetError> {
        let reference = compute_asset_ref(&bytes);
        self.blobs.write().await.insert(reference.clone(), bytes);
        Ok(reference)
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
        self.blobs
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| AssetError::Missing(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_and_fetch_round_trips() {
        let store = MemoryAssetStore::new();
        let reference = store.store(b"page bytes".to_vec()).await.expect("store");
        let bytes = store.fetch(&reference).await.expect("fetch");
        assert_eq!(bytes, b"page bytes");
    }

    #[tokio::test]
    async fn identical_bytes_share_a_reference() {
        let store = MemoryAssetStore::new();
        let first = store.store(b"same".to_vec()).await.expect("store");
        let second = store.store(b"same".to_vec()).await.expect("store");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_reference_is_an_error() {
        let store = MemoryAssetStore::new();
        let error = store.fetch("deadbeef").await.expect_err("missing");
        assert!(matches!(error, AssetError::Missing(_)));
    }

    #[test]
    fn asset_ref_is_stable() {
        assert_eq!(compute_asset_ref(b"x"), compute_asset_ref(b"x"));
        assert_ne!(compute_asset_ref(b"x"), compute_asset_ref(b"y"));
    }
}
