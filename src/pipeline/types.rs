//! Error definitions for the processing pipeline.

use crate::assets::AssetError;
use crate::recognition::RecognitionError;
use crate::split::SplitError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors emitted by pipeline runs and page workers.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source artifact could not be read as a page container.
    #[error("Failed to split source artifact: {0}")]
    Split(#[from] SplitError),
    /// Artifact store interaction failed.
    #[error("Asset store request failed: {0}")]
    Asset(#[from] AssetError),
    /// Document store interaction failed.
    #[error("Document store request failed: {0}")]
    Store(#[from] StoreError),
    /// Recognition service call failed.
    #[error("Recognition request failed: {0}")]
    Recognition(#[from] RecognitionError),
    /// Document carries no source artifact reference.
    #[error("Document '{0}' has no source artifact")]
    MissingSource(String),
    /// Page unit carries no artifact reference.
    #[error("Page unit '{0}' has no artifact reference")]
    MissingPageAsset(String),
}
