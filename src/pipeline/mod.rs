//! Document processing pipeline.
//!
//! The orchestrator splits a source artifact into page units and fans out one
//! worker per page; workers recognize, embed, and persist their page, then
//! report to the progress tracker. The tracker's transactional increment is
//! the completion barrier: whichever report crosses it publishes the document
//! and dispatches outline generation.

mod orchestrator;
mod tracker;
mod types;
mod worker;

pub use tracker::{ProgressTracker, ProgressUpdate};
pub use types::PipelineError;

use crate::assets::AssetStore;
use crate::metrics::PipelineMetrics;
use crate::outline::IndexGenerator;
use crate::recognition::RecognitionClient;
use crate::split::PageSplitter;
use crate::store::DocumentStore;
use std::sync::Arc;

/// MIME type recorded for extracted page artifacts.
pub const PAGE_CONTENT_TYPE: &str = "image/png";

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Dimensionality of page embedding placeholders.
    pub embedding_dimension: usize,
    /// Whether failed pages are reported toward document completion. When
    /// false, a page failure silently stalls the document (source parity).
    pub count_failed_pages: bool,
}

/// Long-lived pipeline coordinator shared by the HTTP surface and tests.
///
/// Construct once near process start and share through an `Arc`; worker
/// dispatch clones the `Arc` into spawned tasks.
pub struct PipelineService {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) assets: Arc<dyn AssetStore>,
    pub(crate) recognition: Arc<dyn RecognitionClient>,
    pub(crate) splitter: Arc<dyn PageSplitter>,
    pub(crate) generator: Arc<IndexGenerator>,
    pub(crate) metrics: Arc<PipelineMetrics>,
    pub(crate) tracker: ProgressTracker,
    pub(crate) options: PipelineOptions,
}

impl PipelineService {
    /// Build a pipeline service over the supplied collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        assets: Arc<dyn AssetStore>,
        recognition: Arc<dyn RecognitionClient>,
        splitter: Arc<dyn PageSplitter>,
        generator: Arc<IndexGenerator>,
        metrics: Arc<PipelineMetrics>,
        options: PipelineOptions,
    ) -> Self {
        let tracker = ProgressTracker::new(store.clone());
        Self {
            store,
            assets,
            recognition,
            splitter,
            generator,
            metrics,
            tracker,
            options,
        }
    }
}
