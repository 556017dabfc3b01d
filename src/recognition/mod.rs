//! Abstractions for the external recognition service.
//!
//! The service exposes three request/response operations consumed by the
//! pipeline and search engine: page text extraction, text embedding, and
//! outline generation. The HTTP adapter mirrors the shape of a local model
//! runtime; responses are validated against strict schemas so malformed
//! payloads surface as typed errors instead of untyped decode failures.

mod http;

pub use http::HttpRecognitionClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by recognition service calls.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Service was unreachable or the endpoint is absent.
    #[error("Recognition service unavailable: {0}")]
    Unavailable(String),
    /// Service returned an error response.
    #[error("Recognition request failed: {0}")]
    Failed(String),
    /// Service response could not be parsed or violated the schema.
    #[error("Malformed recognition response: {0}")]
    InvalidResponse(String),
    /// Extraction produced no text for the page.
    #[error("Recognition produced empty text for the page")]
    EmptyExtraction,
}

/// One outline entry returned by the text-generation mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutlineEntry {
    /// Section heading text.
    pub label: String,
    /// Nesting significance; 1 is the most significant.
    pub level: u32,
    /// Page number where the section first appears.
    pub target_page: u32,
}

/// Interface implemented by recognition backends.
#[async_trait]
pub trait RecognitionClient: Send + Sync {
    /// Extract normalized structured text from one page artifact.
    async fn extract_text(
        &self,
        page: &[u8],
        content_type: &str,
    ) -> Result<String, RecognitionError>;

    /// Produce a fixed-length embedding vector for the supplied text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RecognitionError>;

    /// Request a hierarchical outline for concatenated document text.
    async fn generate_outline(&self, text: &str) -> Result<Vec<OutlineEntry>, RecognitionError>;
}

/// Instruction contract sent with every extraction request.
pub const EXTRACTION_INSTRUCTIONS: &str = "Produce normalized structured text for the scanned page. \
Preserve headings, sub-headings, and enumerations. Render tabular data as a textual table. \
Strip running headers, footers, and page numbers. \
Correct garbled characters using surrounding-context plausibility.";

/// Instruction contract sent with every outline request.
pub const OUTLINE_INSTRUCTIONS: &str = "Identify major and minor section markers in the document text. \
Assign each marker an integer level starting at 1 for the most significant, \
and attach the page number where it first appears. Ignore ordinary body text. \
Return a strict ordered list of {label, level, target_page} entries.";
