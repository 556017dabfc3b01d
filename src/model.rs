//! Persistent record types for documents, pages, index entries, and search hits.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Pages are being split or recognized.
    Processing,
    /// Every page reached terminal success.
    Published,
    /// Processing failed; `processing_error` carries the cause.
    Error,
    /// Retired from the active corpus by an external actor.
    Archived,
}

/// A scanned document and its processing counters.
///
/// Mutated exclusively by the orchestrator, page workers, and the progress
/// tracker; never deleted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier assigned at upload.
    pub id: String,
    /// Human-readable title, also searched by the lexical path.
    pub title: String,
    /// Free-form category label.
    pub category: String,
    /// Publication year, when known.
    pub year: Option<i32>,
    /// Descriptive metadata supplied at upload.
    pub description: Option<String>,
    /// Authoritative page count after the first split; may be corrected.
    pub total_page_count: u32,
    /// Number of pages that reached terminal success.
    pub processed_pages: u32,
    /// Number of pages that reached terminal failure.
    pub failed_pages: u32,
    /// Current lifecycle state.
    pub status: DocumentStatus,
    /// Derived progress percentage in `0..=100`.
    pub processing_progress: u8,
    /// Failure message recorded when `status` is `error`.
    pub processing_error: Option<String>,
    /// Reference to the uploaded source artifact.
    pub source_asset: Option<String>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// RFC3339 timestamp of the last mutation.
    pub updated_at: String,
}

impl Document {
    /// Create a fresh document in the `processing` state with zeroed counters.
    pub fn new(title: String, category: String, year: Option<i32>, description: Option<String>) -> Self {
        let now = current_timestamp_rfc3339();
        Self {
            id: generate_id(),
            title,
            category,
            year,
            description,
            total_page_count: 0,
            processed_pages: 0,
            failed_pages: 0,
            status: DocumentStatus::Processing,
            processing_progress: 0,
            processing_error: None,
            source_asset: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Lifecycle state of a single page unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Placeholder created by the orchestrator; no worker has started.
    Pending,
    /// Owning worker is recognizing the page.
    Processing,
    /// Text and embedding persisted.
    Completed,
    /// Worker failed; the page holds no usable text.
    Error,
}

/// Per-page processing record, owned by exactly one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageUnit {
    /// Stable identifier.
    pub id: String,
    /// Owning document.
    pub document_id: String,
    /// 1-indexed page number, dense within a document.
    pub page_number: u32,
    /// Current lifecycle state.
    pub status: PageStatus,
    /// Extracted text; empty until completed.
    pub text: String,
    /// Embedding vector; zero-filled placeholder until completed.
    pub embedding: Vec<f32>,
    /// MIME type of the page artifact.
    pub content_type: String,
    /// Reference to the standalone page artifact.
    pub asset_ref: Option<String>,
}

impl PageUnit {
    /// Create a pending placeholder for one page of a document.
    pub fn placeholder(
        document_id: &str,
        page_number: u32,
        embedding_dimension: usize,
        content_type: &str,
        asset_ref: String,
    ) -> Self {
        Self {
            id: generate_id(),
            document_id: document_id.to_string(),
            page_number,
            status: PageStatus::Pending,
            text: String::new(),
            embedding: vec![0.0; embedding_dimension],
            content_type: content_type.to_string(),
            asset_ref: Some(asset_ref),
        }
    }
}

/// One entry of a document's structural index, in document-reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Section heading text.
    pub label: String,
    /// Nesting significance; 1 is the most significant.
    pub level: u32,
    /// Page number where the section first appears.
    pub target_page: u32,
}

/// Ephemeral search hit produced per query; never persisted.
///
/// Uniqueness key within one response is `(document_id, page_number)`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Document the hit belongs to.
    pub document_id: String,
    /// Page the hit points at (1 for document-level lexical hits).
    pub page_number: u32,
    /// Short excerpt for display.
    pub snippet: String,
    /// Fused ranking score.
    pub score: f32,
}

/// Construct an identifier suitable for store records.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current timestamp formatted for record storage.
pub fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_starts_processing_with_zero_counters() {
        let doc = Document::new("Atlas".into(), "maps".into(), Some(1898), None);
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert_eq!(doc.processed_pages, 0);
        assert_eq!(doc.failed_pages, 0);
        assert_eq!(doc.processing_progress, 0);
        assert!(doc.processing_error.is_none());
    }

    #[test]
    fn placeholder_page_has_zero_filled_embedding() {
        let page = PageUnit::placeholder("doc-1", 3, 4, "image/png", "ref-1".into());
        assert_eq!(page.status, PageStatus::Pending);
        assert_eq!(page.page_number, 3);
        assert_eq!(page.embedding, vec![0.0; 4]);
        assert!(page.text.is_empty());
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }
}
