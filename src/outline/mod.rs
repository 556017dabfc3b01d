//! Structural index generation.
//!
//! Once every page of a document has completed, the generator concatenates the
//! page texts (capped to the recognition service's input budget), requests a
//! hierarchical outline, and replaces the document's index entries wholesale.
//! Generation is fire-and-forget relative to publishing: a malformed response
//! is logged and the existing index left untouched.

pub mod tree;

pub use tree::{OutlineNode, build_outline_tree};

use crate::model::IndexEntry;
use crate::recognition::{RecognitionClient, RecognitionError};
use crate::store::{DocumentStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised during outline regeneration.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// Document store interaction failed.
    #[error("Document store request failed: {0}")]
    Store(#[from] StoreError),
    /// Recognition service call failed or returned a malformed outline.
    #[error("Outline generation failed: {0}")]
    Recognition(#[from] RecognitionError),
    /// An outline entry pointed outside the document's page range.
    #[error("Outline entry '{label}' targets page {target_page} of {total}")]
    InvalidTarget {
        /// Offending entry label.
        label: String,
        /// Page the entry pointed at.
        target_page: u32,
        /// Document page count.
        total: u32,
    },
}

/// Regenerates a document's structural index from its page texts.
pub struct IndexGenerator {
    store: Arc<dyn DocumentStore>,
    recognition: Arc<dyn RecognitionClient>,
    input_budget: usize,
}

impl IndexGenerator {
    /// Build a generator with the supplied input byte budget.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        recognition: Arc<dyn RecognitionClient>,
        input_budget: usize,
    ) -> Self {
        Self {
            store,
            recognition,
            input_budget,
        }
    }

    /// Regenerate the index for a document, logging instead of raising.
    pub async fn regenerate(&self, document_id: &str) {
        match self.regenerate_inner(document_id).await {
            Ok(count) => {
                tracing::info!(document_id, entries = count, "Index regenerated");
            }
            Err(error) => {
                tracing::warn!(
                    document_id,
                    error = %error,
                    "Index regeneration failed; existing index left untouched"
                );
            }
        }
    }

    pub(crate) async fn regenerate_inner(
        &self,
        document_id: &str,
    ) -> Result<usize, OutlineError> {
        let document = self.store.get_document(document_id).await?;
        let pages = self.store.list_pages(document_id).await?;

        let mut text = String::new();
        for page in &pages {
            if text.len() >= self.input_budget {
                break;
            }
            text.push_str(&format!("[page {}]\n{}\n\n", page.page_number, page.text));
        }
        truncate_to_budget(&mut text, self.input_budget);

        let entries = self.recognition.generate_outline(&text).await?;

        let total = document.total_page_count;
        for entry in &entries {
            if entry.target_page == 0 || entry.target_page > total {
                return Err(OutlineError::InvalidTarget {
                    label: entry.label.clone(),
                    target_page: entry.target_page,
                    total,
                });
            }
        }

        let entries: Vec<IndexEntry> = entries
            .into_iter()
            .map(|entry| IndexEntry {
                label: entry.label,
                level: entry.level,
                target_page: entry.target_page,
            })
            .collect();
        let count = entries.len();
        self.store
            .replace_index_entries(document_id, entries)
            .await?;
        Ok(count)
    }
}

/// Trim text to at most `budget` bytes on a character boundary.
fn truncate_to_budget(text: &mut String, budget: usize) {
    if text.len() <= budget {
        return;
    }
    let mut cut = budget;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
