//! Document store boundary.
//!
//! The pipeline talks to storage through [`DocumentStore`]; the in-memory
//! implementation backs tests and single-node deployments. The contract the
//! pipeline depends on is the transactional read-modify-write of a single
//! document record: concurrent page workers report progress through it, and a
//! non-atomic read-then-write would lose increments under race.

mod memory;

pub use memory::MemoryStore;

use crate::model::{Document, IndexEntry, PageUnit};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document exists with the supplied identifier.
    #[error("No document stored under id '{0}'")]
    DocumentMissing(String),
    /// No page unit exists with the supplied identifier.
    #[error("No page unit stored under id '{0}'")]
    PageMissing(String),
}

/// Mutation applied to a record under the store's transactional guarantee.
pub type Mutation<T> = Box<dyn FnOnce(&mut T) + Send>;

/// One page-level match from the vector similarity query.
#[derive(Debug, Clone)]
pub struct VectorHit {
    /// Owning document.
    pub document_id: String,
    /// Matched page number.
    pub page_number: u32,
    /// Extracted page text, used by lexical post-filters and snippets.
    pub text: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Interface implemented by document storage backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document record.
    async fn insert_document(&self, document: Document) -> Result<(), StoreError>;

    /// Fetch a document by id.
    async fn get_document(&self, id: &str) -> Result<Document, StoreError>;

    /// Apply a mutation to one document atomically and return the updated
    /// record. Calls for the same document are serialized.
    async fn update_document(
        &self,
        id: &str,
        mutation: Mutation<Document>,
    ) -> Result<Document, StoreError>;

    /// Persist a new page unit.
    async fn insert_page(&self, page: PageUnit) -> Result<(), StoreError>;

    /// Fetch a page unit by id.
    async fn get_page(&self, id: &str) -> Result<PageUnit, StoreError>;

    /// Apply a mutation to one page unit atomically and return the updated
    /// record.
    async fn update_page(
        &self,
        id: &str,
        mutation: Mutation<PageUnit>,
    ) -> Result<PageUnit, StoreError>;

    /// List a document's page units ordered by page number.
    async fn list_pages(&self, document_id: &str) -> Result<Vec<PageUnit>, StoreError>;

    /// Delete every page unit belonging to a document, returning the count.
    async fn delete_pages(&self, document_id: &str) -> Result<usize, StoreError>;

    /// Replace a document's index entries wholesale (delete-all, insert-all).
    async fn replace_index_entries(
        &self,
        document_id: &str,
        entries: Vec<IndexEntry>,
    ) -> Result<(), StoreError>;

    /// List a document's index entries in document-reading order.
    async fn list_index_entries(&self, document_id: &str) -> Result<Vec<IndexEntry>, StoreError>;

    /// Case-insensitive substring search over document titles.
    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<Document>, StoreError>;

    /// Nearest-neighbor query over completed page embeddings.
    async fn vector_search(&self, vector: &[f32], limit: usize)
    -> Result<Vec<VectorHit>, StoreError>;
}
