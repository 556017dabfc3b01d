//! In-memory document store.
//!
//! All records live behind a single `RwLock`; every mutation takes the write
//! lock, which gives each `update_document` call the serialized transaction
//! semantics the progress tracker depends on.

use super::{DocumentStore, Mutation, StoreError, VectorHit};
use crate::model::{Document, IndexEntry, PageStatus, PageUnit, current_timestamp_rfc3339};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    documents: HashMap<String, Document>,
    pages: HashMap<String, PageUnit>,
    index_entries: HashMap<String, Vec<IndexEntry>>,
}

/// Single-node store keeping all records in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, document: Document) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .documents
            .insert(document.id.clone(), document);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Document, StoreError> {
        self.inner
            .read()
            .await
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentMissing(id.to_string()))
    }

    async fn update_document(
        &self,
        id: &str,
        mutation: Mutation<Document>,
    ) -> Result<Document, StoreError> {
        let mut inner = self.inner.write().await;
        let document = inner
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::DocumentMissing(id.to_string()))?;
        mutation(document);
        document.updated_at = current_timestamp_rfc3339();
        Ok(document.clone())
    }

    async fn insert_page(&self, page: PageUnit) -> Result<(), StoreError> {
        self.inner.write().await.pages.insert(page.id.clone(), page);
        Ok(())
    }

    async fn get_page(&self, id: &str) -> Result<PageUnit, StoreError> {
        self.inner
            .read()
            .await
            .pages
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::PageMissing(id.to_string()))
    }

    async fn update_page(
        &self,
        id: &str,
        mutation: Mutation<PageUnit>,
    ) -> Result<PageUnit, StoreError> {
        let mut inner = self.inner.write().await;
        let page = inner
            .pages
            .get_mut(id)
            .ok_or_else(|| StoreError::PageMissing(id.to_string()))?;
        mutation(page);
        Ok(page.clone())
    }

    async fn list_pages(&self, document_id: &str) -> Result<Vec<PageUnit>, StoreError> {
        let inner = self.inner.read().await;
        let mut pages: Vec<PageUnit> = inner
            .pages
            .values()
            .filter(|page| page.document_id == document_id)
            .cloned()
            .collect();
        pages.sort_by_key(|page| page.page_number);
        Ok(pages)
    }

    async fn delete_pages(&self, document_id: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.pages.len();
        inner.pages.retain(|_, page| page.document_id != document_id);
        Ok(before - inner.pages.len())
    }

    async fn replace_index_entries(
        &self,
        document_id: &str,
        entries: Vec<IndexEntry>,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .index_entries
            .insert(document_id.to_string(), entries);
        Ok(())
    }

    async fn list_index_entries(&self, document_id: &str) -> Result<Vec<IndexEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .index_entries
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        let mut hits: Vec<Document> = inner
            .documents
            .values()
            .filter(|doc| doc.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn vector_search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorHit>, StoreError> {
        let inner = self.inner.read().await;
        let mut hits: Vec<VectorHit> = inner
            .pages
            .values()
            .filter(|page| page.status == PageStatus::Completed)
            .map(|page| VectorHit {
                document_id: page.document_id.clone(),
                page_number: page.page_number,
                text: page.text.clone(),
                score: cosine_similarity(vector, &page.embedding),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document_id.cmp(&b.document_id))
                .then_with(|| a.page_number.cmp(&b.page_number))
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
