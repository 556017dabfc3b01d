//! Hybrid semantic + lexical search.
//!
//! A query runs two independent retrieval paths concurrently: vector
//! similarity over page embeddings (post-filtered by the lexical options
//! against the page text) and a title search returning document-level hits.
//! The paths are joined, fused by `(document, page)` key, and ranked with a
//! deterministic tie-break. Either path failing fails the whole query; a
//! partial result is never returned silently.

use crate::model::SearchResult;
use crate::recognition::{RecognitionClient, RecognitionError};
use crate::store::{DocumentStore, StoreError, VectorHit};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Boost applied to semantic scores before fusion.
const SEMANTIC_BOOST: f32 = 1.5;
/// Fixed score assigned to every lexical title hit.
const LEXICAL_SCORE: f32 = 1.0;
/// Characters of page text kept on each side of a snippet match.
const SNIPPET_RADIUS: usize = 80;

/// Errors emitted while orchestrating a hybrid search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Embedding the query failed.
    #[error("Failed to embed query: {0}")]
    Recognition(#[from] RecognitionError),
    /// Document store query failed.
    #[error("Document store request failed: {0}")]
    Store(#[from] StoreError),
    /// The lexical filter could not be compiled.
    #[error("Invalid query filter: {0}")]
    Filter(#[from] regex::Error),
}

/// Lexical filtering options applied to a query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Match the query with exact case.
    pub case_sensitive: bool,
    /// Match the query only at word boundaries.
    pub whole_word: bool,
    /// Optional override of the fused result limit.
    pub limit: Option<usize>,
}

/// Fuses concurrent semantic and lexical retrieval over the corpus.
pub struct HybridSearchEngine {
    store: Arc<dyn DocumentStore>,
    recognition: Arc<dyn RecognitionClient>,
    top_k: usize,
    result_limit: usize,
}

impl HybridSearchEngine {
    /// Build a search engine with the supplied candidate and result limits.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        recognition: Arc<dyn RecognitionClient>,
        top_k: usize,
        result_limit: usize,
    ) -> Self {
        Self {
            store,
            recognition,
            top_k,
            result_limit,
        }
    }

    /// Execute a hybrid search. An empty or whitespace-only query returns an
    /// empty sequence without invoking either retrieval path.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = build_matcher(query, options)?;
        let (semantic, lexical) = tokio::join!(
            self.semantic_path(query, &matcher),
            self.lexical_path(query)
        );
        let semantic = semantic?;
        let lexical = lexical?;

        let limit = options.limit.unwrap_or(self.result_limit);
        let results = fuse(semantic, lexical, limit);
        tracing::debug!(query, results = results.len(), "Search completed");
        Ok(results)
    }

    /// Vector similarity over page embeddings, intersected with the lexical
    /// filter applied to the matched page's text.
    async fn semantic_path(
        &self,
        query: &str,
        matcher: &Regex,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let vector = self.recognition.embed(query).await?;
        let hits = self.store.vector_search(&vector, self.top_k).await?;

        let results = hits
            .into_iter()
            .filter_map(|hit| {
                let found = matcher.find(&hit.text)?;
                let snippet = snippet_around(&hit.text, found.start(), found.end());
                let VectorHit {
                    document_id,
                    page_number,
                    score,
                    ..
                } = hit;
                Some(SearchResult {
                    document_id,
                    page_number,
                    snippet,
                    score,
                })
            })
            .collect();
        Ok(results)
    }

    /// Title search returning document-level hits pinned to page 1 at a fixed
    /// score.
    async fn lexical_path(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let documents = self.store.search_titles(query, self.top_k).await?;
        Ok(documents
            .into_iter()
            .map(|doc| SearchResult {
                document_id: doc.id,
                page_number: 1,
                snippet: doc.title,
                score: LEXICAL_SCORE,
            })
            .collect())
    }
}

/// Compile the lexical filter for a query.
fn build_matcher(query: &str, options: &SearchOptions) -> Result<Regex, regex::Error> {
    let mut pattern = regex::escape(query);
    if options.whole_word {
        pattern = format!(r"\b{pattern}\b");
    }
    if !options.case_sensitive {
        pattern = format!("(?i){pattern}");
    }
    Regex::new(&pattern)
}

/// Merge the two result sets keyed by `(document, page)`.
///
/// Semantic results enter first with a boosted score; a lexical hit on the
/// same key adds its score, otherwise it inserts at its own score. Ranking is
/// by fused score descending, tie-broken by document id then page number.
fn fuse(
    semantic: Vec<SearchResult>,
    lexical: Vec<SearchResult>,
    limit: usize,
) -> Vec<SearchResult> {
    let mut fused: HashMap<(String, u32), SearchResult> = HashMap::new();

    for mut result in semantic {
        result.score *= SEMANTIC_BOOST;
        fused.insert((result.document_id.clone(), result.page_number), result);
    }
    for result in lexical {
        let key = (result.document_id.clone(), result.page_number);
        match fused.get_mut(&key) {
            Some(existing) => existing.score += result.score,
            None => {
                fused.insert(key, result);
            }
        }
    }

    let mut results: Vec<SearchResult> = fused.into_values().collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.document_id.cmp(&b.document_id))
            .then_with(|| a.page_number.cmp(&b.page_number))
    });
    results.truncate(limit);
    results
}

/// Excerpt page text around a filter match, on character boundaries.
fn snippet_around(text: &str, start: usize, end: usize) -> String {
    let mut from = start.saturating_sub(SNIPPET_RADIUS);
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + SNIPPET_RADIUS).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, PageStatus, PageUnit};
    use crate::recognition::{OutlineEntry, RecognitionError};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    fn result(document_id: &str, page_number: u32, score: f32) -> SearchResult {
        SearchResult {
            document_id: document_id.into(),
            page_number,
            snippet: String::new(),
            score,
        }
    }

    #[test]
    fn fusion_adds_lexical_score_onto_boosted_semantic() {
        let semantic = vec![result("doc1", 1, 2.0), result("doc2", 1, 1.0)];
        let lexical = vec![result("doc1", 1, 1.0)];

        let fused = fuse(semantic, lexical, 10);
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].document_id, "doc1");
        assert!((fused[0].score - 4.0).abs() < f32::EPSILON);
        assert_eq!(fused[1].document_id, "doc2");
        assert!((fused[1].score - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn fusion_ties_break_by_document_then_page() {
        let semantic = vec![result("b", 2, 1.0), result("a", 3, 1.0), result("a", 1, 1.0)];
        let fused = fuse(semantic, Vec::new(), 10);

        let keys: Vec<(&str, u32)> = fused
            .iter()
            .map(|r| (r.document_id.as_str(), r.page_number))
            .collect();
        assert_eq!(keys, vec![("a", 1), ("a", 3), ("b", 2)]);
    }

    #[test]
    fn fusion_truncates_to_the_limit() {
        let semantic = (0..20).map(|i| result("doc", i, 1.0)).collect();
        let fused = fuse(semantic, Vec::new(), 10);
        assert_eq!(fused.len(), 10);
    }

    #[test]
    fn whole_word_matcher_rejects_substrings() {
        let options = SearchOptions {
            whole_word: true,
            ..Default::default()
        };
        let matcher = build_matcher("rail", &options).unwrap();
        assert!(matcher.is_match("the rail network"));
        assert!(!matcher.is_match("railway"));
    }

    #[test]
    fn case_sensitive_matcher_respects_case() {
        let options = SearchOptions {
            case_sensitive: true,
            ..Default::default()
        };
        let matcher = build_matcher("Rail", &options).unwrap();
        assert!(matcher.is_match("Rail network"));
        assert!(!matcher.is_match("rail network"));

        let insensitive = build_matcher("Rail", &SearchOptions::default()).unwrap();
        assert!(insensitive.is_match("rail network"));
    }

    struct PanickingRecognition;

    #[async_trait]
    impl RecognitionClient for PanickingRecognition {
        async fn extract_text(
            &self,
            _page: &[u8],
            _content_type: &str,
        ) -> Result<String, RecognitionError> {
            panic!("no retrieval call expected");
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RecognitionError> {
            panic!("no retrieval call expected");
        }

        async fn generate_outline(
            &self,
            _text: &str,
        ) -> Result<Vec<OutlineEntry>, RecognitionError> {
            panic!("no retrieval call expected");
        }
    }

    struct FixedEmbedding(Vec<f32>);

    #[async_trait]
    impl RecognitionClient for FixedEmbedding {
        async fn extract_text(
            &self,
            _page: &[u8],
            _content_type: &str,
        ) -> Result<String, RecognitionError> {
            unreachable!("search never extracts")
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RecognitionError> {
            Ok(self.0.clone())
        }

        async fn generate_outline(
            &self,
            _text: &str,
        ) -> Result<Vec<OutlineEntry>, RecognitionError> {
            unreachable!("search never outlines")
        }
    }

    struct FailingEmbedding;

    #[async_trait]
    impl RecognitionClient for FailingEmbedding {
        async fn extract_text(
            &self,
            _page: &[u8],
            _content_type: &str,
        ) -> Result<String, RecognitionError> {
            unreachable!()
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RecognitionError> {
            Err(RecognitionError::Unavailable("down".into()))
        }

        async fn generate_outline(
            &self,
            _text: &str,
        ) -> Result<Vec<OutlineEntry>, RecognitionError> {
            unreachable!()
        }
    }

    async fn seeded_store() -> (Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let doc = Document::new("Rail Atlas".into(), "maps".into(), None, None);
        let id = doc.id.clone();
        store.insert_document(doc).await.unwrap();

        let mut page = PageUnit::placeholder(&id, 1, 2, "image/png", "ref".into());
        page.status = PageStatus::Completed;
        page.text = "The rail network expanded across the county.".into();
        page.embedding = vec![1.0, 0.0];
        store.insert_page(page).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn empty_query_short_circuits_without_retrieval() {
        let store = Arc::new(MemoryStore::new());
        let engine = HybridSearchEngine::new(store, Arc::new(PanickingRecognition), 10, 10);

        let results = engine
            .search("   ", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn semantic_and_lexical_hits_fuse_on_the_same_document() {
        let (store, id) = seeded_store().await;
        let engine = HybridSearchEngine::new(
            store,
            Arc::new(FixedEmbedding(vec![1.0, 0.0])),
            10,
            10,
        );

        let results = engine
            .search("rail", &SearchOptions::default())
            .await
            .unwrap();

        // Page 1 collects both the boosted semantic score and the title hit.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_id, id);
        assert_eq!(results[0].page_number, 1);
        let expected = 1.0 * SEMANTIC_BOOST + LEXICAL_SCORE;
        assert!((results[0].score - expected).abs() < 1e-6);
        assert!(results[0].snippet.contains("rail network"));
    }

    #[tokio::test]
    async fn lexical_filter_discards_vector_similar_pages() {
        let (store, _id) = seeded_store().await;
        let engine = HybridSearchEngine::new(
            store,
            Arc::new(FixedEmbedding(vec![1.0, 0.0])),
            10,
            10,
        );

        let results = engine
            .search("canal", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn failing_semantic_path_propagates_instead_of_masking() {
        let (store, _id) = seeded_store().await;
        let engine = HybridSearchEngine::new(store, Arc::new(FailingEmbedding), 10, 10);

        let error = engine
            .search("rail", &SearchOptions::default())
            .await
            .expect_err("path failure");
        assert!(matches!(error, SearchError::Recognition(_)));
    }
}
