//! Shared progress counters and the completion barrier.
//!
//! Page workers for the same document report here concurrently; every update
//! goes through the store's transactional read-modify-write so increments are
//! never lost. The completion check and the resulting status transition happen
//! inside the same atomic update, which guarantees the publish/index trigger
//! fires exactly once per document.

use crate::model::DocumentStatus;
use crate::store::{DocumentStore, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Snapshot returned by a progress report.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    /// Pages that reached terminal success.
    pub processed_pages: u32,
    /// Pages that reached terminal failure.
    pub failed_pages: u32,
    /// Authoritative page count.
    pub total_page_count: u32,
    /// Derived progress percentage.
    pub progress: u8,
    /// True iff this report crossed the completion barrier.
    pub newly_completed: bool,
    /// True iff the document is in the published state after this report.
    pub published: bool,
}

enum PageOutcome {
    Completed,
    Failed,
}

/// Serializes concurrent progress reports for a document.
pub struct ProgressTracker {
    store: Arc<dyn DocumentStore>,
}

impl ProgressTracker {
    /// Build a tracker over the document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Report one page reaching terminal success.
    pub async fn report_page_complete(
        &self,
        document_id: &str,
    ) -> Result<ProgressUpdate, StoreError> {
        self.report(document_id, PageOutcome::Completed).await
    }

    /// Report one page reaching terminal failure.
    ///
    /// Only called when failed pages count toward completion; the source
    /// behavior of never reporting failures is reproduced by not calling this.
    pub async fn report_page_failed(
        &self,
        document_id: &str,
    ) -> Result<ProgressUpdate, StoreError> {
        self.report(document_id, PageOutcome::Failed).await
    }

    /// Whether the document's terminal page count has reached its total.
    pub async fn is_complete(&self, document_id: &str) -> Result<bool, StoreError> {
        let doc = self.store.get_document(document_id).await?;
        Ok(doc.total_page_count > 0
            && doc.processed_pages + doc.failed_pages >= doc.total_page_count)
    }

    async fn report(
        &self,
        document_id: &str,
        outcome: PageOutcome,
    ) -> Result<ProgressUpdate, StoreError> {
        let crossed = Arc::new(AtomicBool::new(false));
        let flag = crossed.clone();
        let doc = self
            .store
            .update_document(
                document_id,
                Box::new(move |doc| {
                    match outcome {
                        PageOutcome::Completed => doc.processed_pages += 1,
                        PageOutcome::Failed => doc.failed_pages += 1,
                    }
                    let total = doc.total_page_count;
                    if total > 0 {
                        let pct = (100.0 * f64::from(doc.processed_pages) / f64::from(total))
                            .round() as u8;
                        doc.processing_progress = pct.min(100);
                    }
                    let terminal = doc.processed_pages + doc.failed_pages;
                    if doc.status == DocumentStatus::Processing && total > 0 && terminal >= total {
                        flag.store(true, Ordering::Relaxed);
                        if doc.failed_pages == 0 {
                            doc.status = DocumentStatus::Published;
                            doc.processing_progress = 100;
                        } else {
                            doc.status = DocumentStatus::Error;
                            doc.processing_error = Some(format!(
                                "{} of {} pages failed recognition",
                                doc.failed_pages, total
                            ));
                        }
                    }
                }),
            )
            .await?;

        Ok(ProgressUpdate {
            processed_pages: doc.processed_pages,
            failed_pages: doc.failed_pages,
            total_page_count: doc.total_page_count,
            progress: doc.processing_progress,
            newly_completed: crossed.load(Ordering::Relaxed),
            published: doc.status == DocumentStatus::Published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Document;
    use crate::store::MemoryStore;

    async fn tracker_with_document(total: u32) -> (ProgressTracker, String) {
        let store = Arc::new(MemoryStore::new());
        let mut doc = Document::new("Atlas".into(), "maps".into(), None, None);
        doc.total_page_count = total;
        let id = doc.id.clone();
        store.insert_document(doc).await.unwrap();
        (ProgressTracker::new(store), id)
    }

    #[tokio::test]
    async fn progress_is_rounded_percentage_of_processed_pages() {
        let (tracker, id) = tracker_with_document(3).await;

        let first = tracker.report_page_complete(&id).await.unwrap();
        assert_eq!(first.processed_pages, 1);
        assert_eq!(first.progress, 33);
        assert!(!first.newly_completed);

        let second = tracker.report_page_complete(&id).await.unwrap();
        assert_eq!(second.progress, 67);
        assert!(!second.newly_completed);
    }

    #[tokio::test]
    async fn completion_barrier_fires_exactly_once() {
        let (tracker, id) = tracker_with_document(2).await;

        assert!(!tracker.report_page_complete(&id).await.unwrap().newly_completed);
        let last = tracker.report_page_complete(&id).await.unwrap();
        assert!(last.newly_completed);
        assert!(last.published);
        assert_eq!(last.progress, 100);

        // A late report must not re-trigger the barrier.
        let extra = tracker.report_page_complete(&id).await.unwrap();
        assert!(!extra.newly_completed);
    }

    #[tokio::test]
    async fn failures_complete_the_document_in_error_state() {
        let (tracker, id) = tracker_with_document(2).await;

        tracker.report_page_complete(&id).await.unwrap();
        let last = tracker.report_page_failed(&id).await.unwrap();
        assert!(last.newly_completed);
        assert!(!last.published);
        assert_eq!(last.failed_pages, 1);

        assert!(tracker.is_complete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn unreported_failures_stall_completion() {
        let (tracker, id) = tracker_with_document(2).await;

        tracker.report_page_complete(&id).await.unwrap();
        // The failing page never reports; the document can never complete.
        assert!(!tracker.is_complete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_reports_do_not_lose_increments() {
        let (tracker, id) = tracker_with_document(16).await;
        let tracker = Arc::new(tracker);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let tracker = tracker.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                tracker.report_page_complete(&id).await.unwrap()
            }));
        }

        let mut completions = 0;
        for handle in handles {
            if handle.await.unwrap().newly_completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(tracker.is_complete(&id).await.unwrap());
    }
}
