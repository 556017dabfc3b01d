//! Pipeline orchestration: split a source document and fan out page workers.

use super::{PAGE_CONTENT_TYPE, PipelineError, PipelineService};
use crate::model::{DocumentStatus, PageUnit};
use std::sync::Arc;

impl PipelineService {
    /// Execute one processing run for a document, recording failures on the
    /// document record.
    ///
    /// Setup failures abort the run with status `error`; workers that were
    /// already dispatched before the failure continue independently.
    pub async fn run(self: Arc<Self>, document_id: String) {
        if let Err(error) = self.clone().split_document(&document_id).await {
            tracing::error!(document_id, error = %error, "Document processing run failed");
            let message = error.to_string();
            let result = self
                .store
                .update_document(
                    &document_id,
                    Box::new(move |doc| {
                        doc.status = DocumentStatus::Error;
                        doc.processing_error = Some(message);
                    }),
                )
                .await;
            if let Err(store_error) = result {
                tracing::error!(document_id, error = %store_error, "Failed to record run error");
            }
        }
    }

    /// Split the source artifact into page units and dispatch one worker per
    /// page. Returns the corrected page count.
    pub(crate) async fn split_document(
        self: Arc<Self>,
        document_id: &str,
    ) -> Result<u32, PipelineError> {
        self.store
            .update_document(
                document_id,
                Box::new(|doc| {
                    doc.status = DocumentStatus::Processing;
                    doc.processing_progress = 0;
                    doc.processed_pages = 0;
                    doc.failed_pages = 0;
                    doc.processing_error = None;
                }),
            )
            .await?;

        let document = self.store.get_document(document_id).await?;
        let source_ref = document
            .source_asset
            .clone()
            .ok_or_else(|| PipelineError::MissingSource(document_id.to_string()))?;
        let source = self.assets.fetch(&source_ref).await?;

        let total = self.splitter.page_count(&source)?;
        if total != document.total_page_count {
            tracing::info!(
                document_id,
                stored = document.total_page_count,
                actual = total,
                "Correcting stored page count"
            );
            self.store
                .update_document(document_id, Box::new(move |doc| doc.total_page_count = total))
                .await?;
        }

        // Re-runs replace any page units left by a previous attempt.
        let removed = self.store.delete_pages(document_id).await?;
        if removed > 0 {
            tracing::debug!(document_id, removed, "Replaced existing page units");
        }

        for page_number in 1..=total {
            let page_bytes = self.splitter.extract_page(&source, page_number)?;
            let asset_ref = self.assets.store(page_bytes).await?;
            let page = PageUnit::placeholder(
                document_id,
                page_number,
                self.options.embedding_dimension,
                PAGE_CONTENT_TYPE,
                asset_ref,
            );
            let page_id = page.id.clone();
            self.store.insert_page(page).await?;
            tokio::spawn(self.clone().process_page(page_id));
        }

        tracing::info!(document_id, pages = total, "Dispatched page workers");
        Ok(total)
    }
}
