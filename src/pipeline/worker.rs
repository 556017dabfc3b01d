//! Page worker: recognize, embed, persist, and report one page unit.

use super::{PipelineError, PipelineService};
use crate::model::PageStatus;
use std::sync::Arc;

impl PipelineService {
    /// Process one page end-to-end. Failures mark the page `error`; whether
    /// the tracker learns about them depends on `count_failed_pages`.
    pub async fn process_page(self: Arc<Self>, page_id: String) {
        if let Err(error) = self.clone().recognize_page(&page_id).await {
            tracing::warn!(page_id, error = %error, "Page recognition failed");
            self.metrics.record_page_failed();

            let marked = self
                .store
                .update_page(&page_id, Box::new(|page| page.status = PageStatus::Error))
                .await;
            let document_id = match marked {
                Ok(page) => page.document_id,
                Err(store_error) => {
                    tracing::error!(page_id, error = %store_error, "Failed to mark page error");
                    return;
                }
            };

            if !self.options.count_failed_pages {
                // Source parity: the failure is never reported, so the
                // document stalls short of its total.
                return;
            }

            match self.tracker.report_page_failed(&document_id).await {
                Ok(update) if update.newly_completed => {
                    tracing::warn!(
                        document_id,
                        failed = update.failed_pages,
                        total = update.total_page_count,
                        "Document completed with failed pages"
                    );
                }
                Ok(_) => {}
                Err(store_error) => {
                    tracing::error!(document_id, error = %store_error, "Failed to report page failure");
                }
            }
        }
    }

    async fn recognize_page(self: Arc<Self>, page_id: &str) -> Result<(), PipelineError> {
        let page = self.store.get_page(page_id).await?;
        let asset_ref = page
            .asset_ref
            .clone()
            .ok_or_else(|| PipelineError::MissingPageAsset(page_id.to_string()))?;

        self.store
            .update_page(page_id, Box::new(|page| page.status = PageStatus::Processing))
            .await?;

        let bytes = self.assets.fetch(&asset_ref).await?;
        let text = self
            .recognition
            .extract_text(&bytes, &page.content_type)
            .await?;
        let vector = self.recognition.embed(&text).await?;

        let stored_text = text.clone();
        self.store
            .update_page(
                page_id,
                Box::new(move |page| {
                    page.text = stored_text;
                    page.embedding = vector;
                    page.status = PageStatus::Completed;
                }),
            )
            .await?;

        let update = self.tracker.report_page_complete(&page.document_id).await?;
        self.metrics.record_page_completed();
        tracing::debug!(
            document_id = %page.document_id,
            page = page.page_number,
            progress = update.progress,
            "Page completed"
        );

        if update.newly_completed && update.published {
            self.metrics.record_published();
            tracing::info!(document_id = %page.document_id, "Document published");
            let generator = self.generator.clone();
            let document_id = page.document_id.clone();
            tokio::spawn(async move {
                generator.regenerate(&document_id).await;
            });
        }

        Ok(())
    }
}
