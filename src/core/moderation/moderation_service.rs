// Moderation service - the workflow engine the outer layers talk to.
//
// This service handles:
// - Submissions (persist PENDING, classify with retries, one terminal write)
// - User reports (delegated to the ReportCoordinator)
// - Moderator verdicts and history (delegated to the ModerationLedger)
// - Read-only projections: by id, by status, moderation queue, approved feed
//
// NO Discord dependencies here - just pure domain logic.

use super::action_ledger::ModerationLedger;
use super::classifier::ContentClassifier;
use super::moderation_models::{
    ContentId, ContentItem, ContentStatus, ModerationConfig, NewContent, QueueEntry, UserId,
};
use super::moderation_store::{ModerationError, ModerationStore};
use super::pipeline::ModerationPipeline;
use super::report_coordinator::ReportCoordinator;
use chrono::Utc;
use std::sync::Arc;

pub struct ModerationService<S: ModerationStore, C: ContentClassifier> {
    store: Arc<S>,
    pipeline: ModerationPipeline<C>,
    reports: ReportCoordinator<S>,
    ledger: ModerationLedger<S>,
}

impl<S: ModerationStore, C: ContentClassifier> ModerationService<S, C> {
    /// Create a new moderation service with the given store and classifier.
    pub fn new(store: S, classifier: C, config: ModerationConfig) -> Self {
        let store = Arc::new(store);
        Self {
            pipeline: ModerationPipeline::new(classifier, config),
            reports: ReportCoordinator::new(Arc::clone(&store)),
            ledger: ModerationLedger::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn reports(&self) -> &ReportCoordinator<S> {
        &self.reports
    }

    pub fn ledger(&self) -> &ModerationLedger<S> {
        &self.ledger
    }

    pub fn config(&self) -> &ModerationConfig {
        self.pipeline.config()
    }

    /// Submit text for moderation.
    ///
    /// The item is persisted as PENDING before the classifier is called, so it
    /// exists even if classification never finishes. Classifier trouble never
    /// fails the submission; the worst case is a FLAGGED item with the fault
    /// preserved in `automated_error`.
    pub async fn submit(&self, author_id: UserId, text: &str) -> Result<ContentItem, ModerationError> {
        if text.trim().is_empty() {
            return Err(ModerationError::Validation(
                "content text is required".to_string(),
            ));
        }

        let item = self
            .store
            .insert_content(NewContent {
                author_id,
                text: text.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(content_id = item.id, author_id, "Content submitted");

        let outcome = self.pipeline.run(&item.text).await;
        let item = self
            .store
            .record_automated_outcome(item.id, &outcome, Utc::now())
            .await?;

        tracing::info!(
            content_id = item.id,
            status = %item.status,
            attempts = item.automated_attempts,
            completed = item.automated_completed,
            "Automated moderation finished"
        );

        Ok(item)
    }

    pub async fn content(&self, id: ContentId) -> Result<ContentItem, ModerationError> {
        self.store
            .get_content(id)
            .await?
            .ok_or_else(|| ModerationError::content_not_found(id))
    }

    pub async fn content_by_status(
        &self,
        status: ContentStatus,
    ) -> Result<Vec<ContentItem>, ModerationError> {
        self.store.list_content(&[status]).await
    }

    /// Everything still owed a human look (PENDING or FLAGGED), with its reports.
    pub async fn moderation_queue(&self) -> Result<Vec<QueueEntry>, ModerationError> {
        let statuses: Vec<ContentStatus> = ContentStatus::ALL
            .into_iter()
            .filter(ContentStatus::needs_review)
            .collect();
        let items = self.store.list_content(&statuses).await?;

        let mut queue = Vec::with_capacity(items.len());
        for content in items {
            let reports = self.reports.for_content(content.id).await?;
            queue.push(QueueEntry { content, reports });
        }
        Ok(queue)
    }

    /// Content visible to ordinary users.
    pub async fn approved_feed(&self) -> Result<Vec<ContentItem>, ModerationError> {
        let statuses: Vec<ContentStatus> = ContentStatus::ALL
            .into_iter()
            .filter(ContentStatus::is_publicly_visible)
            .collect();
        self.store.list_content(&statuses).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
