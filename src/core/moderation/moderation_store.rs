// Storage port for the moderation workflow.
//
// The core decides WHAT to write (status mapping, report resolution stamp);
// a store only applies it. Every mutating method here is one atomic unit of
// work: either all of its rows change or none do.

use super::moderation_models::{
    AutomatedOutcome, ContentId, ContentItem, ContentStatus, ModerationAction, NewContent,
    NewReport, Report, ReportFilter, ReportId, UserId, VerdictAction, VerdictRecord, VerdictWrite,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Missing or empty field, unknown enum value. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity does not exist. Nothing was written.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ModerationError {
    pub fn content_not_found(id: ContentId) -> Self {
        ModerationError::NotFound { kind: "content", id }
    }

    pub fn report_not_found(id: ReportId) -> Self {
        ModerationError::NotFound { kind: "report", id }
    }

    /// Errors the caller caused, as opposed to infrastructure trouble.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ModerationError::Validation(_) | ModerationError::NotFound { .. }
        )
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Durable store for content items, reports, and the moderation ledger.
///
/// Listings are newest first (by creation time, then id).
#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// Persist a fresh item: PENDING, no attempts, automated phase not completed.
    async fn insert_content(&self, new: NewContent) -> Result<ContentItem, ModerationError>;

    /// Single terminal write of the automated phase.
    ///
    /// The automated fields are always stored. The status stays PENDING while
    /// the item has any PENDING report, so a report filed mid-classification
    /// is not overwritten.
    async fn record_automated_outcome(
        &self,
        content_id: ContentId,
        outcome: &AutomatedOutcome,
        at: DateTime<Utc>,
    ) -> Result<ContentItem, ModerationError>;

    /// Insert a PENDING report and move its content to `forced_status`, atomically.
    ///
    /// Fails with `NotFound` (and writes nothing) if the content does not exist.
    async fn file_report(
        &self,
        new: NewReport,
        forced_status: ContentStatus,
    ) -> Result<(Report, ContentItem), ModerationError>;

    /// Append the ledger row, set the content status, and stamp every PENDING
    /// report of the content with the resolution, atomically.
    ///
    /// Reports already REVIEWED are left untouched.
    async fn apply_verdict(&self, write: VerdictWrite) -> Result<VerdictRecord, ModerationError>;

    /// Move one PENDING report to REVIEWED without a verdict.
    /// A report that is already REVIEWED is returned unchanged.
    async fn mark_report_reviewed(
        &self,
        report_id: ReportId,
        at: DateTime<Utc>,
    ) -> Result<Report, ModerationError>;

    async fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>, ModerationError>;

    /// Content whose status is any of `statuses`.
    async fn list_content(
        &self,
        statuses: &[ContentStatus],
    ) -> Result<Vec<ContentItem>, ModerationError>;

    async fn get_report(&self, id: ReportId) -> Result<Option<Report>, ModerationError>;

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, ModerationError>;

    async fn list_actions_for_content(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ModerationAction>, ModerationError>;

    async fn list_actions_by_moderator(
        &self,
        moderator_id: UserId,
        action: Option<VerdictAction>,
    ) -> Result<Vec<ModerationAction>, ModerationError>;
}
