// Report coordinator - user complaints against content items.
//
// Filing a report always sends its content back to PENDING.
// When a moderator verdict lands, every PENDING report of that content is
// resolved with the verdict's display label inside the verdict's own unit of
// work (see `ModerationLedger::record_verdict`). REVIEWED reports are history
// and are never rewritten.

use super::content_state::Transition;
use super::moderation_models::{
    ContentId, ContentItem, ContentStatus, ModerationAction, MyReport, NewReport, Report,
    ReportFilter, ReportId, ReportResolution, ReportStatus, ReportWithContext, UserId,
    UserReportSummary, UserReportsOverview, VerdictAction,
};
use super::moderation_store::{ModerationError, ModerationStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ReportCoordinator<S: ModerationStore> {
    store: Arc<S>,
}

impl<S: ModerationStore> ReportCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// File a report against existing content and force the content to PENDING.
    ///
    /// Repeated reports by the same user are not deduplicated.
    pub async fn file(
        &self,
        content_id: ContentId,
        user_id: UserId,
        reason: &str,
    ) -> Result<Report, ModerationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ModerationError::Validation(
                "a report needs a reason".to_string(),
            ));
        }

        let new = NewReport {
            content_id,
            user_id,
            reason: reason.to_string(),
            created_at: Utc::now(),
        };
        let forced = Transition::Reported.target();
        let (report, content) = self.store.file_report(new, forced).await?;

        tracing::info!(
            report_id = report.id,
            content_id,
            user_id,
            content_status = %content.status,
            "Report filed, content sent for review"
        );

        Ok(report)
    }

    /// Stamp for resolving every open report of a content item under `action`.
    ///
    /// The store applies it to PENDING reports only, in the same transaction
    /// as the ledger row and status change.
    pub fn resolve_all_for_content(
        action: VerdictAction,
        reviewed_at: DateTime<Utc>,
    ) -> ReportResolution {
        ReportResolution {
            moderator_action: Some(action.report_outcome()),
            reviewed_at,
        }
    }

    /// Close one report without a verdict. Already REVIEWED reports come back unchanged.
    pub async fn mark_reviewed(&self, report_id: ReportId) -> Result<Report, ModerationError> {
        let report = self
            .store
            .mark_report_reviewed(report_id, Utc::now())
            .await?;
        tracing::info!(report_id, content_id = report.content_id, "Report marked reviewed");
        Ok(report)
    }

    pub async fn get(&self, report_id: ReportId) -> Result<Report, ModerationError> {
        self.store
            .get_report(report_id)
            .await?
            .ok_or_else(|| ModerationError::report_not_found(report_id))
    }

    /// Reports for a single content item, newest first.
    pub async fn for_content(&self, content_id: ContentId) -> Result<Vec<Report>, ModerationError> {
        self.store
            .list_reports(&ReportFilter {
                content_id: Some(content_id),
                ..Default::default()
            })
            .await
    }

    /// Reports whose content is currently PENDING, i.e. the user-reported queue.
    pub async fn open_reports(
        &self,
        status: Option<ReportStatus>,
    ) -> Result<Vec<ReportWithContext>, ModerationError> {
        let reports = self
            .store
            .list_reports(&ReportFilter {
                status,
                ..Default::default()
            })
            .await?;

        let contexts = self.with_context(reports).await?;
        Ok(contexts
            .into_iter()
            .filter(|ctx| ctx.content.status == ContentStatus::Pending)
            .collect())
    }

    /// Reports whose content has already settled on `status`.
    ///
    /// PENDING is rejected: those reports are still open, see [`Self::open_reports`].
    pub async fn by_content_status(
        &self,
        status: ContentStatus,
    ) -> Result<Vec<ReportWithContext>, ModerationError> {
        if !status.is_terminal() {
            return Err(ModerationError::Validation(format!(
                "reports can only be listed for settled content, not {status}"
            )));
        }

        let reports = self.store.list_reports(&ReportFilter::default()).await?;
        let contexts = self.with_context(reports).await?;
        Ok(contexts
            .into_iter()
            .filter(|ctx| ctx.content.status == status)
            .collect())
    }

    /// Moderator view of everything a user has reported, with a status summary.
    pub async fn by_user(&self, user_id: UserId) -> Result<UserReportsOverview, ModerationError> {
        let reports = self
            .store
            .list_reports(&ReportFilter {
                user_id: Some(user_id),
                ..Default::default()
            })
            .await?;
        let reports = self.with_context(reports).await?;

        let mut summary = UserReportSummary::default();
        for ctx in &reports {
            match ctx.report.status {
                ReportStatus::Pending => summary.pending += 1,
                ReportStatus::Reviewed => summary.reviewed += 1,
            }
            match ctx.content.status {
                ContentStatus::Approved => summary.content_approved += 1,
                ContentStatus::Removed => summary.content_removed += 1,
                ContentStatus::Flagged => summary.content_flagged += 1,
                ContentStatus::Pending => {}
            }
        }

        Ok(UserReportsOverview {
            user_id,
            total_reports: reports.len(),
            reports,
            summary,
        })
    }

    /// Reporter's own reports, with the verdict label once reviewed.
    pub async fn mine(&self, user_id: UserId) -> Result<Vec<MyReport>, ModerationError> {
        let reports = self
            .store
            .list_reports(&ReportFilter {
                user_id: Some(user_id),
                ..Default::default()
            })
            .await?;
        let contexts = self.with_context(reports).await?;

        Ok(contexts
            .into_iter()
            .map(|ctx| MyReport {
                report_id: ctx.report.id,
                content_id: ctx.content.id,
                content_text: ctx.content.text,
                reason: ctx.report.reason,
                status: ctx.report.status,
                moderator_action: ctx.report.moderator_action,
                reviewed_at: ctx.report.reviewed_at,
                created_at: ctx.report.created_at,
            })
            .collect())
    }

    /// Join reports with their content and latest ledger row.
    async fn with_context(
        &self,
        reports: Vec<Report>,
    ) -> Result<Vec<ReportWithContext>, ModerationError> {
        let mut cache: HashMap<ContentId, (ContentItem, Option<ModerationAction>)> =
            HashMap::new();
        let mut out = Vec::with_capacity(reports.len());

        for report in reports {
            if !cache.contains_key(&report.content_id) {
                let content = self
                    .store
                    .get_content(report.content_id)
                    .await?
                    .ok_or_else(|| ModerationError::content_not_found(report.content_id))?;
                let latest = self
                    .store
                    .list_actions_for_content(report.content_id)
                    .await?
                    .into_iter()
                    .next();
                cache.insert(report.content_id, (content, latest));
            }

            if let Some((content, latest_action)) = cache.get(&report.content_id) {
                out.push(ReportWithContext {
                    report,
                    content: content.clone(),
                    latest_action: latest_action.clone(),
                });
            }
        }

        Ok(out)
    }
}

// ============================================================================
// TESTS
// ============================================================================
