// Moderation action ledger - append-only history of human verdicts.
//
// Recording a verdict is one atomic unit: ledger row, content status, and the
// resolution of every open report commit together or not at all.

use super::content_state::Transition;
use super::moderation_models::{
    ContentId, ModerationAction, ModeratorActionEntry, UserId, VerdictAction, VerdictRecord,
    VerdictWrite,
};
use super::moderation_store::{ModerationError, ModerationStore};
use super::report_coordinator::ReportCoordinator;
use chrono::Utc;
use std::sync::Arc;

pub struct ModerationLedger<S: ModerationStore> {
    store: Arc<S>,
}

impl<S: ModerationStore> ModerationLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record a moderator verdict and propagate it to content and open reports.
    pub async fn record_verdict(
        &self,
        content_id: ContentId,
        moderator_id: UserId,
        action: VerdictAction,
    ) -> Result<VerdictRecord, ModerationError> {
        let decided_at = Utc::now();
        let write = VerdictWrite {
            content_id,
            moderator_id,
            action,
            new_status: Transition::Verdict(action).target(),
            resolution: ReportCoordinator::<S>::resolve_all_for_content(action, decided_at),
            decided_at,
        };

        let record = self.store.apply_verdict(write).await?;

        tracing::info!(
            content_id,
            moderator_id,
            action = %action,
            status = %record.content.status,
            resolved_reports = record.resolved_reports.len(),
            "Moderator verdict recorded"
        );

        Ok(record)
    }

    /// Verdicts for one content item, newest first.
    pub async fn history_for_content(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ModerationAction>, ModerationError> {
        if self.store.get_content(content_id).await?.is_none() {
            return Err(ModerationError::content_not_found(content_id));
        }
        self.store.list_actions_for_content(content_id).await
    }

    /// A moderator's own verdicts, newest first, optionally narrowed to one kind.
    ///
    /// The filter may use either the verb (`REMOVE`) or the report label (`REMOVED`).
    pub async fn actions_by_moderator(
        &self,
        moderator_id: UserId,
        filter: Option<&str>,
    ) -> Result<Vec<ModeratorActionEntry>, ModerationError> {
        let action = match filter.map(str::trim).filter(|f| !f.is_empty()) {
            Some(raw) => Some(VerdictAction::parse_filter(raw)?),
            None => None,
        };

        let actions = self
            .store
            .list_actions_by_moderator(moderator_id, action)
            .await?;

        let mut entries = Vec::with_capacity(actions.len());
        for action in actions {
            let content = self
                .store
                .get_content(action.content_id)
                .await?
                .ok_or_else(|| ModerationError::content_not_found(action.content_id))?;
            entries.push(ModeratorActionEntry { action, content });
        }
        Ok(entries)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::{
        ContentItem, ContentStatus, NewContent, ReportOutcome, ReportStatus,
    };
    use crate::infra::moderation::InMemoryModerationStore;

    struct Fixture {
        store: Arc<InMemoryModerationStore>,
        reports: ReportCoordinator<InMemoryModerationStore>,
        ledger: ModerationLedger<InMemoryModerationStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryModerationStore::new());
            Self {
                reports: ReportCoordinator::new(Arc::clone(&store)),
                ledger: ModerationLedger::new(Arc::clone(&store)),
                store,
            }
        }

        async fn content(&self, text: &str) -> ContentItem {
            self.store
                .insert_content(NewContent {
                    author_id: 1,
                    text: text.to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_remove_resolves_open_reports_only() {
        let fx = Fixture::new();
        let content = fx.content("questionable").await;

        // A prior cycle: reported, then approved
        let old = fx.reports.file(content.id, 5, "first complaint").await.unwrap();
        fx.ledger
            .record_verdict(content.id, 99, VerdictAction::Approve)
            .await
            .unwrap();

        // New cycle with two open reports
        let a = fx.reports.file(content.id, 6, "spam").await.unwrap();
        let b = fx.reports.file(content.id, 7, "spam again").await.unwrap();

        let record = fx
            .ledger
            .record_verdict(content.id, 99, VerdictAction::Remove)
            .await
            .unwrap();

        assert_eq!(record.content.status, ContentStatus::Removed);
        assert_eq!(record.action.action, VerdictAction::Remove);
        assert_eq!(record.resolved_reports.len(), 2);

        for id in [a.id, b.id] {
            let report = fx.reports.get(id).await.unwrap();
            assert_eq!(report.status, ReportStatus::Reviewed);
            assert_eq!(report.moderator_action, Some(ReportOutcome::Removed));
            assert!(report.reviewed_at.is_some());
        }

        // The earlier cycle's report keeps its original verdict
        let old = fx.reports.get(old.id).await.unwrap();
        assert_eq!(old.moderator_action, Some(ReportOutcome::Approved));
    }

    #[tokio::test]
    async fn test_warn_returns_content_to_flagged() {
        let fx = Fixture::new();
        let content = fx.content("borderline").await;
        let report = fx.reports.file(content.id, 5, "rude").await.unwrap();

        let record = fx
            .ledger
            .record_verdict(content.id, 99, VerdictAction::Warn)
            .await
            .unwrap();

        assert_eq!(record.content.status, ContentStatus::Flagged);
        let report = fx.reports.get(report.id).await.unwrap();
        assert_eq!(report.moderator_action, Some(ReportOutcome::Warned));
    }

    #[tokio::test]
    async fn test_last_verdict_wins_and_ledger_keeps_both() {
        let fx = Fixture::new();
        let content = fx.content("text").await;

        let first = fx
            .ledger
            .record_verdict(content.id, 99, VerdictAction::Approve)
            .await
            .unwrap();
        let second = fx
            .ledger
            .record_verdict(content.id, 98, VerdictAction::Remove)
            .await
            .unwrap();

        assert_eq!(second.content.status, ContentStatus::Removed);

        let history = fx.ledger.history_for_content(content.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], second.action);
        assert_eq!(history[1], first.action);
    }

    #[tokio::test]
    async fn test_invalid_or_missing_target_writes_nothing() {
        let fx = Fixture::new();
        let content = fx.content("text").await;
        fx.reports.file(content.id, 5, "spam").await.unwrap();

        let err = fx
            .ledger
            .record_verdict(12345, 99, VerdictAction::Remove)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { .. }));

        assert!(fx.ledger.history_for_content(content.id).await.unwrap().is_empty());
        let reports = fx.reports.for_content(content.id).await.unwrap();
        assert!(reports.iter().all(|r| r.status == ReportStatus::Pending));
        let content = fx.store.get_content(content.id).await.unwrap().unwrap();
        assert_eq!(content.status, ContentStatus::Pending);
    }

    #[tokio::test]
    async fn test_moderator_history_filters_by_either_vocabulary() {
        let fx = Fixture::new();
        let a = fx.content("a").await;
        let b = fx.content("b").await;

        fx.ledger
            .record_verdict(a.id, 99, VerdictAction::Remove)
            .await
            .unwrap();
        fx.ledger
            .record_verdict(b.id, 99, VerdictAction::Approve)
            .await
            .unwrap();
        fx.ledger
            .record_verdict(b.id, 42, VerdictAction::Remove)
            .await
            .unwrap();

        let all = fx.ledger.actions_by_moderator(99, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let removed = fx
            .ledger
            .actions_by_moderator(99, Some("REMOVED"))
            .await
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].content.id, a.id);

        let removed_verb = fx
            .ledger
            .actions_by_moderator(99, Some("REMOVE"))
            .await
            .unwrap();
        assert_eq!(removed_verb.len(), 1);

        let err = fx
            .ledger
            .actions_by_moderator(99, Some("DELETED"))
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_history_for_missing_content_is_not_found() {
        let fx = Fixture::new();
        let err = fx.ledger.history_for_content(77).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { kind: "content", id: 77 }));
    }
}
