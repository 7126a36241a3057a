// In-memory implementation of ModerationStore.
//
// Each content item lives in its own arena together with its reports and
// ledger rows. A DashMap entry guard on that arena is the transaction: the
// three-entity verdict update happens under one guard, so no reader can see
// the status changed without the matching reports and ledger row. Different
// content items never contend on a shared lock.

use crate::core::moderation::{
    AutomatedOutcome, ContentId, ContentItem, ContentStatus, ModerationAction, ModerationError,
    ModerationStore, NewContent, NewReport, Report, ReportFilter, ReportId, ReportStatus, UserId,
    VerdictAction, VerdictRecord, VerdictWrite,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Everything owned by one content item.
#[derive(Clone, Debug)]
struct ContentArena {
    item: ContentItem,
    reports: Vec<Report>,
    actions: Vec<ModerationAction>,
}

pub struct InMemoryModerationStore {
    /// content id -> arena
    arenas: DashMap<ContentId, ContentArena>,
    /// report id -> owning content id
    report_index: DashMap<ReportId, ContentId>,
    next_content_id: AtomicI64,
    next_report_id: AtomicI64,
    next_action_id: AtomicI64,
}

impl InMemoryModerationStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            arenas: DashMap::new(),
            report_index: DashMap::new(),
            next_content_id: AtomicI64::new(0),
            next_report_id: AtomicI64::new(0),
            next_action_id: AtomicI64::new(0),
        }
    }

    fn next_id(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for InMemoryModerationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest first, ties broken by id.
fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl ModerationStore for InMemoryModerationStore {
    async fn insert_content(&self, new: NewContent) -> Result<ContentItem, ModerationError> {
        let item = ContentItem {
            id: Self::next_id(&self.next_content_id),
            author_id: new.author_id,
            text: new.text,
            status: ContentStatus::Pending,
            automated_attempts: 0,
            automated_completed: false,
            automated_flagged: false,
            automated_error: String::new(),
            automated_reason: String::new(),
            created_at: new.created_at,
            updated_at: new.created_at,
        };

        self.arenas.insert(
            item.id,
            ContentArena {
                item: item.clone(),
                reports: Vec::new(),
                actions: Vec::new(),
            },
        );
        Ok(item)
    }

    async fn record_automated_outcome(
        &self,
        content_id: ContentId,
        outcome: &AutomatedOutcome,
        at: DateTime<Utc>,
    ) -> Result<ContentItem, ModerationError> {
        let mut arena = self
            .arenas
            .get_mut(&content_id)
            .ok_or_else(|| ModerationError::content_not_found(content_id))?;

        let has_open_reports = arena
            .reports
            .iter()
            .any(|report| report.status == ReportStatus::Pending);

        let item = &mut arena.item;
        item.status = outcome.settled_status(has_open_reports);
        item.automated_attempts = outcome.attempts;
        item.automated_completed = outcome.completed;
        item.automated_flagged = outcome.flagged;
        item.automated_error = outcome.error.clone();
        item.automated_reason = outcome.reason.clone();
        item.updated_at = at;

        Ok(item.clone())
    }

    async fn file_report(
        &self,
        new: NewReport,
        forced_status: ContentStatus,
    ) -> Result<(Report, ContentItem), ModerationError> {
        let mut arena = self
            .arenas
            .get_mut(&new.content_id)
            .ok_or_else(|| ModerationError::content_not_found(new.content_id))?;

        let report = Report {
            id: Self::next_id(&self.next_report_id),
            content_id: new.content_id,
            user_id: new.user_id,
            reason: new.reason,
            status: ReportStatus::Pending,
            moderator_action: None,
            reviewed_at: None,
            created_at: new.created_at,
        };

        arena.reports.push(report.clone());
        if arena.item.status != forced_status {
            arena.item.status = forced_status;
            arena.item.updated_at = new.created_at;
        }
        self.report_index.insert(report.id, report.content_id);

        Ok((report, arena.item.clone()))
    }

    async fn apply_verdict(&self, write: VerdictWrite) -> Result<VerdictRecord, ModerationError> {
        let mut arena = self
            .arenas
            .get_mut(&write.content_id)
            .ok_or_else(|| ModerationError::content_not_found(write.content_id))?;

        let action = ModerationAction {
            id: Self::next_id(&self.next_action_id),
            content_id: write.content_id,
            moderator_id: write.moderator_id,
            action: write.action,
            created_at: write.decided_at,
        };
        arena.actions.push(action.clone());

        arena.item.status = write.new_status;
        arena.item.updated_at = write.decided_at;

        let mut resolved_reports = Vec::new();
        for report in arena
            .reports
            .iter_mut()
            .filter(|r| r.status == ReportStatus::Pending)
        {
            report.status = ReportStatus::Reviewed;
            report.moderator_action = write.resolution.moderator_action;
            report.reviewed_at = Some(write.resolution.reviewed_at);
            resolved_reports.push(report.clone());
        }

        Ok(VerdictRecord {
            content: arena.item.clone(),
            action,
            resolved_reports,
        })
    }

    async fn mark_report_reviewed(
        &self,
        report_id: ReportId,
        at: DateTime<Utc>,
    ) -> Result<Report, ModerationError> {
        let content_id = self
            .report_index
            .get(&report_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| ModerationError::report_not_found(report_id))?;

        let mut arena = self
            .arenas
            .get_mut(&content_id)
            .ok_or_else(|| ModerationError::content_not_found(content_id))?;
        let report = arena
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| ModerationError::report_not_found(report_id))?;

        if report.status == ReportStatus::Pending {
            report.status = ReportStatus::Reviewed;
            report.reviewed_at = Some(at);
        }
        Ok(report.clone())
    }

    async fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>, ModerationError> {
        Ok(self.arenas.get(&id).map(|arena| arena.item.clone()))
    }

    async fn list_content(
        &self,
        statuses: &[ContentStatus],
    ) -> Result<Vec<ContentItem>, ModerationError> {
        let mut items: Vec<ContentItem> = self
            .arenas
            .iter()
            .filter(|arena| statuses.contains(&arena.item.status))
            .map(|arena| arena.item.clone())
            .collect();
        newest_first(&mut items, |item| (item.created_at, item.id));
        Ok(items)
    }

    async fn get_report(&self, id: ReportId) -> Result<Option<Report>, ModerationError> {
        let Some(content_id) = self.report_index.get(&id).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self
            .arenas
            .get(&content_id)
            .and_then(|arena| arena.reports.iter().find(|r| r.id == id).cloned()))
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, ModerationError> {
        let mut reports: Vec<Report> = self
            .arenas
            .iter()
            .filter(|arena| filter.content_id.map_or(true, |id| arena.item.id == id))
            .flat_map(|arena| arena.reports.clone())
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.user_id.map_or(true, |u| r.user_id == u))
            .collect();
        newest_first(&mut reports, |r| (r.created_at, r.id));
        Ok(reports)
    }

    async fn list_actions_for_content(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ModerationAction>, ModerationError> {
        let mut actions = self
            .arenas
            .get(&content_id)
            .map(|arena| arena.actions.clone())
            .unwrap_or_default();
        newest_first(&mut actions, |a| (a.created_at, a.id));
        Ok(actions)
    }

    async fn list_actions_by_moderator(
        &self,
        moderator_id: UserId,
        action: Option<VerdictAction>,
    ) -> Result<Vec<ModerationAction>, ModerationError> {
        let mut actions: Vec<ModerationAction> = self
            .arenas
            .iter()
            .flat_map(|arena| arena.actions.clone())
            .filter(|a| a.moderator_id == moderator_id)
            .filter(|a| action.map_or(true, |kind| a.action == kind))
            .collect();
        newest_first(&mut actions, |a| (a.created_at, a.id));
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{ReportOutcome, ReportResolution};
    use std::sync::Arc;

    fn new_content(text: &str) -> NewContent {
        NewContent {
            author_id: 1,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    fn new_report(content_id: ContentId, user_id: UserId) -> NewReport {
        NewReport {
            content_id,
            user_id,
            reason: "spam".to_string(),
            created_at: Utc::now(),
        }
    }

    fn remove_verdict(content_id: ContentId) -> VerdictWrite {
        let now = Utc::now();
        VerdictWrite {
            content_id,
            moderator_id: 9,
            action: VerdictAction::Remove,
            new_status: ContentStatus::Removed,
            resolution: ReportResolution {
                moderator_action: Some(ReportOutcome::Removed),
                reviewed_at: now,
            },
            decided_at: now,
        }
    }

    #[tokio::test]
    async fn test_new_content_starts_pending() {
        let store = InMemoryModerationStore::new();
        let item = store.insert_content(new_content("hi")).await.unwrap();

        assert_eq!(item.id, 1);
        assert_eq!(item.status, ContentStatus::Pending);
        assert_eq!(item.automated_attempts, 0);
        assert!(!item.automated_completed);
        assert_eq!(store.get_content(1).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn test_verdict_resolves_reports_in_same_write() {
        let store = InMemoryModerationStore::new();
        let item = store.insert_content(new_content("hi")).await.unwrap();
        store
            .file_report(new_report(item.id, 2), ContentStatus::Pending)
            .await
            .unwrap();
        store
            .file_report(new_report(item.id, 3), ContentStatus::Pending)
            .await
            .unwrap();

        let record = store.apply_verdict(remove_verdict(item.id)).await.unwrap();

        assert_eq!(record.content.status, ContentStatus::Removed);
        assert_eq!(record.resolved_reports.len(), 2);
        let reports = store.list_reports(&ReportFilter::default()).await.unwrap();
        assert!(reports.iter().all(|r| r.status == ReportStatus::Reviewed));
    }

    #[tokio::test]
    async fn test_report_filed_during_classification_survives() {
        let store = InMemoryModerationStore::new();
        let item = store.insert_content(new_content("hi")).await.unwrap();
        store
            .file_report(new_report(item.id, 2), ContentStatus::Pending)
            .await
            .unwrap();

        let outcome = AutomatedOutcome::classified(1, true, "fine".into(), String::new());
        let updated = store
            .record_automated_outcome(item.id, &outcome, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.status, ContentStatus::Pending);
        assert!(updated.automated_completed);
        assert_eq!(updated.automated_attempts, 1);
        assert_eq!(updated.automated_reason, "fine");

        // Once the report is resolved, the next outcome applies normally
        store.apply_verdict(remove_verdict(item.id)).await.unwrap();
        let updated = store
            .record_automated_outcome(item.id, &outcome, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.status, ContentStatus::Approved);
    }

    #[tokio::test]
    async fn test_missing_content_writes_nothing() {
        let store = InMemoryModerationStore::new();

        let err = store
            .file_report(new_report(5, 2), ContentStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { .. }));
        let err = store.apply_verdict(remove_verdict(5)).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { .. }));

        assert!(store.report_index.is_empty());
        assert!(store
            .list_actions_by_moderator(9, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_verdicts_all_reach_the_ledger() {
        let store = Arc::new(InMemoryModerationStore::new());
        let content_id = store.insert_content(new_content("hot")).await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.apply_verdict(remove_verdict(content_id)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let actions = store.list_actions_for_content(content_id).await.unwrap();
        assert_eq!(actions.len(), 16);
    }

    #[tokio::test]
    async fn test_report_filter() {
        let store = InMemoryModerationStore::new();
        let a = store.insert_content(new_content("a")).await.unwrap();
        let b = store.insert_content(new_content("b")).await.unwrap();
        store
            .file_report(new_report(a.id, 2), ContentStatus::Pending)
            .await
            .unwrap();
        store
            .file_report(new_report(b.id, 2), ContentStatus::Pending)
            .await
            .unwrap();
        store
            .file_report(new_report(b.id, 3), ContentStatus::Pending)
            .await
            .unwrap();

        let by_user = ReportFilter {
            user_id: Some(2),
            ..Default::default()
        };
        assert_eq!(store.list_reports(&by_user).await.unwrap().len(), 2);

        let by_content = ReportFilter {
            content_id: Some(b.id),
            ..Default::default()
        };
        let reports = store.list_reports(&by_content).await.unwrap();
        assert_eq!(reports.len(), 2);
        // Newest first
        assert!(reports[0].id > reports[1].id);
    }
}
