// SQLite-backed moderation store.
//
// Tables:
// - content_items: Submitted text, current status, automated outcome
// - reports: User complaints, resolved by moderator verdicts
// - moderation_actions: Append-only ledger of verdicts
//
// Every multi-row write runs inside one transaction. Returning early with an
// error drops the transaction, which rolls it back.
//
// The first statement of each write transaction is itself a write, so the
// transaction holds SQLite's write lock before it reads anything. A deferred
// transaction that reads first cannot upgrade later and fails with
// SQLITE_BUSY instead of waiting; starting with the write lets the busy
// timeout queue concurrent writers on the same item.

use crate::core::moderation::{
    AutomatedOutcome, ContentId, ContentItem, ContentStatus, ModerationAction, ModerationError,
    ModerationStore, NewContent, NewReport, Report, ReportFilter, ReportId, ReportOutcome,
    ReportStatus, UserId,
    VerdictAction, VerdictRecord, VerdictWrite,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// How long a writer waits for the lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const CONTENT_COLUMNS: &str = "id, author_id, text, status, automated_attempts, \
     automated_completed, automated_flagged, automated_error, automated_reason, \
     created_at, updated_at";
const REPORT_COLUMNS: &str =
    "id, content_id, user_id, reason, status, moderator_action, reviewed_at, created_at";
const ACTION_COLUMNS: &str = "id, content_id, moderator_id, action, created_at";

pub struct SqliteModerationStore {
    pool: SqlitePool,
}

fn storage(e: sqlx::Error) -> ModerationError {
    ModerationError::StorageError(e.to_string())
}

impl SqliteModerationStore {
    /// Open (or create) the database file and run migrations.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}?mode=rwc", database_path);
        let options = SqliteConnectOptions::from_str(&connection_string)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, used by tests.
    ///
    /// Every SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                automated_attempts INTEGER NOT NULL DEFAULT 0,
                automated_completed BOOLEAN NOT NULL DEFAULT 0,
                automated_flagged BOOLEAN NOT NULL DEFAULT 0,
                automated_error TEXT NOT NULL DEFAULT '',
                automated_reason TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_content_items_status
                ON content_items(status, created_at DESC);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id INTEGER NOT NULL REFERENCES content_items(id),
                user_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                moderator_action TEXT,
                reviewed_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_reports_content_status
                ON reports(content_id, status);
            CREATE INDEX IF NOT EXISTS idx_reports_user
                ON reports(user_id, created_at DESC);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id INTEGER NOT NULL REFERENCES content_items(id),
                moderator_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_moderation_actions_content
                ON moderation_actions(content_id, created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_moderation_actions_moderator
                ON moderation_actions(moderator_id, action, created_at DESC);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_time(raw: &str) -> Result<DateTime<Utc>, ModerationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ModerationError::StorageError(format!("bad timestamp '{raw}': {e}")))
}

/// Enum columns hold contract strings; anything else is a corrupt row, not bad input.
fn parse_column<T: std::str::FromStr<Err = ModerationError>>(
    raw: &str,
) -> Result<T, ModerationError> {
    raw.parse::<T>()
        .map_err(|e| ModerationError::StorageError(format!("corrupt row: {e}")))
}

fn row_to_content(row: &SqliteRow) -> Result<ContentItem, ModerationError> {
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(ContentItem {
        id: row.get("id"),
        author_id: row.get::<i64, _>("author_id") as u64,
        text: row.get("text"),
        status: parse_column(&status)?,
        automated_attempts: row.get::<i64, _>("automated_attempts") as u32,
        automated_completed: row.get("automated_completed"),
        automated_flagged: row.get("automated_flagged"),
        automated_error: row.get("automated_error"),
        automated_reason: row.get("automated_reason"),
        created_at: parse_time(&created_at)?,
        updated_at: parse_time(&updated_at)?,
    })
}

fn row_to_report(row: &SqliteRow) -> Result<Report, ModerationError> {
    let status: String = row.get("status");
    let moderator_action: Option<String> = row.get("moderator_action");
    let reviewed_at: Option<String> = row.get("reviewed_at");
    let created_at: String = row.get("created_at");

    Ok(Report {
        id: row.get("id"),
        content_id: row.get("content_id"),
        user_id: row.get::<i64, _>("user_id") as u64,
        reason: row.get("reason"),
        status: parse_column(&status)?,
        moderator_action: moderator_action
            .as_deref()
            .map(parse_column::<ReportOutcome>)
            .transpose()?,
        reviewed_at: reviewed_at.as_deref().map(parse_time).transpose()?,
        created_at: parse_time(&created_at)?,
    })
}

fn row_to_action(row: &SqliteRow) -> Result<ModerationAction, ModerationError> {
    let action: String = row.get("action");
    let created_at: String = row.get("created_at");

    Ok(ModerationAction {
        id: row.get("id"),
        content_id: row.get("content_id"),
        moderator_id: row.get::<i64, _>("moderator_id") as u64,
        action: parse_column(&action)?,
        created_at: parse_time(&created_at)?,
    })
}

// These take a bare connection so they work both on the pool and inside a transaction.

async fn fetch_content(
    conn: &mut SqliteConnection,
    id: ContentId,
) -> Result<Option<ContentItem>, ModerationError> {
    let row = sqlx::query(&format!(
        "SELECT {CONTENT_COLUMNS} FROM content_items WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage)?;

    row.as_ref().map(row_to_content).transpose()
}

async fn fetch_report(
    conn: &mut SqliteConnection,
    id: ReportId,
) -> Result<Option<Report>, ModerationError> {
    let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage)?;

    row.as_ref().map(row_to_report).transpose()
}

#[async_trait]
impl ModerationStore for SqliteModerationStore {
    async fn insert_content(&self, new: NewContent) -> Result<ContentItem, ModerationError> {
        let created_at = new.created_at.to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO content_items (author_id, text, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.author_id as i64)
        .bind(&new.text)
        .bind(ContentStatus::Pending.as_str())
        .bind(&created_at)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(ContentItem {
            id: result.last_insert_rowid(),
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
        })
    }

    async fn record_automated_outcome(
        &self,
        content_id: ContentId,
        outcome: &AutomatedOutcome,
        at: DateTime<Utc>,
    ) -> Result<ContentItem, ModerationError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let result = sqlx::query(
            r#"
            UPDATE content_items SET
                status = CASE
                    WHEN EXISTS (
                        SELECT 1 FROM reports WHERE content_id = content_items.id AND status = ?
                    ) THEN ?
                    ELSE ?
                END,
                automated_attempts = ?,
                automated_completed = ?,
                automated_flagged = ?,
                automated_error = ?,
                automated_reason = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(ReportStatus::Pending.as_str())
        .bind(ContentStatus::Pending.as_str())
        .bind(outcome.status.as_str())
        .bind(outcome.attempts as i64)
        .bind(outcome.completed)
        .bind(outcome.flagged)
        .bind(&outcome.error)
        .bind(&outcome.reason)
        .bind(at.to_rfc3339())
        .bind(content_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(ModerationError::content_not_found(content_id));
        }

        let item = fetch_content(&mut tx, content_id)
            .await?
            .ok_or_else(|| ModerationError::content_not_found(content_id))?;
        tx.commit().await.map_err(storage)?;
        Ok(item)
    }

    async fn file_report(
        &self,
        new: NewReport,
        forced_status: ContentStatus,
    ) -> Result<(Report, ContentItem), ModerationError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let created_at = new.created_at.to_rfc3339();

        // Write first: takes the lock and doubles as the existence check
        let moved = sqlx::query(
            r#"
            UPDATE content_items
            SET updated_at = CASE WHEN status = ? THEN updated_at ELSE ? END,
                status = ?
            WHERE id = ?
            "#,
        )
        .bind(forced_status.as_str())
        .bind(&created_at)
        .bind(forced_status.as_str())
        .bind(new.content_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        if moved.rows_affected() == 0 {
            return Err(ModerationError::content_not_found(new.content_id));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO reports (content_id, user_id, reason, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.content_id)
        .bind(new.user_id as i64)
        .bind(&new.reason)
        .bind(ReportStatus::Pending.as_str())
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        let report_id = result.last_insert_rowid();

        let content = fetch_content(&mut tx, new.content_id)
            .await?
            .ok_or_else(|| ModerationError::content_not_found(new.content_id))?;
        tx.commit().await.map_err(storage)?;

        let report = Report {
            id: report_id,
            content_id: new.content_id,
            user_id: new.user_id,
            reason: new.reason,
            status: ReportStatus::Pending,
            moderator_action: None,
            reviewed_at: None,
            created_at: new.created_at,
        };
        Ok((report, content))
    }

    async fn apply_verdict(&self, write: VerdictWrite) -> Result<VerdictRecord, ModerationError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let decided_at = write.decided_at.to_rfc3339();

        // 1. Content status. Goes first so the transaction owns the write lock.
        let updated = sqlx::query("UPDATE content_items SET status = ?, updated_at = ? WHERE id = ?")
            .bind(write.new_status.as_str())
            .bind(&decided_at)
            .bind(write.content_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        if updated.rows_affected() == 0 {
            return Err(ModerationError::content_not_found(write.content_id));
        }

        // 2. Ledger row (append-only)
        let result = sqlx::query(
            r#"
            INSERT INTO moderation_actions (content_id, moderator_id, action, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(write.content_id)
        .bind(write.moderator_id as i64)
        .bind(write.action.as_str())
        .bind(&decided_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        let action = ModerationAction {
            id: result.last_insert_rowid(),
            content_id: write.content_id,
            moderator_id: write.moderator_id,
            action: write.action,
            created_at: write.decided_at,
        };

        // 3. Open reports of this cycle
        let pending_rows = sqlx::query(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE content_id = ? AND status = ? ORDER BY id"
        ))
        .bind(write.content_id)
        .bind(ReportStatus::Pending.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(storage)?;
        let mut resolved_reports = pending_rows
            .iter()
            .map(row_to_report)
            .collect::<Result<Vec<_>, _>>()?;

        let moderator_action = write.resolution.moderator_action.map(|a| a.as_str());
        let reviewed_at = write.resolution.reviewed_at.to_rfc3339();
        sqlx::query(
            r#"
            UPDATE reports
            SET status = ?, moderator_action = ?, reviewed_at = ?
            WHERE content_id = ? AND status = ?
            "#,
        )
        .bind(ReportStatus::Reviewed.as_str())
        .bind(moderator_action)
        .bind(&reviewed_at)
        .bind(write.content_id)
        .bind(ReportStatus::Pending.as_str())
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        for report in &mut resolved_reports {
            report.status = ReportStatus::Reviewed;
            report.moderator_action = write.resolution.moderator_action;
            report.reviewed_at = Some(write.resolution.reviewed_at);
        }

        let content = fetch_content(&mut tx, write.content_id)
            .await?
            .ok_or_else(|| ModerationError::content_not_found(write.content_id))?;
        tx.commit().await.map_err(storage)?;

        Ok(VerdictRecord {
            content,
            action,
            resolved_reports,
        })
    }

    async fn mark_report_reviewed(
        &self,
        report_id: ReportId,
        at: DateTime<Utc>,
    ) -> Result<Report, ModerationError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Only a PENDING report moves; a REVIEWED one is history
        sqlx::query("UPDATE reports SET status = ?, reviewed_at = ? WHERE id = ? AND status = ?")
            .bind(ReportStatus::Reviewed.as_str())
            .bind(at.to_rfc3339())
            .bind(report_id)
            .bind(ReportStatus::Pending.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let report = fetch_report(&mut tx, report_id)
            .await?
            .ok_or_else(|| ModerationError::report_not_found(report_id))?;
        tx.commit().await.map_err(storage)?;
        Ok(report)
    }

    async fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>, ModerationError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        fetch_content(&mut conn, id).await
    }

    async fn list_content(
        &self,
        statuses: &[ContentStatus],
    ) -> Result<Vec<ContentItem>, ModerationError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {CONTENT_COLUMNS} FROM content_items WHERE status IN ("
        ));
        let mut separated = query.separated(", ");
        for status in statuses {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(") ORDER BY created_at DESC, id DESC");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.iter().map(row_to_content).collect()
    }

    async fn get_report(&self, id: ReportId) -> Result<Option<Report>, ModerationError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        fetch_report(&mut conn, id).await
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, ModerationError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {REPORT_COLUMNS} FROM reports WHERE 1 = 1"));
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id as i64);
        }
        if let Some(content_id) = filter.content_id {
            query.push(" AND content_id = ").push_bind(content_id);
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.iter().map(row_to_report).collect()
    }

    async fn list_actions_for_content(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ModerationAction>, ModerationError> {
        let rows = sqlx::query(&format!(
            "SELECT {ACTION_COLUMNS} FROM moderation_actions \
             WHERE content_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(content_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_action).collect()
    }

    async fn list_actions_by_moderator(
        &self,
        moderator_id: UserId,
        action: Option<VerdictAction>,
    ) -> Result<Vec<ModerationAction>, ModerationError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ACTION_COLUMNS} FROM moderation_actions WHERE moderator_id = "
        ));
        query.push_bind(moderator_id as i64);
        if let Some(action) = action {
            query.push(" AND action = ").push_bind(action.as_str());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.iter().map(row_to_action).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::ReportResolution;

    async fn store() -> SqliteModerationStore {
        SqliteModerationStore::in_memory().await.unwrap()
    }

    async fn seed(store: &SqliteModerationStore, text: &str) -> ContentItem {
        store
            .insert_content(NewContent {
                author_id: 42,
                text: text.to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    async fn report(store: &SqliteModerationStore, content_id: ContentId, user_id: UserId) -> Report {
        store
            .file_report(
                NewReport {
                    content_id,
                    user_id,
                    reason: "spam".to_string(),
                    created_at: Utc::now(),
                },
                ContentStatus::Pending,
            )
            .await
            .unwrap()
            .0
    }

    fn verdict(content_id: ContentId, action: VerdictAction) -> VerdictWrite {
        let now = Utc::now();
        VerdictWrite {
            content_id,
            moderator_id: 7,
            action,
            new_status: action.resulting_status(),
            resolution: ReportResolution {
                moderator_action: Some(action.report_outcome()),
                reviewed_at: now,
            },
            decided_at: now,
        }
    }

    #[tokio::test]
    async fn test_automated_outcome_round_trip() {
        let store = store().await;
        let item = seed(&store, "hello world").await;

        let outcome = AutomatedOutcome {
            status: ContentStatus::Flagged,
            attempts: 3,
            completed: false,
            flagged: true,
            error: "classifier timed out".to_string(),
            reason: String::new(),
        };
        let updated = store
            .record_automated_outcome(item.id, &outcome, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.status, ContentStatus::Flagged);
        assert_eq!(updated.automated_attempts, 3);
        assert!(!updated.automated_completed);
        assert!(updated.automated_flagged);
        assert_eq!(updated.automated_error, "classifier timed out");
        assert_eq!(store.get_content(item.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_report_forces_pending() {
        let store = store().await;
        let item = seed(&store, "hello").await;
        store
            .apply_verdict(verdict(item.id, VerdictAction::Approve))
            .await
            .unwrap();

        let filed = report(&store, item.id, 5).await;
        assert_eq!(filed.status, ReportStatus::Pending);

        let item = store.get_content(item.id).await.unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Pending);
    }

    #[tokio::test]
    async fn test_verdict_is_one_consistent_write() {
        let store = store().await;
        let item = seed(&store, "hello").await;

        let old = report(&store, item.id, 5).await;
        store
            .apply_verdict(verdict(item.id, VerdictAction::Approve))
            .await
            .unwrap();
        let a = report(&store, item.id, 6).await;
        let b = report(&store, item.id, 7).await;

        let record = store
            .apply_verdict(verdict(item.id, VerdictAction::Remove))
            .await
            .unwrap();

        assert_eq!(record.content.status, ContentStatus::Removed);
        assert_eq!(record.action.action, VerdictAction::Remove);
        let resolved: Vec<ReportId> = record.resolved_reports.iter().map(|r| r.id).collect();
        assert_eq!(resolved, vec![a.id, b.id]);

        for id in [a.id, b.id] {
            let r = store.get_report(id).await.unwrap().unwrap();
            assert_eq!(r.status, ReportStatus::Reviewed);
            assert_eq!(r.moderator_action, Some(ReportOutcome::Removed));
            assert!(r.reviewed_at.is_some());
        }
        let old = store.get_report(old.id).await.unwrap().unwrap();
        assert_eq!(old.moderator_action, Some(ReportOutcome::Approved));

        let history = store.list_actions_for_content(item.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, VerdictAction::Remove);
    }

    #[tokio::test]
    async fn test_missing_content_rolls_back() {
        let store = store().await;

        let err = store
            .apply_verdict(verdict(999, VerdictAction::Warn))
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { .. }));
        assert!(store
            .list_actions_by_moderator(7, None)
            .await
            .unwrap()
            .is_empty());

        let err = store
            .file_report(
                NewReport {
                    content_id: 999,
                    user_id: 1,
                    reason: "spam".to_string(),
                    created_at: Utc::now(),
                },
                ContentStatus::Pending,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { .. }));
        assert!(store
            .list_reports(&ReportFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_listing_filters() {
        let store = store().await;
        let a = seed(&store, "a").await;
        let b = seed(&store, "b").await;
        report(&store, a.id, 1).await;
        report(&store, b.id, 1).await;
        report(&store, b.id, 2).await;
        store
            .apply_verdict(verdict(a.id, VerdictAction::Warn))
            .await
            .unwrap();

        let flagged = store.list_content(&[ContentStatus::Flagged]).await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, a.id);

        let both = store
            .list_content(&[ContentStatus::Flagged, ContentStatus::Pending])
            .await
            .unwrap();
        assert_eq!(both.len(), 2);

        let pending_for_user = store
            .list_reports(&ReportFilter {
                status: Some(ReportStatus::Pending),
                user_id: Some(1),
                content_id: None,
            })
            .await
            .unwrap();
        assert_eq!(pending_for_user.len(), 1);
        assert_eq!(pending_for_user[0].content_id, b.id);

        let warns = store
            .list_actions_by_moderator(7, Some(VerdictAction::Warn))
            .await
            .unwrap();
        assert_eq!(warns.len(), 1);
        assert!(store
            .list_actions_by_moderator(7, Some(VerdictAction::Approve))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_mark_reviewed_keeps_history() {
        let store = store().await;
        let item = seed(&store, "x").await;
        let filed = report(&store, item.id, 3).await;
        store
            .apply_verdict(verdict(item.id, VerdictAction::Warn))
            .await
            .unwrap();

        let again = store
            .mark_report_reviewed(filed.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(again.moderator_action, Some(ReportOutcome::Warned));

        let err = store
            .mark_report_reviewed(12345, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { kind: "report", .. }));
    }

    #[tokio::test]
    async fn test_file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moderation.db");
        let path = path.to_str().unwrap();

        let id = {
            let store = SqliteModerationStore::new(path).await.unwrap();
            seed(&store, "durable").await.id
        };

        let reopened = SqliteModerationStore::new(path).await.unwrap();
        let item = reopened.get_content(id).await.unwrap().unwrap();
        assert_eq!(item.text, "durable");
        assert_eq!(item.status, ContentStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_one_item_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moderation.db");
        let store = std::sync::Arc::new(
            SqliteModerationStore::new(path.to_str().unwrap())
                .await
                .unwrap(),
        );
        let content_id = seed(&store, "hot").await.id;

        let mut handles = Vec::new();
        for i in 0..8u64 {
            let reporter = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                reporter
                    .file_report(
                        NewReport {
                            content_id,
                            user_id: 100 + i,
                            reason: "spam".to_string(),
                            created_at: Utc::now(),
                        },
                        ContentStatus::Pending,
                    )
                    .await
                    .map(|_| ())
            }));
            let verdicter = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                verdicter
                    .apply_verdict(verdict(content_id, VerdictAction::Remove))
                    .await
                    .map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let actions = store.list_actions_for_content(content_id).await.unwrap();
        assert_eq!(actions.len(), 8);
        let reports = store
            .list_reports(&ReportFilter {
                content_id: Some(content_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(reports.len(), 8);
    }

    #[tokio::test]
    async fn test_automated_outcome_keeps_reported_item_pending() {
        let store = store().await;
        let item = seed(&store, "reported mid-classification").await;
        report(&store, item.id, 9).await;

        let outcome = AutomatedOutcome::classified(1, true, "fine".into(), String::new());
        let updated = store
            .record_automated_outcome(item.id, &outcome, Utc::now())
            .await
            .unwrap();

        // The classifier's result is kept, but the open report still owns the status
        assert_eq!(updated.status, ContentStatus::Pending);
        assert!(updated.automated_completed);
        assert_eq!(updated.automated_attempts, 1);
        assert_eq!(updated.automated_reason, "fine");

        let pending = store.list_content(&[ContentStatus::Pending]).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_automated_outcome_applies_after_reports_resolved() {
        let store = store().await;
        let item = seed(&store, "x").await;
        report(&store, item.id, 9).await;
        store
            .apply_verdict(verdict(item.id, VerdictAction::Approve))
            .await
            .unwrap();

        let outcome = AutomatedOutcome::classified(2, false, "abusive".into(), String::new());
        let updated = store
            .record_automated_outcome(item.id, &outcome, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.status, ContentStatus::Flagged);
    }
}
