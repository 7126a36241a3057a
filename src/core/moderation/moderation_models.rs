// Moderation domain models - content items, reports, and the action ledger.
//
// These are pure domain types with no Discord dependencies.
// Every enum here serializes to the exact uppercase vocabulary that is
// persisted and shown to clients, so they round-trip through storage unchanged.

use super::moderation_store::ModerationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub type ContentId = i64;
pub type ReportId = i64;
pub type ActionId = i64;
/// Actor ids come straight from the identity layer (Discord user ids).
pub type UserId = u64;

/// Number of classifier calls the pipeline makes before falling back to FLAGGED.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

// ============================================================================
// ENUMERATIONS
// ============================================================================

/// Lifecycle status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    /// An outcome is owed, either automated or human.
    Pending,
    Approved,
    Flagged,
    Removed,
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 4] = [
        ContentStatus::Pending,
        ContentStatus::Approved,
        ContentStatus::Flagged,
        ContentStatus::Removed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Pending => "PENDING",
            ContentStatus::Approved => "APPROVED",
            ContentStatus::Flagged => "FLAGGED",
            ContentStatus::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ModerationError::Validation(format!("unknown content status '{s}'")))
    }
}

/// A human moderator's verdict. Stored in verb form on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictAction {
    Approve,
    Warn,
    Remove,
}

impl VerdictAction {
    pub const ALL: [VerdictAction; 3] = [
        VerdictAction::Approve,
        VerdictAction::Warn,
        VerdictAction::Remove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictAction::Approve => "APPROVE",
            VerdictAction::Warn => "WARN",
            VerdictAction::Remove => "REMOVE",
        }
    }

    /// Status the content item takes once this verdict lands.
    ///
    /// A WARN neither approves nor removes: the item goes back to FLAGGED.
    pub fn resulting_status(&self) -> ContentStatus {
        match self {
            VerdictAction::Approve => ContentStatus::Approved,
            VerdictAction::Warn => ContentStatus::Flagged,
            VerdictAction::Remove => ContentStatus::Removed,
        }
    }

    /// Adjective form stamped onto resolved reports.
    pub fn report_outcome(&self) -> ReportOutcome {
        match self {
            VerdictAction::Approve => ReportOutcome::Approved,
            VerdictAction::Warn => ReportOutcome::Warned,
            VerdictAction::Remove => ReportOutcome::Removed,
        }
    }

    /// Parse a ledger filter given in either vocabulary.
    ///
    /// Moderators browse their history with the adjective labels they see on
    /// reports (`APPROVED`, `WARNED`, `REMOVED`) while the ledger stores verbs,
    /// so both spellings are accepted and translated explicitly.
    pub fn parse_filter(s: &str) -> Result<Self, ModerationError> {
        let s = s.trim();
        s.parse::<VerdictAction>()
            .or_else(|_| s.parse::<ReportOutcome>().map(|outcome| outcome.verdict()))
            .map_err(|_| ModerationError::Validation(format!("unknown action filter '{s}'")))
    }
}

impl fmt::Display for VerdictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictAction {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VerdictAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ModerationError::Validation(format!("unknown moderator action '{s}'")))
    }
}

/// Review status of a user report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Reviewed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Reviewed => "REVIEWED",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReportStatus::Pending),
            "REVIEWED" => Ok(ReportStatus::Reviewed),
            other => Err(ModerationError::Validation(format!(
                "unknown report status '{other}'"
            ))),
        }
    }
}

/// Display form of a verdict, as recorded on reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportOutcome {
    Approved,
    Removed,
    Warned,
}

impl ReportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportOutcome::Approved => "APPROVED",
            ReportOutcome::Removed => "REMOVED",
            ReportOutcome::Warned => "WARNED",
        }
    }

    /// Inverse of [`VerdictAction::report_outcome`].
    pub fn verdict(&self) -> VerdictAction {
        match self {
            ReportOutcome::Approved => VerdictAction::Approve,
            ReportOutcome::Removed => VerdictAction::Remove,
            ReportOutcome::Warned => VerdictAction::Warn,
        }
    }
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportOutcome {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(ReportOutcome::Approved),
            "REMOVED" => Ok(ReportOutcome::Removed),
            "WARNED" => Ok(ReportOutcome::Warned),
            other => Err(ModerationError::Validation(format!(
                "unknown report outcome '{other}'"
            ))),
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// One unit of user-submitted text subject to moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ContentId,
    pub author_id: UserId,
    pub text: String,
    pub status: ContentStatus,
    /// Classifier calls spent on this item.
    pub automated_attempts: u32,
    /// True once the classifier returned a verdict (false after a give-up).
    pub automated_completed: bool,
    /// True if the automated outcome was unsafe or inconclusive.
    pub automated_flagged: bool,
    /// Last transient classifier failure, or empty.
    pub automated_error: String,
    /// Classifier's short explanation for its verdict, or empty.
    pub automated_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-filed complaint against a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub content_id: ContentId,
    pub user_id: UserId,
    pub reason: String,
    pub status: ReportStatus,
    pub moderator_action: Option<ReportOutcome>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit row for a human verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationAction {
    pub id: ActionId,
    pub content_id: ContentId,
    pub moderator_id: UserId,
    pub action: VerdictAction,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// WRITE COMMANDS
// ============================================================================
// What the core asks the store to apply. Each one is a single atomic unit.

#[derive(Debug, Clone)]
pub struct NewContent {
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub content_id: ContentId,
    pub user_id: UserId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Terminal result of the automated phase, written once per submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomatedOutcome {
    pub status: ContentStatus,
    pub attempts: u32,
    pub completed: bool,
    pub flagged: bool,
    pub error: String,
    pub reason: String,
}

/// Stamp applied to every PENDING report of a content item when a verdict lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportResolution {
    pub moderator_action: Option<ReportOutcome>,
    pub reviewed_at: DateTime<Utc>,
}

/// Everything one moderator verdict writes: ledger row, content status, report resolutions.
#[derive(Debug, Clone)]
pub struct VerdictWrite {
    pub content_id: ContentId,
    pub moderator_id: UserId,
    pub action: VerdictAction,
    pub new_status: ContentStatus,
    pub resolution: ReportResolution,
    pub decided_at: DateTime<Utc>,
}

/// Result of an applied verdict, consistent as of one logical instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRecord {
    pub content: ContentItem,
    pub action: ModerationAction,
    pub resolved_reports: Vec<Report>,
}

// ============================================================================
// READ PROJECTIONS
// ============================================================================

/// Filter for report listings. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub user_id: Option<UserId>,
    pub content_id: Option<ContentId>,
}

/// A content item waiting on a moderator, with the complaints against it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub content: ContentItem,
    pub reports: Vec<Report>,
}

/// A report seen alongside the current state of its content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWithContext {
    pub report: Report,
    pub content: ContentItem,
    pub latest_action: Option<ModerationAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReportSummary {
    pub pending: usize,
    pub reviewed: usize,
    pub content_approved: usize,
    pub content_removed: usize,
    pub content_flagged: usize,
}

/// Moderator view of everything one user has reported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReportsOverview {
    pub user_id: UserId,
    pub reports: Vec<ReportWithContext>,
    pub total_reports: usize,
    pub summary: UserReportSummary,
}

/// Reporter's own view of a report they filed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyReport {
    pub report_id: ReportId,
    pub content_id: ContentId,
    pub content_text: String,
    pub reason: String,
    pub status: ReportStatus,
    pub moderator_action: Option<ReportOutcome>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A ledger row joined with the content it acted on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorActionEntry {
    pub action: ModerationAction,
    pub content: ContentItem,
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Settings for the automated classification pipeline.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Maximum classifier calls per submission.
    pub max_retries: u32,
    /// Upper bound on a single classifier call.
    pub classifier_timeout: Duration,
    /// Pause between failed attempts. Zero means retry immediately.
    pub retry_delay: Duration,
    /// Randomize the pause by ±30%.
    pub retry_jitter: bool,
}

impl ModerationConfig {
    /// Attempts the pipeline will actually make; never less than one.
    pub fn attempt_budget(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            classifier_timeout: Duration::from_secs(15),
            retry_delay: Duration::ZERO,
            retry_jitter: false,
        }
    }
}
