// Content state machine.
//
//   PENDING --automated--> APPROVED | FLAGGED
//   PENDING | APPROVED | FLAGGED | REMOVED --verdict--> APPROVED | FLAGGED | REMOVED
//   any --report--> PENDING
//
// An automated outcome landing while a report is still open leaves the item
// PENDING; the report outranks the classifier.
//
// PENDING is never terminal: it always means someone still owes an outcome.
// Last writer wins; there is no merge of concurrent transitions.

use super::moderation_models::{AutomatedOutcome, ContentStatus, VerdictAction};

/// Something that moves a content item to a new status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition<'a> {
    Automated(&'a AutomatedOutcome),
    Reported,
    Verdict(VerdictAction),
}

impl Transition<'_> {
    /// Status reached by this transition. No transition depends on the source status.
    pub fn target(&self) -> ContentStatus {
        match self {
            Transition::Automated(outcome) => outcome.status,
            // A fresh complaint always deserves a fresh look, even if already PENDING
            Transition::Reported => ContentStatus::Pending,
            Transition::Verdict(action) => action.resulting_status(),
        }
    }
}

impl ContentStatus {
    /// Whether this status closes the current review cycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ContentStatus::Pending)
    }

    /// Statuses a moderator still has to look at.
    pub fn needs_review(&self) -> bool {
        matches!(self, ContentStatus::Pending | ContentStatus::Flagged)
    }

    /// Only approved content appears in ordinary feeds.
    pub fn is_publicly_visible(&self) -> bool {
        matches!(self, ContentStatus::Approved)
    }
}

impl AutomatedOutcome {
    /// The classifier answered on attempt `attempts`.
    pub fn classified(attempts: u32, safe: bool, reason: String, last_error: String) -> Self {
        Self {
            status: if safe {
                ContentStatus::Approved
            } else {
                ContentStatus::Flagged
            },
            attempts,
            completed: true,
            flagged: !safe,
            error: last_error,
            reason,
        }
    }

    /// Status stored for this outcome. A report filed while the classifier was
    /// still running keeps the item in the review queue.
    pub fn settled_status(&self, has_open_reports: bool) -> ContentStatus {
        if has_open_reports {
            Transition::Reported.target()
        } else {
            Transition::Automated(self).target()
        }
    }

    /// Every attempt failed. Uncertain content is routed to human review, never approved.
    pub fn gave_up(attempts: u32, last_error: String) -> Self {
        let error = if last_error.trim().is_empty() {
            "classifier unavailable".to_string()
        } else {
            last_error
        };

        Self {
            status: ContentStatus::Flagged,
            attempts,
            completed: false,
            flagged: true,
            error,
            reason: String::new(),
        }
    }
}
