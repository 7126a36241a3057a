use crate::core::moderation::{
    ContentItem, ContentStatus, ModerationAction, ModeratorActionEntry, MyReport, QueueEntry,
    ReportOutcome, ReportWithContext, UserReportsOverview, VerdictRecord,
};
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedFooter};

/// Entries shown per embed. Discord caps descriptions at 4096 characters.
const MAX_LISTED: usize = 10;
const SNIPPET_CHARS: usize = 120;

pub fn status_emoji(status: ContentStatus) -> &'static str {
    match status {
        ContentStatus::Pending => "⏳",
        ContentStatus::Approved => "✅",
        ContentStatus::Flagged => "🚩",
        ContentStatus::Removed => "🗑️",
    }
}

fn status_color(status: ContentStatus) -> serenity::Color {
    match status {
        ContentStatus::Pending => serenity::Color::from_rgb(255, 165, 0), // Orange
        ContentStatus::Approved => serenity::Color::from_rgb(0, 255, 0),  // Green
        ContentStatus::Flagged => serenity::Color::from_rgb(255, 215, 0), // Gold
        ContentStatus::Removed => serenity::Color::RED,
    }
}

fn outcome_label(outcome: Option<ReportOutcome>) -> &'static str {
    outcome.map(|o| o.as_str()).unwrap_or("-")
}

fn embed_time(at: DateTime<Utc>) -> serenity::Timestamp {
    serenity::Timestamp::from_unix_timestamp(at.timestamp())
        .unwrap_or_else(|_| serenity::Timestamp::now())
}

fn relative(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

/// Shorten to `max` characters on a char boundary, collapsing newlines.
pub fn snippet(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn content_line(item: &ContentItem) -> String {
    format!(
        "{} **#{}** by <@{}> {}\n> {}",
        status_emoji(item.status),
        item.id,
        item.author_id,
        relative(item.created_at),
        snippet(&item.text, SNIPPET_CHARS)
    )
}

fn more_footer(total: usize) -> Option<CreateEmbedFooter> {
    (total > MAX_LISTED)
        .then(|| CreateEmbedFooter::new(format!("Showing {} of {}", MAX_LISTED, total)))
}

fn with_footer(embed: CreateEmbed, total: usize) -> CreateEmbed {
    match more_footer(total) {
        Some(footer) => embed.footer(footer),
        None => embed,
    }
}

/// Full view of one content item, automated phase included.
pub fn content_embed(item: &ContentItem) -> CreateEmbed {
    let automated = if item.automated_completed {
        format!(
            "Classified after {} attempt(s): {}",
            item.automated_attempts,
            if item.automated_flagged {
                "unsafe"
            } else {
                "safe"
            }
        )
    } else if item.automated_attempts > 0 {
        format!(
            "Classifier unavailable after {} attempt(s), sent to review",
            item.automated_attempts
        )
    } else {
        "Not run yet".to_string()
    };

    let mut embed = CreateEmbed::default()
        .title(format!("Content #{}", item.id))
        .description(snippet(&item.text, 1000))
        .color(status_color(item.status))
        .field(
            "Status",
            format!("{} {}", status_emoji(item.status), item.status),
            true,
        )
        .field("Author", format!("<@{}>", item.author_id), true)
        .field("Automated Review", automated, false);

    if !item.automated_reason.is_empty() {
        embed = embed.field(
            "Classifier Reason",
            snippet(&item.automated_reason, 500),
            false,
        );
    }
    if !item.automated_error.is_empty() {
        embed = embed.field("Last Error", snippet(&item.automated_error, 500), false);
    }

    embed.timestamp(embed_time(item.created_at))
}

pub fn feed_embed(items: &[ContentItem]) -> CreateEmbed {
    let description = if items.is_empty() {
        "Nothing approved yet.".to_string()
    } else {
        items
            .iter()
            .take(MAX_LISTED)
            .map(content_line)
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    with_footer(
        CreateEmbed::default()
            .title("📰 Approved Content")
            .description(description)
            .color(serenity::Color::from_rgb(0, 255, 0)),
        items.len(),
    )
}

pub fn queue_embed(queue: &[QueueEntry]) -> CreateEmbed {
    let description = if queue.is_empty() {
        "The queue is empty. 🎉".to_string()
    } else {
        queue
            .iter()
            .take(MAX_LISTED)
            .map(|entry| {
                let reports = entry.reports.len();
                let reasons = entry
                    .reports
                    .iter()
                    .take(3)
                    .map(|r| snippet(&r.reason, 40))
                    .collect::<Vec<_>>()
                    .join("; ");
                if reports == 0 {
                    content_line(&entry.content)
                } else {
                    format!(
                        "{}\n📣 {} report(s): {}",
                        content_line(&entry.content),
                        reports,
                        reasons
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    with_footer(
        CreateEmbed::default()
            .title("🛡️ Moderation Queue")
            .description(description)
            .color(serenity::Color::from_rgb(255, 165, 0)),
        queue.len(),
    )
}

pub fn verdict_embed(record: &VerdictRecord) -> CreateEmbed {
    let content = &record.content;
    CreateEmbed::default()
        .title(format!(
            "{} {} on Content #{}",
            status_emoji(content.status),
            record.action.action,
            content.id
        ))
        .description(snippet(&content.text, 500))
        .color(status_color(content.status))
        .field("New Status", content.status.to_string(), true)
        .field("Moderator", format!("<@{}>", record.action.moderator_id), true)
        .field(
            "Reports Resolved",
            record.resolved_reports.len().to_string(),
            true,
        )
        .footer(CreateEmbedFooter::new(format!(
            "Action ID: {}",
            record.action.id
        )))
        .timestamp(embed_time(record.action.created_at))
}

pub fn history_embed(content: &ContentItem, actions: &[ModerationAction]) -> CreateEmbed {
    let description = if actions.is_empty() {
        "No moderator has acted on this content.".to_string()
    } else {
        actions
            .iter()
            .take(MAX_LISTED)
            .map(|a| {
                format!(
                    "**{}** by <@{}> {}",
                    a.action,
                    a.moderator_id,
                    relative(a.created_at)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    with_footer(
        CreateEmbed::default()
            .title(format!("📜 History of Content #{}", content.id))
            .description(description)
            .color(status_color(content.status))
            .field(
                "Current Status",
                format!("{} {}", status_emoji(content.status), content.status),
                false,
            ),
        actions.len(),
    )
}

pub fn moderator_actions_embed(entries: &[ModeratorActionEntry]) -> CreateEmbed {
    let description = if entries.is_empty() {
        "No actions recorded.".to_string()
    } else {
        entries
            .iter()
            .take(MAX_LISTED)
            .map(|e| {
                format!(
                    "**{}** #{} {} (now {} {})\n> {}",
                    e.action.action,
                    e.content.id,
                    relative(e.action.created_at),
                    status_emoji(e.content.status),
                    e.content.status,
                    snippet(&e.content.text, 80)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    with_footer(
        CreateEmbed::default()
            .title("🧾 Your Moderation Actions")
            .description(description)
            .color(serenity::Color::BLURPLE),
        entries.len(),
    )
}

pub fn report_line(entry: &ReportWithContext) -> String {
    let mut line = format!(
        "**Report #{}** on #{} by <@{}> ({}, {})\n> {}",
        entry.report.id,
        entry.content.id,
        entry.report.user_id,
        entry.report.status,
        outcome_label(entry.report.moderator_action),
        snippet(&entry.report.reason, 80)
    );
    if let Some(action) = &entry.latest_action {
        line.push_str(&format!(
            "\nLatest action: **{}** by <@{}>",
            action.action, action.moderator_id
        ));
    }
    line
}

pub fn reports_embed(title: &str, reports: &[ReportWithContext]) -> CreateEmbed {
    let description = if reports.is_empty() {
        "No reports found.".to_string()
    } else {
        reports
            .iter()
            .take(MAX_LISTED)
            .map(report_line)
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    with_footer(
        CreateEmbed::default()
            .title(title)
            .description(description)
            .color(serenity::Color::BLURPLE),
        reports.len(),
    )
}

pub fn user_reports_embed(overview: &UserReportsOverview) -> CreateEmbed {
    let summary = &overview.summary;
    reports_embed(
        &format!("📣 Reports filed by user {}", overview.user_id),
        &overview.reports,
    )
    .field("Total", overview.total_reports.to_string(), true)
    .field("Pending", summary.pending.to_string(), true)
    .field("Reviewed", summary.reviewed.to_string(), true)
    .field(
        "Content Outcome",
        format!(
            "✅ {} approved • 🗑️ {} removed • 🚩 {} flagged",
            summary.content_approved, summary.content_removed, summary.content_flagged
        ),
        false,
    )
}

pub fn my_reports_embed(reports: &[MyReport]) -> CreateEmbed {
    let description = if reports.is_empty() {
        "You haven't reported anything.".to_string()
    } else {
        reports
            .iter()
            .take(MAX_LISTED)
            .map(|r| {
                let reviewed = r
                    .reviewed_at
                    .map(|at| format!(", reviewed {}", relative(at)))
                    .unwrap_or_default();
                format!(
                    "**Report #{}** on #{} ({}, {}{})\n> {}\nReason: {}",
                    r.report_id,
                    r.content_id,
                    r.status,
                    outcome_label(r.moderator_action),
                    reviewed,
                    snippet(&r.content_text, 80),
                    snippet(&r.reason, 80)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    with_footer(
        CreateEmbed::default()
            .title("📣 Your Reports")
            .description(description)
            .color(serenity::Color::BLURPLE),
        reports.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{Report, ReportStatus, VerdictAction};

    fn item() -> ContentItem {
        let now = Utc::now();
        ContentItem {
            id: 3,
            author_id: 10,
            text: "hello\nworld".to_string(),
            status: ContentStatus::Removed,
            automated_attempts: 1,
            automated_completed: true,
            automated_flagged: false,
            automated_error: String::new(),
            automated_reason: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("a\n\nb   c", 10), "a b c");

        let cut = snippet("ééééééééééé", 5);
        assert_eq!(cut.chars().count(), 5);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_report_line_shows_outcome_and_latest_action() {
        let now = Utc::now();
        let entry = ReportWithContext {
            report: Report {
                id: 8,
                content_id: 3,
                user_id: 20,
                reason: "spam".to_string(),
                status: ReportStatus::Reviewed,
                moderator_action: Some(ReportOutcome::Removed),
                reviewed_at: Some(now),
                created_at: now,
            },
            content: item(),
            latest_action: Some(ModerationAction {
                id: 1,
                content_id: 3,
                moderator_id: 30,
                action: VerdictAction::Remove,
                created_at: now,
            }),
        };

        let line = report_line(&entry);
        assert!(line.contains("Report #8"));
        assert!(line.contains("REVIEWED"));
        assert!(line.contains("REMOVED"));
        assert!(line.contains("**REMOVE** by <@30>"));
    }

    #[test]
    fn test_open_report_has_no_outcome() {
        assert_eq!(outcome_label(None), "-");
        assert_eq!(outcome_label(Some(ReportOutcome::Warned)), "WARNED");
    }
}
