// Moderator slash commands.
//
// Everything here sits under `/moderate` and requires MANAGE_MESSAGES,
// which is how this bot defines a moderator.

use super::formatter;
use super::or_reply;
use crate::core::moderation::{ContentStatus, ModerationError, ReportStatus, VerdictAction};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum VerdictChoice {
    Approve,
    Warn,
    Remove,
}

impl From<VerdictChoice> for VerdictAction {
    fn from(value: VerdictChoice) -> Self {
        match value {
            VerdictChoice::Approve => VerdictAction::Approve,
            VerdictChoice::Warn => VerdictAction::Warn,
            VerdictChoice::Remove => VerdictAction::Remove,
        }
    }
}

/// Statuses a review cycle can end on. PENDING reports are listed by `/moderate reports`.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SettledStatusChoice {
    Approved,
    Flagged,
    Removed,
}

impl From<SettledStatusChoice> for ContentStatus {
    fn from(value: SettledStatusChoice) -> Self {
        match value {
            SettledStatusChoice::Approved => ContentStatus::Approved,
            SettledStatusChoice::Flagged => ContentStatus::Flagged,
            SettledStatusChoice::Removed => ContentStatus::Removed,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ReportStatusChoice {
    Pending,
    Reviewed,
}

impl From<ReportStatusChoice> for ReportStatus {
    fn from(value: ReportStatusChoice) -> Self {
        match value {
            ReportStatusChoice::Pending => ReportStatus::Pending,
            ReportStatusChoice::Reviewed => ReportStatus::Reviewed,
        }
    }
}

/// Moderator tools.
#[poise::command(
    slash_command,
    subcommands(
        "queue",
        "verdict",
        "history",
        "myactions",
        "reports",
        "settled",
        "userreports",
        "dismiss"
    ),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn moderate(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - subcommands do the work
    Ok(())
}

/// Show content waiting for review (pending or flagged), newest first.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn queue(ctx: Context<'_>) -> Result<(), Error> {
    let result = ctx.data().moderation.moderation_queue().await;
    let Some(queue) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(poise::CreateReply::default().embed(formatter::queue_embed(&queue)))
        .await?;
    Ok(())
}

/// Approve, warn, or remove a content item. Resolves all its open reports.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn verdict(
    ctx: Context<'_>,
    #[description = "Content ID"] content_id: i64,
    #[description = "Decision"] action: VerdictChoice,
) -> Result<(), Error> {
    let moderator_id = ctx.author().id.get();
    let result = ctx
        .data()
        .moderation
        .ledger()
        .record_verdict(content_id, moderator_id, action.into())
        .await;
    let Some(record) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(poise::CreateReply::default().embed(formatter::verdict_embed(&record)))
        .await?;
    Ok(())
}

/// Every verdict recorded on a content item, newest first.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Content ID"] content_id: i64,
) -> Result<(), Error> {
    let moderation = &ctx.data().moderation;
    let result = async {
        let content = moderation.content(content_id).await?;
        let actions = moderation.ledger().history_for_content(content_id).await?;
        Ok::<_, ModerationError>((content, actions))
    }
    .await;
    let Some((content, actions)) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default().embed(formatter::history_embed(&content, &actions)),
    )
    .await?;
    Ok(())
}

/// Your own verdicts. Filter accepts APPROVE/WARN/REMOVE or APPROVED/WARNED/REMOVED.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn myactions(
    ctx: Context<'_>,
    #[description = "Only this kind of action"] filter: Option<String>,
) -> Result<(), Error> {
    let moderator_id = ctx.author().id.get();
    let filter = filter.map(|f| f.to_uppercase());
    let result = ctx
        .data()
        .moderation
        .ledger()
        .actions_by_moderator(moderator_id, filter.as_deref())
        .await;
    let Some(entries) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(formatter::moderator_actions_embed(&entries))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Reports against content that is still waiting for a decision.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn reports(
    ctx: Context<'_>,
    #[description = "Report status (default: all)"] status: Option<ReportStatusChoice>,
) -> Result<(), Error> {
    let result = ctx
        .data()
        .moderation
        .reports()
        .open_reports(status.map(Into::into))
        .await;
    let Some(reports) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(formatter::reports_embed("📣 Open Reports", &reports)),
    )
    .await?;
    Ok(())
}

/// Reports whose content has been approved, flagged, or removed.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn settled(
    ctx: Context<'_>,
    #[description = "Settled content status"] status: SettledStatusChoice,
) -> Result<(), Error> {
    let status: ContentStatus = status.into();
    let result = ctx
        .data()
        .moderation
        .reports()
        .by_content_status(status)
        .await;
    let Some(reports) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    let title = format!("📣 Reports on {} Content", status);
    ctx.send(poise::CreateReply::default().embed(formatter::reports_embed(&title, &reports)))
        .await?;
    Ok(())
}

/// Everything a member has reported, with a summary of outcomes.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn userreports(
    ctx: Context<'_>,
    #[description = "Member to look up"] user: serenity::User,
) -> Result<(), Error> {
    let result = ctx.data().moderation.reports().by_user(user.id.get()).await;
    let Some(overview) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(formatter::user_reports_embed(&overview))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Mark a single report reviewed without ruling on the content.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn dismiss(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: i64,
) -> Result<(), Error> {
    let result = ctx
        .data()
        .moderation
        .reports()
        .mark_reviewed(report_id)
        .await;
    let Some(report) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.say(format!(
        "✅ Report #{} on content #{} is {}.",
        report.id, report.content_id, report.status
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_choices_are_all_terminal() {
        for choice in [
            SettledStatusChoice::Approved,
            SettledStatusChoice::Flagged,
            SettledStatusChoice::Removed,
        ] {
            assert!(ContentStatus::from(choice).is_terminal());
        }
    }
}
