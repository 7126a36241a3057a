// Member-facing commands: submit text, browse approved content, report it.

use super::formatter;
use super::or_reply;
use crate::discord::{Context, Error};

/// Submit text for moderation.
///
/// The text is checked automatically right away; anything the checker
/// cannot clear goes to the moderators.
#[poise::command(slash_command, guild_only)]
pub async fn submit(
    ctx: Context<'_>,
    #[description = "Text to publish"] text: String,
) -> Result<(), Error> {
    // Classification can take a few seconds with retries
    ctx.defer().await?;

    let author_id = ctx.author().id.get();
    let result = ctx.data().moderation.submit(author_id, &text).await;
    let Some(item) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(poise::CreateReply::default().embed(formatter::content_embed(&item)))
        .await?;
    Ok(())
}

/// Show approved content, newest first.
#[poise::command(slash_command, guild_only)]
pub async fn feed(ctx: Context<'_>) -> Result<(), Error> {
    let result = ctx.data().moderation.approved_feed().await;
    let Some(items) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(poise::CreateReply::default().embed(formatter::feed_embed(&items)))
        .await?;
    Ok(())
}

/// Look up a content item by ID.
#[poise::command(slash_command, guild_only)]
pub async fn content(
    ctx: Context<'_>,
    #[description = "Content ID"] content_id: i64,
) -> Result<(), Error> {
    let result = ctx.data().moderation.content(content_id).await;
    let Some(item) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(poise::CreateReply::default().embed(formatter::content_embed(&item)))
        .await?;
    Ok(())
}

/// Report content to the moderators.
///
/// **Command syntax:** `/report 12 spam link`
#[poise::command(slash_command, guild_only)]
pub async fn report(
    ctx: Context<'_>,
    #[description = "Content ID"] content_id: i64,
    #[description = "What's wrong with it?"] reason: String,
) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let result = ctx
        .data()
        .moderation
        .reports()
        .file(content_id, user_id, &reason)
        .await;
    let Some(report) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "📣 Thanks! Report #{} on content #{} was sent to the moderators.",
                report.id, report.content_id
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Show the reports you have filed and what came of them.
#[poise::command(slash_command, guild_only)]
pub async fn myreports(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let result = ctx.data().moderation.reports().mine(user_id).await;
    let Some(reports) = or_reply(ctx, result).await? else {
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(formatter::my_reports_embed(&reports))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
