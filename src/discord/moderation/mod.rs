// Moderation commands.
//
// `content_commands` is what every member can do (submit, browse, report).
// `commands` is the moderator surface, gated on MANAGE_MESSAGES.

pub mod commands;
pub mod content_commands;
pub mod formatter;

use crate::core::moderation::ModerationError;
use crate::discord::{Context, Error};

/// Unwrap a core result, or tell the user what they got wrong.
///
/// Client errors (bad input, unknown ids) become an ephemeral reply and
/// `Ok(None)`. Storage trouble is passed up to poise's error handler.
pub(crate) async fn or_reply<T>(
    ctx: Context<'_>,
    result: Result<T, ModerationError>,
) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_client_error() => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ {}", e))
                    .ephemeral(true),
            )
            .await?;
            Ok(None)
        }
        Err(e) => {
            tracing::error!("Moderation command failed: {}", e);
            Err(e.into())
        }
    }
}
