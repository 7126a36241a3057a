// Discord layer - slash commands over the moderation workflow.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::moderation::ModerationService;
use crate::infra::classifier::GeminiClassifier;
use crate::infra::moderation::SqliteModerationStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub moderation: Arc<ModerationService<SqliteModerationStore, GeminiClassifier>>,
}
