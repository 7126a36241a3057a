// This is the entry point of the content moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases, APIs)
// - `discord/` = Discord-specific adapters (commands)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::{ModerationConfig, ModerationService, DEFAULT_MAX_RETRIES};
use crate::discord::moderation::{commands, content_commands};
use crate::discord::{Data, Error};
use crate::infra::classifier::gemini_classifier::DEFAULT_MODEL;
use crate::infra::classifier::GeminiClassifier;
use crate::infra::moderation::SqliteModerationStore;
use poise::serenity_prelude as serenity;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Read an optional numeric setting, falling back (with a warning) on junk.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn moderation_config_from_env() -> ModerationConfig {
    let retry_delay_ms: u64 = env_or("MODERATION_RETRY_DELAY_MS", 0);

    ModerationConfig {
        max_retries: env_or("MODERATION_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        classifier_timeout: Duration::from_secs(env_or("MODERATION_CLASSIFIER_TIMEOUT_SECS", 15)),
        retry_delay: Duration::from_millis(retry_delay_ms),
        retry_jitter: retry_delay_ms > 0,
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );
    let gemini_api_key = std::env::var("GEMINI_API_KEY")
        .expect("Missing GEMINI_API_KEY environment variable!");
    let gemini_model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let db_path = std::env::var("MODERATION_DB_PATH")
        .unwrap_or_else(|_| "data/moderation.db".to_string());
    if let Some(parent) = Path::new(&db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .expect("Failed to create data directory for SQLite files");
    }

    let config = moderation_config_from_env();
    if config.max_retries == 0 {
        tracing::warn!("MODERATION_MAX_RETRIES=0 is clamped to one attempt");
    }
    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let store = SqliteModerationStore::new(&db_path)
        .await
        .expect("Failed to initialize SQLite store");

    // The HTTP timeout sits a little above the per-attempt deadline so the
    // pipeline's own timeout is what normally fires.
    let classifier = GeminiClassifier::new(
        gemini_api_key,
        gemini_model,
        config.classifier_timeout + Duration::from_secs(1),
    );

    let model = classifier.model().to_string();
    let moderation_service = Arc::new(ModerationService::new(store, classifier, config));

    let active = moderation_service.config();
    tracing::info!(
        model = %model,
        db_path = %db_path,
        max_retries = active.attempt_budget(),
        classifier_timeout_secs = active.classifier_timeout.as_secs(),
        "Moderation service ready"
    );

    // Create the data structure that will be shared across all commands
    let data = Data {
        moderation: Arc::clone(&moderation_service),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Slash commands only, so no privileged intents are needed.

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                content_commands::submit(),
                content_commands::feed(),
                content_commands::content(),
                content_commands::report(),
                content_commands::myreports(),
                commands::moderate(),
            ],
            on_error: |error| {
                Box::pin(async move {
                    if let poise::FrameworkError::Command { error, ctx, .. } = &error {
                        tracing::error!(
                            command = %ctx.command().qualified_name,
                            "Command failed: {}",
                            error
                        );
                    }
                    if let Err(e) = poise::builtins::on_error(error).await {
                        tracing::error!("Error while handling error: {}", e);
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                println!("🤖 Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                // For faster development, use register_in_guild instead:
                // poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                println!("✅ Commands registered!");
                println!("🚀 Bot is ready!");

                Ok::<Data, Error>(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
