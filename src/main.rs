// This is the entry point of the denylist moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): rules, store, evaluation
// - `infra/` = Implementations of core traits (denylist file, file watcher)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers
// 5. Stop everything cleanly on CTRL-C / SIGTERM

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::{Config, LogFormat};
use crate::core::moderation::{DenylistStore, ModerationService};
use crate::discord::moderation::denylist_handler::handle_message_for_denylist;
use crate::discord::{Data, Error};
use crate::infra::denylist::{DenylistWatcher, FileDenylistSource, WatcherState};
use anyhow::Context as _;
use clap::Parser;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        handle_message_for_denylist(ctx, new_message, data).await;
    }

    Ok(())
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolves on CTRL-C, or SIGTERM on unix.
async fn wait_for_termination() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists) before parsing,
    // so every flag can fall back to it.
    dotenv::dotenv().ok();

    let config = Config::parse();
    init_logging(config.log_format);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.
    // The denylist store is the only shared mutable state; the watcher writes
    // to it and the message handler reads from it.

    let store = Arc::new(DenylistStore::new());
    let source = Arc::new(FileDenylistSource::new(&config.denylist_path));
    let moderation = Arc::new(ModerationService::new(
        Arc::clone(&store),
        config.exemptions(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher = DenylistWatcher::new(
        Arc::clone(&store),
        Arc::clone(&source),
        config.watch_retry_interval(),
    )
    .spawn(shutdown_rx);

    let data = Data {
        moderation,
        denylist_source: source,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::moderation::commands::denylist()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Connected to Discord");

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                ctx.set_presence(
                    Some(serenity::ActivityData::watching("for denied messages")),
                    serenity::OnlineStatus::Online,
                );

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating Discord client")?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("Shutdown requested");
        shard_manager.shutdown_all().await;
    });

    tracing::info!("Bot is now running. Press CTRL-C to exit.");
    let result = client.start().await.context("Error running bot");

    // Whatever stopped the client, stop watching the denylist too.
    let _ = shutdown_tx.send(true);
    match watcher.await {
        Ok(WatcherState::Stopped) => tracing::info!("Denylist watcher stopped"),
        Ok(state) => tracing::warn!(?state, "Denylist watcher exited without stopping"),
        Err(e) => tracing::error!("Denylist watcher task failed: {}", e),
    }

    result
}
