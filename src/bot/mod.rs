//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `RosterBuddy` application:
//! slash commands, component/modal/message handlers, the serenity-backed gateway
//! implementation, and the framework wiring.

/// Discord command implementations (registration, general)
pub mod commands;
/// Serenity implementation of the outbound gateway seam
pub mod gateway;
/// Discord event handlers (buttons, modals, photo messages)
pub mod handlers;

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::signal;
use tracing::{error, info};

use crate::{
    bot::gateway::DiscordGateway,
    config::settings::BotSettings,
    core::lifecycle::LifecycleController,
    errors::{Error, Result},
};

/// Component identifier of the "start registration" button on the intake panel.
pub const OPEN_BUTTON_ID: &str = "registration_open";
/// Component identifier of the "fill out the form" button in a review channel.
pub const FORM_BUTTON_ID: &str = "registration_form";
/// Identifier of the registration form modal.
pub const FORM_MODAL_ID: &str = "registration_form_modal";
/// Prefix of approve buttons; the owner's user id follows the colon.
pub const APPROVE_BUTTON_PREFIX: &str = "registration_approve:";
/// Prefix of reject buttons; the owner's user id follows the colon.
pub const REJECT_BUTTON_PREFIX: &str = "registration_reject:";

/// Shared data available to all bot commands and handlers.
pub struct BotData {
    /// Validated startup settings.
    pub settings: Arc<BotSettings>,
    /// The registration state machine driver.
    pub controller: Arc<LifecycleController<DiscordGateway>>,
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(handlers::describe_error(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, shutting down...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

/// Builds the poise framework and runs the bot until the gateway connection
/// closes.
pub async fn run_bot(token: String, settings: Arc<BotSettings>) -> Result<()> {
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::register(),
                commands::panel(),
                commands::ping(),
                commands::help(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup({
            let settings = Arc::clone(&settings);
            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("Logged in as {}", ready.user.name);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        settings.guild_id,
                    )
                    .await?;
                    info!(guild = settings.guild_id.get(), "slash commands registered");

                    let gateway = DiscordGateway::new(ctx.http.clone(), Arc::clone(&settings));
                    let controller =
                        LifecycleController::new(gateway, settings.registration_timeout);
                    Ok(BotData {
                        settings,
                        controller,
                    })
                })
            }
        })
        .build();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Closing gateway connection...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot client...");
    client.start().await.map_err(Error::from)
}
