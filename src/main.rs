//! `RosterBuddy` binary entry point.

use std::{env, sync::Arc};

use dotenvy::dotenv;
use roster_buddy::{
    bot,
    config::settings::BotSettings,
    errors::{Error, Result},
    health,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load and validate settings; a missing required variable aborts startup
    let settings = Arc::new(
        BotSettings::from_env().inspect_err(|e| error!("Invalid bot settings: {e}"))?,
    );

    // 4. Health endpoint for platform liveness probes
    let health_port = settings.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_port).await {
            error!("Health endpoint failed: {e}");
        }
    });

    // 5. Run the bot. DISCORD_BOT_TOKEN is loaded here, directly before use,
    //    not stored in the settings.
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, settings).await
}
