//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't touch the registration
//! store and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't touch any state.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**RosterBuddy Help**\n\
        Here is a summary of all available commands.\n\n\
        **Registration**\n\
        • `/register` - Opens your registration request in a private review channel.\n\
        • `/panel` - Posts the registration panel with the start button.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        Inside your review channel: fill out the form via the button, then upload \
        your photo as an attachment (png, jpg or webp). Staff approve or reject \
        from there.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
