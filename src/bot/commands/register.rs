//! Registration commands - opening requests and posting the intake panel.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use poise::serenity_prelude::{
        ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
    };
    use tracing::error;

    use crate::{
        bot::{BotData, OPEN_BUTTON_ID, handlers},
        errors::{Error, Result},
    };

    /// Opens your registration request.
    ///
    /// Creates a private review channel visible to you and the staff, where the
    /// form and photo steps happen. A user can only have one open request at a
    /// time; a second invocation points back at the existing channel.
    #[poise::command(slash_command, guild_only)]
    pub async fn register(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();

        if let Some(intake) = data.settings.intake_channel_id {
            if ctx.channel_id() != intake {
                ctx.send(
                    poise::CreateReply::default()
                        .content(format!("Please use <#{}> to register.", intake.get()))
                        .ephemeral(true),
                )
                .await?;
                return Ok(());
            }
        }

        match data.controller.open_request(ctx.author().id).await {
            Ok(channel) => {
                ctx.send(
                    poise::CreateReply::default()
                        .content(format!(
                            "✅ Your registration channel is ready: <#{}>",
                            channel.get()
                        ))
                        .ephemeral(true),
                )
                .await?;
            }
            Err(error @ Error::DuplicateRequest { .. }) => {
                ctx.send(
                    poise::CreateReply::default()
                        .content(handlers::describe_error(&error))
                        .ephemeral(true),
                )
                .await?;
            }
            Err(error) => {
                error!(%error, "failed to open registration request");
                ctx.send(
                    poise::CreateReply::default()
                        .content(
                            "⚠️ Something went wrong while opening your registration. \
                             Try again later.",
                        )
                        .ephemeral(true),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Posts the public registration panel with the start button.
    #[poise::command(slash_command, guild_only)]
    pub async fn panel(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let embed = CreateEmbed::new()
            .title("📋 COMMUNITY REGISTRATION")
            .description("Click the button below to open your registration request.")
            .footer(CreateEmbedFooter::new("Registration system"));
        let buttons = CreateActionRow::Buttons(vec![
            CreateButton::new(OPEN_BUTTON_ID)
                .label("📋 Start registration")
                .style(ButtonStyle::Primary),
        ]);

        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![buttons]),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
