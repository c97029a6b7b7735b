//! Message handlers - photo submissions in review channels.
//!
//! Only messages by a record's owner inside its review channel are
//! interpreted; everything else is ordinary chat and ignored.

use poise::serenity_prelude::{self as serenity, Message};
use tracing::{error, warn};

use crate::{
    bot::BotData,
    core::registration::{AttachmentInfo, RegistrationStatus, looks_like_link},
    errors::{Error, Result},
};

/// Interprets messages in review channels as photo submissions.
pub async fn handle_message(
    ctx: &serenity::Context,
    message: &Message,
    data: &BotData,
) -> Result<()> {
    if message.author.bot {
        return Ok(());
    }
    let Some(record) = data
        .controller
        .record_for_channel(message.channel_id)
        .await
    else {
        return Ok(());
    };
    if record.owner_id != message.author.id {
        return Ok(());
    }

    let Some(attachment) = message.attachments.first() else {
        // A bare link in place of an attachment is an explicit mis-submission.
        if record.status == RegistrationStatus::AwaitingPhoto && looks_like_link(&message.content) {
            message
                .reply(
                    &ctx.http,
                    "⚠️ Please upload the image **as an attachment**, not a link.",
                )
                .await?;
        }
        return Ok(());
    };

    let info = AttachmentInfo {
        filename: attachment.filename.clone(),
        content_type: attachment.content_type.clone(),
        url: attachment.url.clone(),
    };

    match data
        .controller
        .submit_photo(message.channel_id, message.author.id, &info)
        .await
    {
        Ok(()) => Ok(()),
        Err(Error::Validation { message: text }) => {
            message.reply(&ctx.http, format!("⚠️ {text}")).await?;
            Ok(())
        }
        // Attachments outside the photo step are ordinary chat.
        Err(Error::InvalidTransition { .. }) => Ok(()),
        Err(error) => {
            error!(%error, "failed to process photo submission");
            if let Err(reply_error) = message
                .reply(
                    &ctx.http,
                    "⚠️ Something went wrong while processing your photo. Try again.",
                )
                .await
            {
                warn!(%reply_error, "failed to report photo processing error");
            }
            Ok(())
        }
    }
}
