//! Discord event handlers
//!
//! Routes raw gateway events (button clicks, modal submissions, channel
//! messages) to the registration lifecycle controller and maps domain errors
//! to the short, private messages users see.

/// Button click and modal submission handlers
pub mod interactions;
/// Photo submissions arriving as channel messages
pub mod messages;

use poise::serenity_prelude::{self as serenity, FullEvent, Interaction};

use crate::{
    bot::BotData,
    errors::{Error, Result},
};

/// Dispatches raw serenity events to the matching handler.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        FullEvent::InteractionCreate {
            interaction: Interaction::Component(component),
        } => interactions::handle_component(ctx, component, data).await,
        FullEvent::InteractionCreate {
            interaction: Interaction::Modal(modal),
        } => interactions::handle_modal(ctx, modal, data).await,
        FullEvent::Message { new_message } => {
            messages::handle_message(ctx, new_message, data).await
        }
        _ => Ok(()),
    }
}

/// Maps an error to the short, user-facing text surfaced on Discord.
///
/// Domain errors get a specific message; everything else a generic one so
/// platform internals never leak to users.
#[must_use]
pub fn describe_error(error: &Error) -> String {
    match error {
        Error::DuplicateRequest {
            channel: Some(channel),
        } => format!(
            "⚠️ You already have an open registration — continue in <#{}>.",
            channel.get()
        ),
        Error::DuplicateRequest { channel: None } => {
            "⚠️ You already have an open registration request.".to_string()
        }
        Error::NotFound => {
            "⚠️ You have no open registration request. Use `/register` to start one.".to_string()
        }
        Error::InvalidTransition { status, event } => {
            format!("⚠️ Cannot {event}: your request is {status}.")
        }
        Error::PermissionDenied => {
            "🚫 You do not have permission to approve or reject registrations.".to_string()
        }
        Error::Validation { message } => format!("⚠️ {message}"),
        _ => "⚠️ Something went wrong. Try again later.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise::serenity_prelude::ChannelId;

    #[test]
    fn test_duplicate_request_points_at_existing_channel() {
        let text = describe_error(&Error::DuplicateRequest {
            channel: Some(ChannelId::new(42)),
        });
        assert!(text.contains("<#42>"));
    }

    #[test]
    fn test_internal_errors_stay_generic() {
        let text = describe_error(&Error::Config {
            message: "GUILD_ID".to_string(),
        });
        assert!(!text.contains("GUILD_ID"));
    }
}
