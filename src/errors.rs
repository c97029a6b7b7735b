//! Unified error types for `RosterBuddy`.
//!
//! Domain errors (duplicate request, missing record, invalid transition, permission
//! and validation failures) are surfaced to the triggering user as short, private
//! messages and are never fatal; plumbing errors carry their sources.

use crate::core::registration::RegistrationStatus;
use poise::serenity_prelude as serenity;
use thiserror::Error;

/// All errors the bot can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration, naming the variable involved.
        message: String,
    },

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// A non-terminal registration request already exists for the user.
    #[error("a registration request is already open")]
    DuplicateRequest {
        /// Review channel of the existing request, for the guidance message.
        channel: Option<serenity::ChannelId>,
    },

    /// No registration record exists for the user or channel.
    #[error("no open registration request")]
    NotFound,

    /// The requested status change is not allowed from the current status.
    #[error("cannot {event} while the request is {status}")]
    InvalidTransition {
        /// Status the record was in when the event arrived.
        status: RegistrationStatus,
        /// Human-readable name of the attempted event.
        event: &'static str,
    },

    /// The issuer lacks the reviewer role and administrator permission.
    #[error("missing permission to review registrations")]
    PermissionDenied,

    /// Submitted data failed validation (blank field, non-image attachment).
    #[error("{message}")]
    Validation {
        /// User-facing description of what failed.
        message: String,
    },

    /// A Discord API call was rejected or timed out.
    #[error("Discord request failed: {0}")]
    Discord(Box<serenity::Error>),
}

impl From<serenity::Error> for Error {
    fn from(value: serenity::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
