//! Bot settings loaded from environment variables.
//!
//! All identifiers the bot needs (guild, channels, roles) are provided through
//! the environment and validated at startup; a missing or malformed required
//! value aborts the process with an error naming the variable. The bot token is
//! deliberately not part of these settings - it is read in `main` directly
//! before use.

use crate::errors::{Error, Result};
use poise::serenity_prelude::{ChannelId, GuildId, RoleId};
use std::time::Duration;
use tracing::info;

/// Default health endpoint port when `PORT` is not set.
const DEFAULT_HEALTH_PORT: u16 = 3000;

/// Validated startup settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Guild the bot serves and registers its commands in.
    pub guild_id: GuildId,
    /// Channel receiving decision audit entries (`LOG_CHANNEL_ID`).
    pub audit_log_channel_id: ChannelId,
    /// Role allowed to approve/reject (`APPROVER_ROLE_ID`).
    pub reviewer_role_id: RoleId,
    /// Role granted on approval (`MEMBER_ROLE_ID`).
    pub member_role_id: RoleId,
    /// Category the private review channels are created under.
    pub ticket_category_id: ChannelId,
    /// When set, `/register` is only accepted in this channel.
    pub intake_channel_id: Option<ChannelId>,
    /// When set, requests are abandoned automatically after this duration.
    pub registration_timeout: Option<Duration>,
    /// Port the liveness endpoint listens on.
    pub health_port: u16,
}

impl BotSettings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an injectable lookup; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let guild_id = GuildId::new(required_snowflake(&lookup, "GUILD_ID")?);
        let audit_log_channel_id = ChannelId::new(required_snowflake(&lookup, "LOG_CHANNEL_ID")?);
        let reviewer_role_id = RoleId::new(required_snowflake(&lookup, "APPROVER_ROLE_ID")?);
        let member_role_id = RoleId::new(required_snowflake(&lookup, "MEMBER_ROLE_ID")?);
        let ticket_category_id =
            ChannelId::new(required_snowflake(&lookup, "TICKET_CATEGORY_ID")?);

        let intake_channel_id =
            optional_snowflake(&lookup, "INTAKE_CHANNEL_ID")?.map(ChannelId::new);

        let registration_timeout = match lookup("REGISTRATION_TIMEOUT_MINUTES") {
            None => None,
            Some(raw) => {
                let minutes: u64 = raw.trim().parse().map_err(|_| Error::Config {
                    message: format!(
                        "REGISTRATION_TIMEOUT_MINUTES must be a whole number of minutes (got {raw:?})"
                    ),
                })?;
                // 0 disables the timeout
                (minutes > 0).then(|| Duration::from_secs(minutes * 60))
            }
        };

        let health_port = match lookup("PORT") {
            None => DEFAULT_HEALTH_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| Error::Config {
                message: format!("PORT must be a valid TCP port (got {raw:?})"),
            })?,
        };

        info!(
            guild = guild_id.get(),
            timeout = ?registration_timeout,
            "bot settings loaded"
        );
        Ok(Self {
            guild_id,
            audit_log_channel_id,
            reviewer_role_id,
            member_role_id,
            ticket_category_id,
            intake_channel_id,
            registration_timeout,
            health_port,
        })
    }
}

fn required_snowflake(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<u64> {
    let raw = lookup(name).ok_or_else(|| Error::Config {
        message: format!("missing required environment variable {name}"),
    })?;
    parse_snowflake(name, &raw)
}

fn optional_snowflake(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u64>> {
    lookup(name)
        .map(|raw| parse_snowflake(name, &raw))
        .transpose()
}

fn parse_snowflake(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| Error::Config {
            message: format!("{name} must be a non-zero Discord ID (got {raw:?})"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("GUILD_ID", "1474368606128181373"),
            ("LOG_CHANNEL_ID", "1475645181905600624"),
            ("APPROVER_ROLE_ID", "1476054786573992087"),
            ("MEMBER_ROLE_ID", "1474810158587580517"),
            ("TICKET_CATEGORY_ID", "1474810158587580999"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<BotSettings> {
        BotSettings::from_lookup(|name| env.get(name).map(|value| (*value).to_string()))
    }

    #[test]
    fn test_required_values_parse() {
        let settings = load(&base_env()).unwrap();
        assert_eq!(settings.guild_id.get(), 1_474_368_606_128_181_373);
        assert_eq!(settings.health_port, 3000);
        assert!(settings.intake_channel_id.is_none());
        assert!(settings.registration_timeout.is_none());
    }

    #[test]
    fn test_missing_variable_names_the_culprit() {
        let mut env = base_env();
        env.remove("APPROVER_ROLE_ID");
        let error = load(&env).unwrap_err();
        assert!(
            matches!(error, Error::Config { ref message } if message.contains("APPROVER_ROLE_ID"))
        );
    }

    #[test]
    fn test_malformed_id_is_rejected() {
        let mut env = base_env();
        env.insert("GUILD_ID", "not-a-number");
        let error = load(&env).unwrap_err();
        assert!(matches!(error, Error::Config { ref message } if message.contains("GUILD_ID")));
    }

    #[test]
    fn test_zero_id_is_rejected() {
        let mut env = base_env();
        env.insert("MEMBER_ROLE_ID", "0");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_optional_values_parse() {
        let mut env = base_env();
        env.insert("INTAKE_CHANNEL_ID", "1475645181905601000");
        env.insert("REGISTRATION_TIMEOUT_MINUTES", "30");
        env.insert("PORT", "8080");

        let settings = load(&env).unwrap();
        assert_eq!(
            settings.intake_channel_id.map(|id| id.get()),
            Some(1_475_645_181_905_601_000)
        );
        assert_eq!(
            settings.registration_timeout,
            Some(Duration::from_secs(30 * 60))
        );
        assert_eq!(settings.health_port, 8080);
    }

    #[test]
    fn test_zero_timeout_disables_expiry() {
        let mut env = base_env();
        env.insert("REGISTRATION_TIMEOUT_MINUTES", "0");
        let settings = load(&env).unwrap();
        assert!(settings.registration_timeout.is_none());
    }

    #[test]
    fn test_garbage_timeout_is_rejected() {
        let mut env = base_env();
        env.insert("REGISTRATION_TIMEOUT_MINUTES", "soon");
        assert!(load(&env).is_err());
    }
}
