//! Serenity-backed implementation of the outbound gateway seam.
//!
//! All Discord side effects of the registration lifecycle live here: the
//! private review channel with its permission overwrites, the instruction and
//! review-prompt embeds with their buttons, the member-role grant, the owner
//! DM, the audit-log entry, and channel teardown.

use std::{fmt::Write, sync::Arc};

use async_trait::async_trait;
use poise::serenity_prelude::{
    self as serenity, ButtonStyle, ChannelId, ChannelType, CreateActionRow, CreateButton,
    CreateChannel, CreateEmbed, CreateEmbedFooter, CreateMessage, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId, UserId,
};

use crate::{
    bot::{APPROVE_BUTTON_PREFIX, FORM_BUTTON_ID, REJECT_BUTTON_PREFIX},
    config::settings::BotSettings,
    core::{
        lifecycle::Gateway,
        registration::{RegistrationRecord, ReviewDecision},
    },
    errors::{Error, Result},
};

/// Embed accent colour shared by the bot's messages.
const EMBED_COLOR: u32 = 0x0034_98DB;
/// Audit embed colour for approvals.
const APPROVED_COLOR: u32 = 0x002E_CC71;
/// Audit embed colour for rejections.
const REJECTED_COLOR: u32 = 0x00E7_4C3C;

/// Discord implementation of [`Gateway`].
pub struct DiscordGateway {
    http: Arc<serenity::Http>,
    settings: Arc<BotSettings>,
}

impl DiscordGateway {
    /// Creates a gateway bound to the given HTTP client and settings.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>, settings: Arc<BotSettings>) -> Self {
        Self { http, settings }
    }

    /// Overwrites making a review channel visible only to its owner and the
    /// reviewer role.
    fn review_channel_overwrites(&self, owner: UserId) -> Vec<PermissionOverwrite> {
        let everyone = RoleId::new(self.settings.guild_id.get());
        let member_access = Permissions::VIEW_CHANNEL
            | Permissions::SEND_MESSAGES
            | Permissions::READ_MESSAGE_HISTORY;
        vec![
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::VIEW_CHANNEL,
                kind: PermissionOverwriteType::Role(everyone),
            },
            PermissionOverwrite {
                allow: member_access | Permissions::ATTACH_FILES,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(owner),
            },
            PermissionOverwrite {
                allow: member_access,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(self.settings.reviewer_role_id),
            },
        ]
    }
}

/// Renders the submitted form fields for embeds; an absent form renders empty.
fn format_form(record: &RegistrationRecord) -> Result<String> {
    let mut text = String::new();
    if let Some(form) = &record.form {
        writeln!(&mut text, "🪪 **ID:** {}", form.player_id)?;
        writeln!(&mut text, "👤 **In-game name:** {}", form.display_name)?;
        writeln!(&mut text, "🤝 **Recruiter:** {}", form.recruiter)?;
        writeln!(&mut text, "📅 **Recruitment date:** {}", form.recruited_on)?;
    }
    Ok(text)
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn create_review_channel(&self, owner: UserId) -> Result<ChannelId> {
        let builder = CreateChannel::new(format!("registration-{}", owner.get()))
            .kind(ChannelType::Text)
            .category(self.settings.ticket_category_id)
            .permissions(self.review_channel_overwrites(owner));
        let channel = self
            .settings
            .guild_id
            .create_channel(&self.http, builder)
            .await?;
        Ok(channel.id)
    }

    async fn post_instructions(&self, channel: ChannelId, owner: UserId) -> Result<()> {
        let embed = CreateEmbed::new()
            .title("📋 Registration")
            .description(
                "Welcome! Click the button below and fill out your registration form.\n\
                 Once the form is in, upload your photo **as an attachment** in this \
                 channel (png, jpg or webp).",
            )
            .color(EMBED_COLOR)
            .footer(CreateEmbedFooter::new("Registration system"));
        let buttons = CreateActionRow::Buttons(vec![
            CreateButton::new(FORM_BUTTON_ID)
                .label("📋 Fill out the form")
                .style(ButtonStyle::Primary),
        ]);
        channel
            .send_message(
                &self.http,
                CreateMessage::new()
                    .content(format!("<@{}>", owner.get()))
                    .embed(embed)
                    .components(vec![buttons]),
            )
            .await?;
        Ok(())
    }

    async fn post_review_prompt(&self, record: &RegistrationRecord) -> Result<()> {
        let channel = record.channel_id.ok_or(Error::NotFound)?;

        let mut description = format_form(record)?;
        writeln!(&mut description)?;
        writeln!(
            &mut description,
            "👤 **Member:** <@{}> (`{}`)",
            record.owner_id.get(),
            record.owner_id.get()
        )?;
        write!(&mut description, "⏳ **Status:** awaiting a decision")?;

        let mut embed = CreateEmbed::new()
            .title("📋 New registration")
            .description(description)
            .color(EMBED_COLOR)
            .footer(CreateEmbedFooter::new("Approve or reject below"));
        if let Some(url) = &record.photo_url {
            embed = embed.image(url);
        }
        if let Ok(user) = record.owner_id.to_user(&self.http).await {
            embed = embed.thumbnail(user.face());
        }

        let buttons = CreateActionRow::Buttons(vec![
            CreateButton::new(format!("{APPROVE_BUTTON_PREFIX}{}", record.owner_id.get()))
                .label("✅ Approve")
                .style(ButtonStyle::Success),
            CreateButton::new(format!("{REJECT_BUTTON_PREFIX}{}", record.owner_id.get()))
                .label("❌ Reject")
                .style(ButtonStyle::Danger),
        ]);

        channel
            .send_message(
                &self.http,
                CreateMessage::new().embed(embed).components(vec![buttons]),
            )
            .await?;
        Ok(())
    }

    async fn grant_member_role(&self, owner: UserId) -> Result<()> {
        self.http
            .add_member_role(
                self.settings.guild_id,
                owner,
                self.settings.member_role_id,
                Some("Registration approved"),
            )
            .await?;
        Ok(())
    }

    async fn notify_owner(&self, owner: UserId, decision: ReviewDecision) -> Result<()> {
        let text = match decision {
            ReviewDecision::Approved => "✅ Your registration was **approved**. Welcome!",
            ReviewDecision::Rejected => {
                "❌ Your registration was **rejected**. Contact the staff if you \
                 believe this is a mistake."
            }
        };
        let dm = owner.create_dm_channel(&self.http).await?;
        dm.id.say(&self.http, text).await?;
        Ok(())
    }

    async fn post_audit_entry(
        &self,
        record: &RegistrationRecord,
        decision: ReviewDecision,
        reviewer: UserId,
    ) -> Result<()> {
        let (title, color) = match decision {
            ReviewDecision::Approved => ("✅ Registration approved", APPROVED_COLOR),
            ReviewDecision::Rejected => ("❌ Registration rejected", REJECTED_COLOR),
        };

        let mut description = format_form(record)?;
        writeln!(&mut description)?;
        writeln!(
            &mut description,
            "👤 **Member:** <@{}> (`{}`)",
            record.owner_id.get(),
            record.owner_id.get()
        )?;
        writeln!(
            &mut description,
            "📌 **Decision:** {decision} by <@{}>",
            reviewer.get()
        )?;
        write!(
            &mut description,
            "🕐 **Opened:** {}",
            record.opened_at.format("%Y-%m-%d %H:%M UTC")
        )?;

        let embed = CreateEmbed::new()
            .title(title)
            .description(description)
            .color(color)
            .footer(CreateEmbedFooter::new("Decision recorded"));
        self.settings
            .audit_log_channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }

    async fn delete_review_channel(&self, channel: ChannelId) -> Result<()> {
        channel.delete(&self.http).await?;
        Ok(())
    }
}
