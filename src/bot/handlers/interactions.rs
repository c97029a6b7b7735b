//! Button and modal interaction handlers.
//!
//! Covers the panel's start button, the form button + modal inside a review
//! channel, and the approve/reject buttons on review prompts. Stale components
//! (whose record is gone) are acknowledged without any visible reply.

use poise::serenity_prelude::{
    self as serenity, ActionRowComponent, ComponentInteraction, CreateActionRow, CreateEmbed,
    CreateEmbedFooter, CreateInputText, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, CreateModal,
    InputTextStyle, ModalInteraction, ModalInteractionData, UserId,
};
use tracing::{debug, error, warn};

use crate::{
    bot::{
        APPROVE_BUTTON_PREFIX, BotData, FORM_BUTTON_ID, FORM_MODAL_ID, OPEN_BUTTON_ID,
        REJECT_BUTTON_PREFIX,
        handlers::describe_error,
    },
    core::registration::{RegistrationForm, RegistrationStatus, ReviewDecision},
    errors::{Error, Result},
};

/// Routes a button click by its component identifier.
pub async fn handle_component(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let custom_id = component.data.custom_id.as_str();
    if custom_id == OPEN_BUTTON_ID {
        open_request(ctx, component, data).await
    } else if custom_id == FORM_BUTTON_ID {
        show_form(ctx, component, data).await
    } else if let Some(owner) = parse_target(custom_id, APPROVE_BUTTON_PREFIX) {
        decide(ctx, component, data, owner, ReviewDecision::Approved).await
    } else if let Some(owner) = parse_target(custom_id, REJECT_BUTTON_PREFIX) {
        decide(ctx, component, data, owner, ReviewDecision::Rejected).await
    } else {
        Ok(())
    }
}

/// Handles the submitted registration form modal.
pub async fn handle_modal(
    ctx: &serenity::Context,
    modal: &ModalInteraction,
    data: &BotData,
) -> Result<()> {
    if modal.data.custom_id != FORM_MODAL_ID {
        return Ok(());
    }

    let form = RegistrationForm {
        player_id: field_value(&modal.data, "field_id"),
        display_name: field_value(&modal.data, "field_name"),
        recruiter: field_value(&modal.data, "field_recruiter"),
        recruited_on: field_value(&modal.data, "field_date"),
    };

    let response = match data.controller.submit_form(modal.user.id, form).await {
        Ok(()) => "✅ Form received! Now upload your photo **as an attachment** in this \
                   channel (png, jpg or webp)."
            .to_string(),
        Err(
            ref error @ (Error::NotFound
            | Error::InvalidTransition { .. }
            | Error::Validation { .. }),
        ) => describe_error(error),
        Err(error) => {
            error!(%error, "failed to record registration form");
            describe_error(&error)
        }
    };
    modal
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(response)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

fn parse_target(custom_id: &str, prefix: &str) -> Option<UserId> {
    custom_id
        .strip_prefix(prefix)?
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(UserId::new)
}

fn field_value(data: &ModalInteractionData, id: &str) -> String {
    data.components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == id => input.value.clone(),
            _ => None,
        })
        .unwrap_or_default()
}

async fn ephemeral(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    text: impl Into<String>,
) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Acknowledges a stale component without any visible reply.
async fn acknowledge(ctx: &serenity::Context, component: &ComponentInteraction) -> Result<()> {
    component
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await?;
    Ok(())
}

async fn open_request(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    match data.controller.open_request(component.user.id).await {
        Ok(channel) => {
            ephemeral(
                ctx,
                component,
                format!("✅ Your registration channel is ready: <#{}>", channel.get()),
            )
            .await
        }
        Err(ref error @ Error::DuplicateRequest { .. }) => {
            ephemeral(ctx, component, describe_error(error)).await
        }
        Err(error) => {
            error!(%error, "failed to open registration request from panel");
            ephemeral(
                ctx,
                component,
                "⚠️ Something went wrong while opening your registration. Try again later.",
            )
            .await
        }
    }
}

async fn show_form(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(record) = data
        .controller
        .record_for_channel(component.channel_id)
        .await
    else {
        debug!(
            channel = component.channel_id.get(),
            "form button without a pending registration"
        );
        return acknowledge(ctx, component).await;
    };
    if record.owner_id != component.user.id {
        return ephemeral(
            ctx,
            component,
            "🚫 Only the member who opened this request may fill out the form.",
        )
        .await;
    }
    if record.status != RegistrationStatus::AwaitingForm {
        return ephemeral(
            ctx,
            component,
            describe_error(&Error::InvalidTransition {
                status: record.status,
                event: "submit the form",
            }),
        )
        .await;
    }

    let modal = CreateModal::new(FORM_MODAL_ID, "📋 Registration form").components(vec![
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "ID", "field_id").required(true),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "In-game name", "field_name")
                .required(true),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "Recruiter", "field_recruiter")
                .required(true),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(
                InputTextStyle::Short,
                "Recruitment date (e.g. 23/02/2026)",
                "field_date",
            )
            .required(true),
        ),
    ]);
    component
        .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

async fn decide(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &BotData,
    owner: UserId,
    decision: ReviewDecision,
) -> Result<()> {
    // Reviewer privilege: the designated role OR administrator permission.
    let is_reviewer = component.member.as_ref().is_some_and(|member| {
        member.roles.contains(&data.settings.reviewer_role_id)
            || member
                .permissions
                .is_some_and(serenity::Permissions::administrator)
    });
    if !is_reviewer {
        return ephemeral(ctx, component, describe_error(&Error::PermissionDenied)).await;
    }

    // Guard re-check before touching the message; the controller re-checks
    // atomically when committing.
    let Some(record) = data.controller.record_for(owner).await else {
        return acknowledge(ctx, component).await;
    };
    if record.status != RegistrationStatus::ReadyForReview {
        return ephemeral(
            ctx,
            component,
            describe_error(&Error::InvalidTransition {
                status: record.status,
                event: "record a decision",
            }),
        )
        .await;
    }

    // Annotate the prompt first: the review channel disappears as part of the
    // decision, after which no interaction response can land.
    if let Err(error) = component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(annotate_decision(component, decision)),
        )
        .await
    {
        warn!(%error, "failed to annotate review prompt with the decision");
    }

    match data
        .controller
        .decide(component.user.id, is_reviewer, owner, decision)
        .await
    {
        Ok(_) => Ok(()),
        Err(error) => {
            error!(%error, "failed to record decision");
            let followup = CreateInteractionResponseFollowup::new()
                .content(describe_error(&error))
                .ephemeral(true);
            if let Err(followup_error) = component.create_followup(&ctx.http, followup).await {
                warn!(%followup_error, "failed to report decision error");
            }
            Ok(())
        }
    }
}

/// Rebuilds the prompt embed with the decision appended and the buttons
/// removed.
fn annotate_decision(
    component: &ComponentInteraction,
    decision: ReviewDecision,
) -> CreateInteractionResponseMessage {
    let verdict = match decision {
        ReviewDecision::Approved => "✅ Approved",
        ReviewDecision::Rejected => "❌ Rejected",
    };
    let previous = component.message.embeds.first();
    let description = format!(
        "{}\n\n📌 **Decision:** {verdict} by <@{}>",
        previous
            .and_then(|embed| embed.description.as_deref())
            .unwrap_or_default(),
        component.user.id.get(),
    );

    let mut embed = CreateEmbed::new()
        .description(description)
        .footer(CreateEmbedFooter::new("Decision recorded"));
    if let Some(previous) = previous {
        if let Some(title) = &previous.title {
            embed = embed.title(title.clone());
        }
        if let Some(colour) = previous.colour {
            embed = embed.colour(colour);
        }
        if let Some(image) = &previous.image {
            embed = embed.image(image.url.clone());
        }
    }
    CreateInteractionResponseMessage::new()
        .embed(embed)
        .components(Vec::new())
}
