//! Registration domain types.
//!
//! Defines the registration record, its status progression, the submitted form
//! fields, and the validation helpers for the photo step.

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, UserId};

/// Content types accepted for the photo step.
const IMAGE_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];
/// File extensions accepted when the platform reports no content type.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Lifecycle position of a registration request.
///
/// `Approved` and `Rejected` are terminal: the record is removed from the store
/// in the same operation that records the decision, so they are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// Waiting for the member to submit the registration form.
    AwaitingForm,
    /// Form received; waiting for the photo attachment.
    AwaitingPhoto,
    /// Photo received; waiting for a reviewer decision.
    ReadyForReview,
    /// Accepted by a reviewer (terminal).
    Approved,
    /// Declined by a reviewer (terminal).
    Rejected,
}

impl RegistrationStatus {
    /// Whether the status ends the lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::AwaitingForm => "awaiting the form",
            Self::AwaitingPhoto => "awaiting the photo",
            Self::ReadyForReview => "ready for review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(text)
    }
}

/// Outcome of a reviewer decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Grant the member role and welcome the member.
    Approved,
    /// Turn the request down.
    Rejected,
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        })
    }
}

/// The four required fields of the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    /// In-game numeric identifier.
    pub player_id: String,
    /// Name the member uses in game.
    pub display_name: String,
    /// Who recruited the member.
    pub recruiter: String,
    /// When the member was recruited, as entered.
    pub recruited_on: String,
}

impl RegistrationForm {
    /// Checks that every required field carries non-blank text.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("ID", &self.player_id),
            ("In-game name", &self.display_name),
            ("Recruiter", &self.recruiter),
            ("Recruitment date", &self.recruited_on),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation {
                    message: format!("'{label}' must not be empty."),
                });
            }
        }
        Ok(())
    }
}

/// One user's in-flight registration request.
#[derive(Debug, Clone)]
pub struct RegistrationRecord {
    /// The member who opened the request. Primary key, immutable.
    pub owner_id: UserId,
    /// The private review channel, bound once after creation.
    pub channel_id: Option<ChannelId>,
    /// Submitted form fields, absent until the form step completes.
    pub form: Option<RegistrationForm>,
    /// Locator of the submitted photo, absent until the photo step completes.
    pub photo_url: Option<String>,
    /// Current lifecycle position.
    pub status: RegistrationStatus,
    /// When the request was opened.
    pub opened_at: DateTime<Utc>,
}

impl RegistrationRecord {
    pub(crate) fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            channel_id: None,
            form: None,
            photo_url: None,
            status: RegistrationStatus::AwaitingForm,
            opened_at: Utc::now(),
        }
    }
}

/// Metadata of a message attachment, as needed for the photo step.
#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    /// File name as uploaded.
    pub filename: String,
    /// Content type reported by the platform, when available.
    pub content_type: Option<String>,
    /// Where the attachment can be fetched from.
    pub url: String,
}

impl AttachmentInfo {
    /// Whether the attachment passes the image allow-list.
    ///
    /// The reported content type is checked first; the file extension is the
    /// fallback for platforms that omit it.
    #[must_use]
    pub fn is_image(&self) -> bool {
        if let Some(content_type) = &self.content_type {
            let media_type = content_type
                .split(';')
                .next()
                .unwrap_or(content_type)
                .trim();
            if IMAGE_CONTENT_TYPES
                .iter()
                .any(|allowed| media_type.eq_ignore_ascii_case(allowed))
            {
                return true;
            }
        }
        let Some((_, extension)) = self.filename.rsplit_once('.') else {
            return false;
        };
        IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    }
}

/// Whether a plain-text message body is a bare link, i.e. a photo submitted as
/// a URL instead of an attachment.
#[must_use]
pub fn looks_like_link(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with("http://") || trimmed.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_blank_form_field_is_rejected() {
        let form = RegistrationForm {
            recruiter: "   ".to_string(),
            ..test_utils::test_form()
        };
        let error = form.validate().unwrap_err();
        assert!(matches!(error, Error::Validation { ref message } if message.contains("Recruiter")));
    }

    #[test]
    fn test_complete_form_passes_validation() {
        assert!(test_utils::test_form().validate().is_ok());
    }

    #[test]
    fn test_text_attachment_is_not_an_image() {
        assert!(!test_utils::text_attachment().is_image());
    }

    #[test]
    fn test_png_extension_accepted_without_content_type() {
        let attachment = AttachmentInfo {
            filename: "Selfie.PNG".to_string(),
            content_type: None,
            url: "https://cdn.example.test/selfie".to_string(),
        };
        assert!(attachment.is_image());
    }

    #[test]
    fn test_content_type_accepted_with_odd_filename() {
        let attachment = AttachmentInfo {
            filename: "photo".to_string(),
            content_type: Some("image/webp; charset=binary".to_string()),
            url: "https://cdn.example.test/photo".to_string(),
        };
        assert!(attachment.is_image());
    }

    #[test]
    fn test_gif_is_outside_the_allow_list() {
        let attachment = AttachmentInfo {
            filename: "clip.gif".to_string(),
            content_type: Some("image/gif".to_string()),
            url: "https://cdn.example.test/clip.gif".to_string(),
        };
        assert!(!attachment.is_image());
    }

    #[test]
    fn test_link_detection() {
        assert!(looks_like_link("https://imgur.com/a/abc123"));
        assert!(looks_like_link("  http://example.com/photo.png "));
        assert!(!looks_like_link("here is my photo"));
        assert!(!looks_like_link(""));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RegistrationStatus::Approved.is_terminal());
        assert!(RegistrationStatus::Rejected.is_terminal());
        assert!(!RegistrationStatus::AwaitingForm.is_terminal());
        assert!(!RegistrationStatus::AwaitingPhoto.is_terminal());
        assert!(!RegistrationStatus::ReadyForReview.is_terminal());
    }
}
