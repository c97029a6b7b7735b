//! Shared test utilities for `RosterBuddy`.
//!
//! This module provides the recording mock gateway used by lifecycle tests and
//! small builders for forms and attachments with sensible defaults.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, ChannelId, UserId};

use crate::{
    core::{
        lifecycle::{Gateway, LifecycleController},
        registration::{AttachmentInfo, RegistrationForm, RegistrationRecord, ReviewDecision},
    },
    errors::{Error, Result},
};

/// The member opening requests in tests.
pub fn owner() -> UserId {
    UserId::new(101)
}

/// A second, unrelated member.
pub fn other() -> UserId {
    UserId::new(102)
}

/// The staff member recording decisions.
pub fn reviewer() -> UserId {
    UserId::new(900)
}

/// Everything the mock gateway was asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayAction {
    ChannelCreated { owner: UserId, channel: ChannelId },
    InstructionsPosted { channel: ChannelId },
    ReviewPromptPosted { owner: UserId },
    RoleGranted { owner: UserId },
    OwnerNotified { owner: UserId, decision: ReviewDecision },
    AuditPosted { owner: UserId, decision: ReviewDecision, reviewer: UserId },
    ChannelDeleted { channel: ChannelId },
}

/// In-memory [`Gateway`] that records every action and can be told to fail
/// named operations.
pub struct MockGateway {
    actions: Mutex<Vec<GatewayAction>>,
    failing: Mutex<HashSet<&'static str>>,
    next_channel: AtomicU64,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            next_channel: AtomicU64::new(500),
        }
    }

    /// Makes the named operation fail until [`Self::recover`] is called.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Lets the named operation succeed again.
    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().unwrap().remove(operation);
    }

    /// Snapshot of every recorded action.
    pub fn actions(&self) -> Vec<GatewayAction> {
        self.actions.lock().unwrap().clone()
    }

    /// How many review channels were created.
    pub fn channels_created(&self) -> usize {
        self.actions()
            .iter()
            .filter(|action| matches!(action, GatewayAction::ChannelCreated { .. }))
            .count()
    }

    /// How many channels were deleted.
    pub fn channels_deleted(&self) -> usize {
        self.actions()
            .iter()
            .filter(|action| matches!(action, GatewayAction::ChannelDeleted { .. }))
            .count()
    }

    fn record(&self, action: GatewayAction) {
        self.actions.lock().unwrap().push(action);
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(Error::from(serenity::Error::Other("mock gateway failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn create_review_channel(&self, owner: UserId) -> Result<ChannelId> {
        self.check("create_review_channel")?;
        let channel = ChannelId::new(self.next_channel.fetch_add(1, Ordering::SeqCst));
        self.record(GatewayAction::ChannelCreated { owner, channel });
        Ok(channel)
    }

    async fn post_instructions(&self, channel: ChannelId, _owner: UserId) -> Result<()> {
        self.check("post_instructions")?;
        self.record(GatewayAction::InstructionsPosted { channel });
        Ok(())
    }

    async fn post_review_prompt(&self, record: &RegistrationRecord) -> Result<()> {
        self.check("post_review_prompt")?;
        self.record(GatewayAction::ReviewPromptPosted {
            owner: record.owner_id,
        });
        Ok(())
    }

    async fn grant_member_role(&self, owner: UserId) -> Result<()> {
        self.check("grant_member_role")?;
        self.record(GatewayAction::RoleGranted { owner });
        Ok(())
    }

    async fn notify_owner(&self, owner: UserId, decision: ReviewDecision) -> Result<()> {
        self.check("notify_owner")?;
        self.record(GatewayAction::OwnerNotified { owner, decision });
        Ok(())
    }

    async fn post_audit_entry(
        &self,
        record: &RegistrationRecord,
        decision: ReviewDecision,
        reviewer: UserId,
    ) -> Result<()> {
        self.check("post_audit_entry")?;
        self.record(GatewayAction::AuditPosted {
            owner: record.owner_id,
            decision,
            reviewer,
        });
        Ok(())
    }

    async fn delete_review_channel(&self, channel: ChannelId) -> Result<()> {
        self.check("delete_review_channel")?;
        self.record(GatewayAction::ChannelDeleted { channel });
        Ok(())
    }
}

/// Builds a controller around a fresh mock gateway.
pub fn controller(expiry: Option<Duration>) -> Arc<LifecycleController<MockGateway>> {
    LifecycleController::new(MockGateway::new(), expiry)
}

/// A complete, valid registration form.
pub fn test_form() -> RegistrationForm {
    RegistrationForm {
        player_id: "4821".to_string(),
        display_name: "Shadow".to_string(),
        recruiter: "Falcon".to_string(),
        recruited_on: "23/02/2026".to_string(),
    }
}

/// A valid png attachment.
pub fn png_attachment() -> AttachmentInfo {
    AttachmentInfo {
        filename: "photo.png".to_string(),
        content_type: Some("image/png".to_string()),
        url: "https://cdn.example.test/photo.png".to_string(),
    }
}

/// A plain-text attachment that must never count as a photo.
pub fn text_attachment() -> AttachmentInfo {
    AttachmentInfo {
        filename: "notes.txt".to_string(),
        content_type: Some("text/plain".to_string()),
        url: "https://cdn.example.test/notes.txt".to_string(),
    }
}
