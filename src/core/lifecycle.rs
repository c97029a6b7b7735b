//! Registration lifecycle controller.
//!
//! Drives the state machine in response to inbound platform events and is the
//! sole mutator of the [`RegistrationStore`]. All outbound platform actions go
//! through the [`Gateway`] trait, so the whole lifecycle can be exercised in
//! tests without a live gateway connection.
//!
//! Failure policy: store-level contract violations surface to the triggering
//! user and are never fatal. Outbound actions split into critical steps
//! (creating the review channel, posting the review prompt), which abort the
//! operation, and best-effort steps (role grant, notifications, channel
//! teardown), which are logged and suppressed. A transition already committed
//! to the store is never rolled back.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, UserId};
use tokio::{sync::Mutex, task::AbortHandle};
use tracing::{debug, info, warn};

use crate::{
    core::{
        registration::{
            AttachmentInfo, RegistrationForm, RegistrationRecord, RegistrationStatus,
            ReviewDecision,
        },
        store::{Mutation, RegistrationStore},
    },
    errors::{Error, Result},
};

/// Outbound platform actions the lifecycle needs.
///
/// Implemented by the Discord layer in production and by a recording mock in
/// tests.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Creates the private review channel for `owner` and returns its id.
    async fn create_review_channel(&self, owner: UserId) -> Result<ChannelId>;
    /// Posts the welcome/instructions message into a fresh review channel.
    async fn post_instructions(&self, channel: ChannelId, owner: UserId) -> Result<()>;
    /// Posts the review prompt with approve/reject controls.
    async fn post_review_prompt(&self, record: &RegistrationRecord) -> Result<()>;
    /// Grants the member role to `owner`.
    async fn grant_member_role(&self, owner: UserId) -> Result<()>;
    /// Direct-messages `owner` about the decision.
    async fn notify_owner(&self, owner: UserId, decision: ReviewDecision) -> Result<()>;
    /// Posts the decision to the audit-log channel.
    async fn post_audit_entry(
        &self,
        record: &RegistrationRecord,
        decision: ReviewDecision,
        reviewer: UserId,
    ) -> Result<()>;
    /// Deletes a review channel.
    async fn delete_review_channel(&self, channel: ChannelId) -> Result<()>;
}

/// The state-transition logic invoked by inbound events.
pub struct LifecycleController<G> {
    gateway: G,
    store: Mutex<RegistrationStore>,
    expiry: Option<Duration>,
    timers: Mutex<HashMap<UserId, AbortHandle>>,
    // Handle back to ourselves so expiry timers can re-enter the controller.
    weak_self: Weak<LifecycleController<G>>,
}

impl<G: Gateway> LifecycleController<G> {
    /// Creates a shared controller with an empty store.
    ///
    /// When `expiry` is set, every request is abandoned automatically after
    /// that duration unless a decision lands first.
    pub fn new(gateway: G, expiry: Option<Duration>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            gateway,
            store: Mutex::new(RegistrationStore::new()),
            expiry,
            timers: Mutex::new(HashMap::new()),
            weak_self: weak_self.clone(),
        })
    }

    /// Read access to the outbound gateway.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Snapshot of the record for `owner`, if any.
    pub async fn record_for(&self, owner: UserId) -> Option<RegistrationRecord> {
        self.store.lock().await.get(owner).cloned()
    }

    /// Snapshot of the record owning `channel`, if any.
    pub async fn record_for_channel(&self, channel: ChannelId) -> Option<RegistrationRecord> {
        self.store.lock().await.get_by_channel(channel).cloned()
    }

    /// Number of pending registrations.
    pub async fn pending_count(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Opens a registration request for `owner`.
    ///
    /// Reserves the record first, so a concurrent second request conflicts
    /// before any channel exists; creating the review channel is critical and
    /// releases the reservation on failure so the user can retry.
    pub async fn open_request(&self, owner: UserId) -> Result<ChannelId> {
        self.store.lock().await.create(owner).map(|_| ())?;
        info!(owner = owner.get(), "opened registration request");

        let channel = match self.gateway.create_review_channel(owner).await {
            Ok(channel) => channel,
            Err(error) => {
                self.store.lock().await.delete(owner);
                return Err(error);
            }
        };
        if let Err(error) = self.store.lock().await.attach_channel(owner, channel) {
            // The reservation vanished while the channel was being created;
            // tear the orphan channel down again.
            if let Err(delete_error) = self.gateway.delete_review_channel(channel).await {
                warn!(
                    channel = channel.get(),
                    error = %delete_error,
                    "failed to delete orphaned review channel"
                );
            }
            return Err(error);
        }

        if let Err(error) = self.gateway.post_instructions(channel, owner).await {
            warn!(owner = owner.get(), %error, "failed to post instructions");
        }
        self.schedule_expiry(owner).await;
        Ok(channel)
    }

    /// Records the submitted form fields for `owner`.
    pub async fn submit_form(&self, owner: UserId, form: RegistrationForm) -> Result<()> {
        form.validate()?;
        self.store
            .lock()
            .await
            .update(owner, Mutation::Form(form))
            .map(|_| ())?;
        info!(owner = owner.get(), "registration form received");
        Ok(())
    }

    /// Records a photo submission arriving in a review channel.
    ///
    /// Messages in channels without a record, or from anyone but the owner,
    /// are ignored. A non-image attachment fails validation without a state
    /// change. On success the review prompt is posted; the committed
    /// transition stands even if that post fails.
    pub async fn submit_photo(
        &self,
        channel: ChannelId,
        issuer: UserId,
        attachment: &AttachmentInfo,
    ) -> Result<()> {
        let record = {
            let mut store = self.store.lock().await;
            let Some(record) = store.get_by_channel(channel) else {
                debug!(
                    channel = channel.get(),
                    "attachment in channel with no pending registration"
                );
                return Ok(());
            };
            if record.owner_id != issuer {
                return Ok(());
            }
            if record.status != RegistrationStatus::AwaitingPhoto {
                return Err(Error::InvalidTransition {
                    status: record.status,
                    event: "submit a photo",
                });
            }
            if !attachment.is_image() {
                return Err(Error::Validation {
                    message: "Only png, jpg, jpeg or webp images are accepted.".to_string(),
                });
            }
            store
                .update(issuer, Mutation::Photo(attachment.url.clone()))?
                .clone()
        };
        info!(owner = issuer.get(), "photo received, ready for review");
        self.gateway.post_review_prompt(&record).await?;
        Ok(())
    }

    /// Records a reviewer decision for `target`'s request.
    ///
    /// Returns `Ok(None)` when no record exists (a stale button on a prompt
    /// that outlived its record); that case is ignored, not an error. On a
    /// real decision the record leaves the store in the same operation, and
    /// every follow-up effect is best-effort.
    pub async fn decide(
        &self,
        issuer: UserId,
        issuer_is_reviewer: bool,
        target: UserId,
        decision: ReviewDecision,
    ) -> Result<Option<RegistrationRecord>> {
        if !issuer_is_reviewer {
            return Err(Error::PermissionDenied);
        }
        let record = {
            let mut store = self.store.lock().await;
            match store.get(target) {
                None => return Ok(None),
                Some(record) if record.status != RegistrationStatus::ReadyForReview => {
                    return Err(Error::InvalidTransition {
                        status: record.status,
                        event: "record a decision",
                    });
                }
                Some(_) => {}
            }
            let Some(record) = store.delete(target) else {
                return Ok(None);
            };
            record
        };
        self.cancel_expiry(target).await;
        info!(
            owner = target.get(),
            reviewer = issuer.get(),
            %decision,
            "registration decided"
        );

        if decision == ReviewDecision::Approved {
            if let Err(error) = self.gateway.grant_member_role(target).await {
                warn!(owner = target.get(), %error, "failed to grant member role");
            }
        }
        if let Err(error) = self.gateway.notify_owner(target, decision).await {
            warn!(owner = target.get(), %error, "failed to notify owner of decision");
        }
        if let Err(error) = self.gateway.post_audit_entry(&record, decision, issuer).await {
            warn!(owner = target.get(), %error, "failed to post audit entry");
        }
        if let Some(channel) = record.channel_id {
            if let Err(error) = self.gateway.delete_review_channel(channel).await {
                warn!(channel = channel.get(), %error, "failed to delete review channel");
            }
        }
        Ok(Some(record))
    }

    /// Abandons `owner`'s request after the configured duration elapsed.
    ///
    /// A request that was already finalized (or never existed) is a no-op, so
    /// a decision racing the timer is harmless.
    pub async fn expire(&self, owner: UserId) -> Result<()> {
        self.timers.lock().await.remove(&owner);
        let Some(record) = self.store.lock().await.delete(owner) else {
            return Ok(());
        };
        info!(
            owner = owner.get(),
            status = %record.status,
            "registration request expired"
        );
        if let Some(channel) = record.channel_id {
            if let Err(error) = self.gateway.delete_review_channel(channel).await {
                warn!(
                    channel = channel.get(),
                    %error,
                    "failed to delete expired review channel"
                );
            }
        }
        Ok(())
    }

    async fn schedule_expiry(&self, owner: UserId) {
        let Some(expiry) = self.expiry else {
            return;
        };
        let Some(controller) = self.weak_self.upgrade() else {
            return;
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            if let Err(error) = controller.expire(owner).await {
                warn!(owner = owner.get(), %error, "registration expiry failed");
            }
        });
        if let Some(previous) = self
            .timers
            .lock()
            .await
            .insert(owner, task.abort_handle())
        {
            previous.abort();
        }
    }

    async fn cancel_expiry(&self, owner: UserId) {
        if let Some(handle) = self.timers.lock().await.remove(&owner) {
            handle.abort();
        }
    }
}
