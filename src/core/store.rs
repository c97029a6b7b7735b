//! In-memory registration store.
//!
//! Holds every pending registration for the lifetime of the process, together
//! with the reverse index from review channel to owner. Both indices live behind
//! one type so they cannot drift apart; status transitions are validated here,
//! which also guarantees that a photo reference is present before a record can
//! reach `ReadyForReview`.
//!
//! The store has no interior locking: the event model processes one inbound
//! event at a time, and the lifecycle controller wraps the store in a mutex
//! that is never held across an await.

use crate::core::registration::{RegistrationForm, RegistrationRecord, RegistrationStatus};
use crate::errors::{Error, Result};
use poise::serenity_prelude::{ChannelId, UserId};
use std::collections::HashMap;

/// A single mutation applied through [`RegistrationStore::update`].
///
/// Each mutation carries its own status transition, so illegal combinations
/// (e.g. a photo reference without leaving `AwaitingPhoto`) cannot be expressed.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Persist the submitted form fields; `AwaitingForm` -> `AwaitingPhoto`.
    Form(RegistrationForm),
    /// Persist the photo locator; `AwaitingPhoto` -> `ReadyForReview`.
    Photo(String),
}

/// Pending registrations keyed by owner, plus the channel reverse index.
#[derive(Debug, Default)]
pub struct RegistrationStore {
    records: HashMap<UserId, RegistrationRecord>,
    owner_by_channel: HashMap<ChannelId, UserId>,
}

impl RegistrationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh record for `owner` in `AwaitingForm` status.
    ///
    /// Fails with [`Error::DuplicateRequest`] if a request is already pending;
    /// the error carries the existing review channel for the guidance message.
    pub fn create(&mut self, owner: UserId) -> Result<&RegistrationRecord> {
        if let Some(existing) = self.records.get(&owner) {
            return Err(Error::DuplicateRequest {
                channel: existing.channel_id,
            });
        }
        Ok(self
            .records
            .entry(owner)
            .or_insert_with(|| RegistrationRecord::new(owner)))
    }

    /// Looks up the record for `owner`.
    #[must_use]
    pub fn get(&self, owner: UserId) -> Option<&RegistrationRecord> {
        self.records.get(&owner)
    }

    /// Looks up a record through the channel reverse index.
    #[must_use]
    pub fn get_by_channel(&self, channel: ChannelId) -> Option<&RegistrationRecord> {
        self.owner_by_channel
            .get(&channel)
            .and_then(|owner| self.records.get(owner))
    }

    /// Binds the review channel to `owner`'s record and indexes it.
    ///
    /// The binding is one-shot: a record keeps its channel for life.
    pub fn attach_channel(&mut self, owner: UserId, channel: ChannelId) -> Result<()> {
        let record = self.records.get_mut(&owner).ok_or(Error::NotFound)?;
        if record.channel_id.is_some() {
            return Err(Error::InvalidTransition {
                status: record.status,
                event: "attach a second review channel",
            });
        }
        record.channel_id = Some(channel);
        self.owner_by_channel.insert(channel, owner);
        Ok(())
    }

    /// Applies a mutation together with its status transition.
    ///
    /// Fails with [`Error::NotFound`] if no record exists and with
    /// [`Error::InvalidTransition`] if the record is not in the status the
    /// mutation departs from.
    pub fn update(&mut self, owner: UserId, mutation: Mutation) -> Result<&RegistrationRecord> {
        let record = self.records.get_mut(&owner).ok_or(Error::NotFound)?;
        match mutation {
            Mutation::Form(form) => {
                if record.status != RegistrationStatus::AwaitingForm {
                    return Err(Error::InvalidTransition {
                        status: record.status,
                        event: "submit the form",
                    });
                }
                record.form = Some(form);
                record.status = RegistrationStatus::AwaitingPhoto;
            }
            Mutation::Photo(url) => {
                if record.status != RegistrationStatus::AwaitingPhoto {
                    return Err(Error::InvalidTransition {
                        status: record.status,
                        event: "submit a photo",
                    });
                }
                record.photo_url = Some(url);
                record.status = RegistrationStatus::ReadyForReview;
            }
        }
        Ok(&*record)
    }

    /// Removes `owner`'s record and its reverse-index entry.
    ///
    /// Idempotent: deleting an absent record is a no-op returning `None`.
    pub fn delete(&mut self, owner: UserId) -> Option<RegistrationRecord> {
        let record = self.records.remove(&owner)?;
        if let Some(channel) = record.channel_id {
            self.owner_by_channel.remove(&channel);
        }
        Some(record)
    }

    /// Number of pending registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no registration is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn owner() -> UserId {
        UserId::new(101)
    }

    fn channel() -> ChannelId {
        ChannelId::new(7)
    }

    #[test]
    fn test_create_rejects_duplicate() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        let error = store.create(owner()).unwrap_err();
        assert!(matches!(error, Error::DuplicateRequest { channel: None }));
    }

    #[test]
    fn test_duplicate_error_carries_existing_channel() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        store.attach_channel(owner(), channel()).unwrap();
        let error = store.create(owner()).unwrap_err();
        assert!(
            matches!(error, Error::DuplicateRequest { channel: Some(existing) } if existing == channel())
        );
    }

    #[test]
    fn test_channel_index_is_an_inverse() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        store.attach_channel(owner(), channel()).unwrap();

        let record = store.get_by_channel(channel()).unwrap();
        assert_eq!(record.owner_id, owner());
        assert_eq!(record.channel_id, Some(channel()));

        store.delete(owner());
        assert!(store.get_by_channel(channel()).is_none());
    }

    #[test]
    fn test_attach_channel_is_one_shot() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        store.attach_channel(owner(), channel()).unwrap();
        let error = store.attach_channel(owner(), ChannelId::new(8)).unwrap_err();
        assert!(matches!(error, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_form_mutation_advances_to_awaiting_photo() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        let record = store
            .update(owner(), Mutation::Form(test_utils::test_form()))
            .unwrap();
        assert_eq!(record.status, RegistrationStatus::AwaitingPhoto);
        assert!(record.form.is_some());
    }

    #[test]
    fn test_photo_mutation_requires_awaiting_photo() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        let error = store
            .update(owner(), Mutation::Photo("https://cdn.example.test/p.png".to_string()))
            .unwrap_err();
        assert!(matches!(
            error,
            Error::InvalidTransition {
                status: RegistrationStatus::AwaitingForm,
                ..
            }
        ));
    }

    #[test]
    fn test_photo_mutation_sets_reference_and_status() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        store
            .update(owner(), Mutation::Form(test_utils::test_form()))
            .unwrap();
        let record = store
            .update(owner(), Mutation::Photo("https://cdn.example.test/p.png".to_string()))
            .unwrap();
        assert_eq!(record.status, RegistrationStatus::ReadyForReview);
        assert_eq!(record.photo_url.as_deref(), Some("https://cdn.example.test/p.png"));
    }

    #[test]
    fn test_form_cannot_be_submitted_twice() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        store
            .update(owner(), Mutation::Form(test_utils::test_form()))
            .unwrap();
        let error = store
            .update(owner(), Mutation::Form(test_utils::test_form()))
            .unwrap_err();
        assert!(matches!(error, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_update_without_record_is_not_found() {
        let mut store = RegistrationStore::new();
        let error = store
            .update(owner(), Mutation::Form(test_utils::test_form()))
            .unwrap_err();
        assert!(matches!(error, Error::NotFound));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = RegistrationStore::new();
        store.create(owner()).unwrap();
        assert!(store.delete(owner()).is_some());
        assert!(store.delete(owner()).is_none());
        assert!(store.is_empty());
    }
}
