//! In-memory booster model and its derived lifecycle.

use thiserror::Error;

use crate::{
    clock::EpochMillis,
    dao::{
        models::{BoosterEntity, BoosterId},
        storage::StorageError,
    },
};

/// Smallest multiplier a booster may carry.
pub const MIN_MULTIPLIER: u8 = 2;

/// Derived lifecycle state; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoosterStatus {
    /// Not activated yet.
    Pending,
    /// Activated and inside its window.
    Active,
    /// Activated and past its window.
    Expired,
}

/// Checking expiry requires an activation instant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoosterStateError {
    /// The booster is still pending.
    #[error("cannot check expiration on booster `{id}` that was not activated")]
    NotActivated {
        /// Pending booster.
        id: BoosterId,
    },
}

/// A time-limited multiplier owned by a player and scoped to a game mode.
///
/// Everything but `activated_at` is fixed at creation. Once set,
/// `activated_at` never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booster {
    /// Store-assigned identifier.
    pub id: BoosterId,
    /// Player name as granted.
    pub owner: String,
    /// Mode the multiplier applies to.
    pub scope: String,
    /// Boost factor, at least [`MIN_MULTIPLIER`].
    pub multiplier: u8,
    /// Length of the activation window.
    pub duration_millis: i64,
    activated_at: Option<EpochMillis>,
}

impl Booster {
    /// Build a pending booster.
    pub fn pending(
        id: BoosterId,
        owner: impl Into<String>,
        scope: impl Into<String>,
        multiplier: u8,
        duration_millis: i64,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            scope: scope.into(),
            multiplier,
            duration_millis,
            activated_at: None,
        }
    }

    /// Activation instant, `None` while pending.
    pub fn activated_at(&self) -> Option<EpochMillis> {
        self.activated_at
    }

    /// True once an activation instant was recorded, even if the window is over.
    pub fn was_activated(&self) -> bool {
        self.activated_at.is_some()
    }

    /// Record the activation instant. Ignored if the booster was already activated.
    pub fn mark_activated(&mut self, at: EpochMillis) {
        if self.activated_at.is_none() {
            self.activated_at = Some(at);
        }
    }

    /// End of the activation window, if activated.
    pub fn expires_at(&self) -> Option<EpochMillis> {
        self.activated_at
            .map(|at| at.saturating_add(self.duration_millis))
    }

    /// Whether the window is over at `now`. Asking on a pending booster is an error.
    pub fn is_expired(&self, now: EpochMillis) -> Result<bool, BoosterStateError> {
        self.expires_at()
            .map(|end| now >= end)
            .ok_or(BoosterStateError::NotActivated { id: self.id })
    }

    /// Lifecycle state at `now`.
    pub fn status(&self, now: EpochMillis) -> BoosterStatus {
        match self.expires_at() {
            None => BoosterStatus::Pending,
            Some(end) if now < end => BoosterStatus::Active,
            Some(_) => BoosterStatus::Expired,
        }
    }

    /// Activated and still inside its window at `now`.
    pub fn is_active(&self, now: EpochMillis) -> bool {
        self.status(now) == BoosterStatus::Active
    }

    /// Time left in the window, zero once expired, `None` while pending.
    pub fn remaining_millis(&self, now: EpochMillis) -> Option<i64> {
        self.expires_at().map(|end| end.saturating_sub(now).max(0))
    }

    /// Suffix appended by game modes to reward messages, e.g. `" (Booster x3 of Alice)"`.
    pub fn message_suffix(&self) -> String {
        format!(" (Booster x{} of {})", self.multiplier, self.owner)
    }

    /// Case-insensitive owner check.
    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner.to_lowercase() == player.to_lowercase()
    }
}

impl TryFrom<BoosterEntity> for Booster {
    type Error = StorageError;

    fn try_from(value: BoosterEntity) -> Result<Self, Self::Error> {
        let multiplier = u8::try_from(value.multiplier)
            .ok()
            .filter(|multiplier| *multiplier >= MIN_MULTIPLIER)
            .ok_or_else(|| StorageError::Corrupted {
                id: value.id,
                reason: format!("multiplier {} is out of range", value.multiplier),
            })?;

        if value.duration_millis <= 0 {
            return Err(StorageError::Corrupted {
                id: value.id,
                reason: format!("duration {}ms is not positive", value.duration_millis),
            });
        }

        if let Some(at) = value
            .activated_at
            .filter(|at| at.checked_add(value.duration_millis).is_none())
        {
            return Err(StorageError::Corrupted {
                id: value.id,
                reason: format!("activation instant {at} is out of range"),
            });
        }

        Ok(Self {
            id: value.id,
            owner: value.player,
            scope: value.scope,
            multiplier,
            duration_millis: value.duration_millis,
            activated_at: value.activated_at,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupted one.
pub fn from_entities(entities: Vec<BoosterEntity>) -> Result<Vec<Booster>, StorageError> {
    entities.into_iter().map(Booster::try_from).collect()
}
