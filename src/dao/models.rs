use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a booster row.
pub type BoosterId = i64;

/// Booster row as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoosterEntity {
    /// Auto-incremented primary key.
    pub id: BoosterId,
    /// Player that owns the booster, as originally written.
    pub player: String,
    /// Mode/feature identifier the multiplier applies to.
    pub scope: String,
    /// Boost factor.
    pub multiplier: i32,
    /// Length of the activation window.
    pub duration_millis: i64,
    /// Activation instant in epoch milliseconds; `None` while pending.
    pub activated_at: Option<i64>,
}

/// Insert payload for a freshly granted (pending) booster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoosterEntity {
    /// Owner as typed by the admin.
    pub player: String,
    /// Mode the multiplier applies to.
    pub scope: String,
    /// Boost factor.
    pub multiplier: i32,
    /// Length of the activation window.
    pub duration_millis: i64,
}

impl NewBoosterEntity {
    /// Materialise the row once the store has assigned an id.
    pub fn into_entity(self, id: BoosterId) -> BoosterEntity {
        BoosterEntity {
            id,
            player: self.player,
            scope: self.scope,
            multiplier: self.multiplier,
            duration_millis: self.duration_millis,
            activated_at: None,
        }
    }
}

/// Lower-cased owner key used for case-insensitive player matching.
pub fn player_key(player: &str) -> String {
    player.to_lowercase()
}

/// True when the row is activated and its window still covers `now`.
pub fn is_live_at(entity: &BoosterEntity, now: i64) -> bool {
    entity
        .activated_at
        .is_some_and(|at| now < at.saturating_add(entity.duration_millis))
}
