//! DTO definitions for the player, scope and admin booster routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    clock::EpochMillis,
    dao::models::BoosterId,
    dto::{format_epoch_millis, validation::validate_scope},
    services::activation_service::ActivationResult,
    state::booster::{Booster, BoosterStatus},
};

/// Lifecycle state exposed to clients. Expired boosters are never listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BoosterStatusDto {
    /// Granted but not activated yet.
    Pending,
    /// Activated and inside its window.
    Active,
}

/// One entry of a player's booster listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoosterSummary {
    /// Booster identifier, used to request activation.
    pub id: BoosterId,
    /// Mode the multiplier applies to.
    pub scope: String,
    /// Boost factor.
    pub multiplier: u8,
    /// Length of the activation window.
    pub duration_millis: i64,
    /// Pending or active.
    pub status: BoosterStatusDto,
    /// True for pending boosters whose scope is registered in this process.
    pub activatable: bool,
    /// RFC 3339 activation instant, absent while pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<String>,
    /// Time left in the window, only for active boosters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_millis: Option<i64>,
}

impl BoosterSummary {
    /// Project a booster, or `None` if it has expired at `now`.
    pub fn project(booster: &Booster, now: EpochMillis, scope_registered: bool) -> Option<Self> {
        let status = match booster.status(now) {
            BoosterStatus::Pending => BoosterStatusDto::Pending,
            BoosterStatus::Active => BoosterStatusDto::Active,
            BoosterStatus::Expired => return None,
        };
        Some(Self {
            id: booster.id,
            scope: booster.scope.clone(),
            multiplier: booster.multiplier,
            duration_millis: booster.duration_millis,
            status,
            activatable: status == BoosterStatusDto::Pending && scope_registered,
            activated_at: booster.activated_at().map(format_epoch_millis),
            remaining_millis: booster
                .remaining_millis(now)
                .filter(|_| status == BoosterStatusDto::Active),
        })
    }
}

/// A player's non-expired boosters, active ones first.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerBoostersResponse {
    /// Player name as requested.
    pub player: String,
    /// Active boosters first, then pending ones.
    pub boosters: Vec<BoosterSummary>,
}

/// Booster currently active for a scope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActiveBoosterSummary {
    /// Booster identifier.
    pub id: BoosterId,
    /// Player who activated it.
    pub owner: String,
    /// Mode being boosted.
    pub scope: String,
    /// Boost factor.
    pub multiplier: u8,
    /// RFC 3339 activation instant.
    pub activated_at: String,
    /// RFC 3339 end of the window.
    pub expires_at: String,
    /// Time left in the window.
    pub remaining_millis: i64,
    /// Text appended by game modes to boosted reward messages.
    pub message_suffix: String,
}

impl ActiveBoosterSummary {
    /// Project an activated booster; `None` for pending ones.
    pub fn project(booster: &Booster, now: EpochMillis) -> Option<Self> {
        let activated_at = booster.activated_at()?;
        let expires_at = booster.expires_at()?;
        Some(Self {
            id: booster.id,
            owner: booster.owner.clone(),
            scope: booster.scope.clone(),
            multiplier: booster.multiplier,
            activated_at: format_epoch_millis(activated_at),
            expires_at: format_epoch_millis(expires_at),
            remaining_millis: expires_at.saturating_sub(now).max(0),
            message_suffix: booster.message_suffix(),
        })
    }
}

/// Discriminant of an activation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivationOutcome {
    /// The booster is now active.
    Activated,
    /// No booster has this id.
    NotFound,
    /// The requester does not own the booster.
    NotOwner,
    /// The booster was activated before.
    AlreadyActivated,
    /// This process does not accept activations for the booster's scope.
    ScopeNotRegistered,
    /// Another booster is already active for the scope.
    ScopeAlreadyActive,
}

/// Activation response; rejections are reported here rather than as HTTP errors.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivationResponse {
    /// What happened to the request.
    pub result: ActivationOutcome,
    /// The activated booster, only when `result` is `activated`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booster: Option<ActiveBoosterSummary>,
}

impl ActivationResponse {
    /// Project a service outcome; `now` drives the remaining time.
    pub fn from_result(result: ActivationResult, now: EpochMillis) -> Self {
        let (result, booster) = match result {
            ActivationResult::Activated(booster) => (
                ActivationOutcome::Activated,
                ActiveBoosterSummary::project(&booster, now),
            ),
            ActivationResult::NotFound => (ActivationOutcome::NotFound, None),
            ActivationResult::NotOwner => (ActivationOutcome::NotOwner, None),
            ActivationResult::AlreadyActivated => (ActivationOutcome::AlreadyActivated, None),
            ActivationResult::ScopeNotRegistered => (ActivationOutcome::ScopeNotRegistered, None),
            ActivationResult::ScopeAlreadyActive => (ActivationOutcome::ScopeAlreadyActive, None),
        };
        Self { result, booster }
    }
}

/// Admin request granting a pending booster to a player.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct GrantBoosterRequest {
    /// Player receiving the booster.
    #[validate(length(min = 1, max = 64))]
    pub player: String,
    /// Mode the multiplier will apply to.
    #[validate(custom(function = "validate_scope"))]
    pub scope: String,
    /// Checked against the configured multiplier bounds.
    pub multiplier: u8,
    /// Checked against the configured maximum duration.
    #[validate(range(min = 1))]
    pub duration_millis: i64,
}

/// Identifier of a freshly granted booster.
#[derive(Debug, Serialize, ToSchema)]
pub struct GrantBoosterResponse {
    /// Store-assigned identifier.
    pub id: BoosterId,
}

/// Scopes registered as activatable in this process.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScopesResponse {
    /// Registered scopes in lexical order.
    pub scopes: Vec<String>,
}

/// Result of registering or unregistering a scope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScopeChangeResponse {
    /// Scope named in the request.
    pub scope: String,
    /// False when the call did not change the registration.
    pub changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(at: EpochMillis) -> Booster {
        let mut booster = Booster::pending(9, "Alice", "sky_wars", 3, 60_000);
        booster.mark_activated(at);
        booster
    }

    #[test]
    fn pending_summary_is_activatable_only_when_scope_registered() {
        let booster = Booster::pending(1, "Alice", "sky_wars", 3, 60_000);
        let summary = BoosterSummary::project(&booster, 0, true).unwrap();
        assert_eq!(summary.status, BoosterStatusDto::Pending);
        assert!(summary.activatable);
        assert!(summary.remaining_millis.is_none());
        let hidden = BoosterSummary::project(&booster, 0, false).unwrap();
        assert!(!hidden.activatable);
    }

    #[test]
    fn expired_boosters_are_not_projected() {
        assert!(BoosterSummary::project(&active(0), 60_000, true).is_none());
        let summary = BoosterSummary::project(&active(0), 15_000, true).unwrap();
        assert_eq!(summary.remaining_millis, Some(45_000));
        assert!(!summary.activatable);
    }

    #[test]
    fn activation_response_serializes_snake_case_outcomes() {
        let rejected = ActivationResponse::from_result(ActivationResult::ScopeAlreadyActive, 0);
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json, serde_json::json!({"result": "scope_already_active"}));

        let accepted =
            ActivationResponse::from_result(ActivationResult::Activated(active(0)), 1_000);
        let booster = accepted.booster.unwrap();
        assert_eq!(booster.remaining_millis, 59_000);
        assert_eq!(booster.message_suffix, " (Booster x3 of Alice)");
        assert_eq!(booster.activated_at, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn grant_request_rejects_malformed_scope() {
        let request = GrantBoosterRequest {
            player: "Alice".into(),
            scope: "sky wars".into(),
            multiplier: 3,
            duration_millis: 1_000,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn grant_request_rejects_blank_player() {
        let request = GrantBoosterRequest {
            player: String::new(),
            scope: "sky_wars".into(),
            multiplier: 3,
            duration_millis: 1_000,
        };
        assert!(request.validate().is_err());
    }
}
