use std::sync::Arc;

use boosters_back::{
    clock::{Clock, ManualClock},
    config::AppConfig,
    dao::{
        booster_store::{BoosterStore, memory::MemoryBoosterStore},
        models::NewBoosterEntity,
    },
    dto::booster::{BoosterStatusDto, GrantBoosterRequest},
    services::{
        activation_service::{ActivationResult, activate},
        booster_service, reconciliation,
    },
    state::{AppState, SharedState},
};

async fn boot() -> (SharedState, MemoryBoosterStore, Arc<ManualClock>) {
    let clock = ManualClock::new(1_700_000_000_000);
    let state = AppState::new(AppConfig::default(), clock.clone());
    let store = MemoryBoosterStore::new();
    state.install_booster_store(Arc::new(store.clone())).await;
    state.scopes().register("sky_wars");
    (state, store, clock)
}

fn grant_request(player: &str) -> GrantBoosterRequest {
    GrantBoosterRequest {
        player: player.into(),
        scope: "sky_wars".into(),
        multiplier: 3,
        duration_millis: 60_000,
    }
}

#[tokio::test]
async fn grant_activate_expire() {
    let (state, _store, clock) = boot().await;
    let id = booster_service::grant(&state, grant_request("Alice"))
        .await
        .unwrap();

    let listing = booster_service::player_boosters(&state, "Alice")
        .await
        .unwrap();
    assert_eq!(listing.boosters.len(), 1);
    assert!(listing.boosters[0].activatable);

    let result = activate(&state, "Alice", id).await.unwrap();
    assert!(result.is_activated());
    let active = booster_service::active_booster(&state, "sky_wars").unwrap();
    assert_eq!((active.id, active.multiplier), (id, 3));
    assert_eq!(active.message_suffix, " (Booster x3 of Alice)");

    let listing = booster_service::player_boosters(&state, "alice")
        .await
        .unwrap();
    assert_eq!(listing.boosters[0].status, BoosterStatusDto::Active);

    clock.advance(60_000);
    assert!(booster_service::active_booster(&state, "sky_wars").is_err());
    let report = reconciliation::reconcile(&state).await.unwrap();
    assert_eq!(report.removed, vec!["sky_wars".to_string()]);
    assert!(
        booster_service::view_player_boosters(&state, "Alice")
            .await
            .unwrap()
            .boosters
            .is_empty()
    );
}

#[tokio::test]
async fn external_duplicate_activation_is_detected_within_one_run() {
    let (state, store, clock) = boot().await;
    let now = clock.now_millis();
    let first = booster_service::grant(&state, grant_request("Alice"))
        .await
        .unwrap();
    let result = activate(&state, "Alice", first).await.unwrap();
    assert!(result.is_activated());

    // Another process sharing the store wins the same race.
    let second = BoosterStore::create_booster(
        &store,
        NewBoosterEntity {
            player: "Bob".into(),
            scope: "sky_wars".into(),
            multiplier: 2,
            duration_millis: 60_000,
        },
    )
    .await
    .unwrap();
    BoosterStore::mark_activated(&store, second, now)
        .await
        .unwrap();

    let report = reconciliation::reconcile(&state).await.unwrap();
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].kept, first);
    assert_eq!(report.anomalies[0].skipped, second);
    let active = booster_service::active_booster(&state, "sky_wars").unwrap();
    assert_eq!(active.id, first);

    assert_eq!(
        activate(&state, "Bob", second).await.unwrap(),
        ActivationResult::AlreadyActivated
    );
}
