//! Periodic re-derivation of the active-booster registry from the store.

use std::collections::HashMap;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::{
    dao::models::{BoosterEntity, BoosterId},
    error::{InvariantAnomaly, ServiceError},
    state::{SharedState, booster::Booster},
};

/// What a single reconciliation run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Boosters newly placed in the registry, by id.
    pub newly_observed: Vec<BoosterId>,
    /// Scopes whose entry was dropped.
    pub removed: Vec<String>,
    /// Duplicate active rows that were skipped.
    pub anomalies: Vec<InvariantAnomaly>,
}

impl ReconcileReport {
    /// True when the run left the registry as it found it.
    pub fn is_unchanged(&self) -> bool {
        self.newly_observed.is_empty() && self.removed.is_empty() && self.anomalies.is_empty()
    }
}

/// Fetch every active booster and converge the registry onto it.
pub async fn reconcile(state: &SharedState) -> Result<ReconcileReport, ServiceError> {
    let store = state.require_booster_store().await?;
    let now = state.now();
    let rows = store.all_active_boosters(now).await?;
    Ok(apply(state, rows))
}

fn apply(state: &SharedState, rows: Vec<BoosterEntity>) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let active = first_per_scope(rows, &mut report.anomalies);
    let registry = state.registry();

    for booster in &active {
        let current = registry.entry(&booster.scope);
        if current.is_some_and(|current| current.id == booster.id) {
            continue;
        }
        state.cache().invalidate(&booster.owner);
        report.newly_observed.push(booster.id);
        registry.put(booster.clone());
    }

    for scope in registry.scopes() {
        if registry.remove_if_absent(&scope, &active).is_some() {
            report.removed.push(scope);
        }
    }

    report
}

/// Keep the first active row per scope, recording the rest as anomalies.
fn first_per_scope(
    rows: Vec<BoosterEntity>,
    anomalies: &mut Vec<InvariantAnomaly>,
) -> Vec<Booster> {
    let mut kept: Vec<Booster> = Vec::with_capacity(rows.len());
    let mut by_scope: HashMap<String, BoosterId> = HashMap::new();

    for row in rows {
        let booster = match Booster::try_from(row) {
            Ok(booster) => booster,
            Err(err) => {
                warn!(error = %err, "skipping unreadable active booster");
                continue;
            }
        };
        if let Some(&kept_id) = by_scope.get(&booster.scope) {
            let anomaly = InvariantAnomaly {
                scope: booster.scope.clone(),
                kept: kept_id,
                skipped: booster.id,
                skipped_owner: booster.owner.clone(),
            };
            error!(%anomaly, "duplicate active booster detected");
            anomalies.push(anomaly);
            continue;
        }
        by_scope.insert(booster.scope.clone(), booster.id);
        kept.push(booster);
    }
    kept
}

/// Run one reconciliation pass plus the cache sweep, containing every failure.
pub async fn run_once(state: &SharedState) {
    let purged = state.cache().purge_stale();
    if purged > 0 {
        debug!(purged, "evicted stale player cache entries");
    }

    if state.is_degraded() {
        debug!("skipping reconciliation while degraded");
        return;
    }

    match reconcile(state).await {
        Ok(report) if report.is_unchanged() => debug!("active boosters already in sync"),
        Ok(report) => info!(
            newly_observed = ?report.newly_observed,
            removed = ?report.removed,
            anomalies = report.anomalies.len(),
            "reconciled active boosters"
        ),
        Err(err) => warn!(error = %err, "active booster reconciliation failed"),
    }
}

/// Reconcile on a fixed period, and immediately whenever storage comes back.
pub async fn run(state: SharedState) {
    let mut ticker = interval(state.config().reconcile_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut degraded = state.degraded_watcher();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = degraded.changed() => {
                if changed.is_err() {
                    break;
                }
                if *degraded.borrow_and_update() {
                    continue;
                }
                ticker.reset();
            }
        }
        run_once(&state).await;
    }
}
