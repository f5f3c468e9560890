//! Process-wide view of the booster currently active for each scope.

use dashmap::DashMap;

use crate::{clock::EpochMillis, state::booster::Booster};

/// Scope → active booster map read on the hot path without touching storage.
///
/// Entries are a derived cache of the store. Expired entries are not evicted
/// eagerly; [`lookup`](Self::lookup) hides them and reconciliation removes them.
#[derive(Default)]
pub struct ActiveBoosterRegistry {
    by_scope: DashMap<String, Booster>,
}

impl ActiveBoosterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Active booster for `scope`, or `None` if absent or expired at `now`.
    pub fn lookup(&self, scope: &str, now: EpochMillis) -> Option<Booster> {
        self.by_scope
            .get(scope)
            .filter(|entry| entry.is_active(now))
            .map(|entry| entry.value().clone())
    }

    /// Raw entry regardless of expiry.
    pub fn entry(&self, scope: &str) -> Option<Booster> {
        self.by_scope.get(scope).map(|entry| entry.value().clone())
    }

    /// Insert or replace the entry for the booster's scope, returning the previous one.
    pub fn put(&self, booster: Booster) -> Option<Booster> {
        self.by_scope.insert(booster.scope.clone(), booster)
    }

    /// Drop the entry for `scope` unless one of `active` still covers it.
    pub fn remove_if_absent(&self, scope: &str, active: &[Booster]) -> Option<Booster> {
        if active.iter().any(|booster| booster.scope == scope) {
            return None;
        }
        self.by_scope.remove(scope).map(|(_, booster)| booster)
    }

    /// Scopes that currently have an entry, expired or not.
    pub fn scopes(&self) -> Vec<String> {
        self.by_scope
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Every entry still active at `now`, ordered by scope.
    pub fn snapshot(&self, now: EpochMillis) -> Vec<Booster> {
        let mut active: Vec<Booster> = self
            .by_scope
            .iter()
            .filter(|entry| entry.is_active(now))
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by(|a, b| a.scope.cmp(&b.scope));
        active
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.by_scope.len()
    }

    /// True when no scope has an entry.
    pub fn is_empty(&self) -> bool {
        self.by_scope.is_empty()
    }
}
