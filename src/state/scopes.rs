use dashmap::DashSet;

/// Scopes registered as activatable in this process.
#[derive(Default)]
pub struct ScopeRegistry {
    scopes: DashSet<String>,
}

impl ScopeRegistry {
    /// Empty registry: no scope accepts activations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the scope was already registered.
    pub fn register(&self, scope: &str) -> bool {
        self.scopes.insert(scope.to_owned())
    }

    /// Returns `false` if the scope was not registered.
    pub fn unregister(&self, scope: &str) -> bool {
        self.scopes.remove(scope).is_some()
    }

    /// Whether activations are accepted for `scope`.
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Registered scopes in lexical order.
    pub fn list(&self) -> Vec<String> {
        let mut scopes: Vec<String> = self
            .scopes
            .iter()
            .map(|scope| scope.key().clone())
            .collect();
        scopes.sort();
        scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister_report_changes() {
        let scopes = ScopeRegistry::new();
        assert!(scopes.register("walls"));
        assert!(!scopes.register("walls"));
        assert!(scopes.register("sky_wars"));
        assert_eq!(scopes.list(), vec!["sky_wars", "walls"]);

        assert!(scopes.unregister("walls"));
        assert!(!scopes.unregister("walls"));
        assert!(!scopes.contains("walls"));
    }
}
