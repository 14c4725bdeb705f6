use std::collections::HashMap;

/// Assigns table aliases (`X1`, `X2`, …) for one build.
///
/// An alias is never reused within one manager lifetime, so two joins into
/// the same physical table under different keys (self-joins, or independent
/// property paths converging on one table) never collide in the generated
/// SQL. Keys identify a table *instance*, not a table name: resolvers are
/// expected to key by property path plus join step.
#[derive(Debug, Default)]
pub struct TableAliasManager {
    counter: usize,
    by_key: HashMap<String, String>,
    root: Option<String>,
}

impl TableAliasManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The alias of the implicit root table, minted on first use.
    pub fn root_alias(&mut self) -> String {
        if let Some(alias) = &self.root {
            return alias.clone();
        }
        let alias = self.mint();
        self.root = Some(alias.clone());
        alias
    }

    /// Returns the alias previously assigned to `key`, or mints and records
    /// a new one.
    pub fn alias_for(&mut self, key: &str) -> String {
        if let Some(alias) = self.by_key.get(key) {
            return alias.clone();
        }
        let alias = self.mint();
        self.by_key.insert(key.to_string(), alias.clone());
        alias
    }

    /// Mints a disposable alias not tied to any table, for callers that
    /// assemble additional SQL around the translated fragments.
    pub fn new_alias(&mut self) -> String {
        self.mint()
    }

    fn mint(&mut self) -> String {
        self.counter += 1;
        format!("X{}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_memoized_per_key() {
        let mut mgr = TableAliasManager::new();
        let a = mgr.alias_for("rivers#owner");
        let b = mgr.alias_for("rivers#owner");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_keys_get_distinct_aliases_for_same_table() {
        let mut mgr = TableAliasManager::new();
        let a = mgr.alias_for("path1>names");
        let b = mgr.alias_for("path2>names");
        assert_ne!(a, b);
    }

    #[test]
    fn root_alias_is_stable_and_counted() {
        let mut mgr = TableAliasManager::new();
        assert_eq!(mgr.root_alias(), "X1");
        assert_eq!(mgr.alias_for("t"), "X2");
        assert_eq!(mgr.root_alias(), "X1");
        assert_eq!(mgr.new_alias(), "X3");
    }
}
