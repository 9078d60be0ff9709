//! Process-wide filter-set registry.
//!
//! Uses `arc-swap` for lock-free reads. The registry is read-mostly state
//! populated once at startup from configuration; request handling never
//! mutates it.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::FilterSet;

/// Lookup failure for an unregistered filter-set name.
#[derive(Debug, Error)]
#[error("unknown filter set `{0}`")]
pub struct UnknownFilterSet(pub String);

/// Named filter sets in declaration order, with an index for lookup.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    sets: Vec<FilterSet>,
    index: FxHashMap<String, usize>,
}

impl FilterRegistry {
    /// Build from declaration-ordered sets. Names are assumed unique
    /// (enforced by config validation); on collision the first wins.
    pub fn new(sets: Vec<FilterSet>) -> Self {
        let mut index = FxHashMap::default();
        for (i, set) in sets.iter().enumerate() {
            index.entry(set.name.clone()).or_insert(i);
        }
        Self { sets, index }
    }

    /// Resolve a filter set by name.
    pub fn resolve(&self, name: &str) -> Result<&FilterSet, UnknownFilterSet> {
        self.index
            .get(name)
            .map(|&i| &self.sets[i])
            .ok_or_else(|| UnknownFilterSet(name.to_string()))
    }

    /// All sets, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Global registry storage.
static REGISTRY: LazyLock<ArcSwap<FilterRegistry>> =
    LazyLock::new(|| ArcSwap::from_pointee(FilterRegistry::default()));

/// Install the registry at startup.
pub fn init_registry(sets: Vec<FilterSet>) -> Arc<FilterRegistry> {
    let arc = Arc::new(FilterRegistry::new(sets));
    REGISTRY.store(Arc::clone(&arc));
    arc
}

/// Get the current registry.
#[inline]
pub fn registry() -> Arc<FilterRegistry> {
    REGISTRY.load_full()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Step;

    fn set(name: &str) -> FilterSet {
        FilterSet {
            name: name.into(),
            quality: 85,
            format: None,
            steps: vec![Step::StripMetadata],
        }
    }

    #[test]
    fn resolve_finds_registered_sets() {
        let reg = FilterRegistry::new(vec![set("thumbnail"), set("hero")]);
        assert_eq!(reg.resolve("hero").unwrap().name, "hero");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn resolve_unknown_name_fails() {
        let reg = FilterRegistry::new(vec![set("thumbnail")]);
        let err = reg.resolve("nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown filter set `nope`");
    }

    #[test]
    fn iter_preserves_declaration_order() {
        let reg = FilterRegistry::new(vec![set("c"), set("a"), set("b")]);
        let names: Vec<_> = reg.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    // The one test that touches the process-wide handle; everything else
    // works on FilterRegistry values to stay independent of global state.
    #[test]
    fn global_handle_round_trip() {
        init_registry(vec![set("global-check")]);
        let reg = registry();
        assert!(reg.resolve("global-check").is_ok());
        assert!(reg.resolve("missing").is_err());
    }
}
