//! Snapshot merge rules applied at startup.
//!
//! A persisted snapshot is merged with the built-in defaults:
//! persisted entries win on matching ids, defaults missing from the snapshot
//! are appended, entries that only exist in the snapshot are kept, and
//! ephemeral fields are reset.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

/// State slice that is persisted under its own namespace.
pub trait PersistedState: Serialize + DeserializeOwned + Default + Clone + Send + Sync {
    /// Storage namespace, unique per store.
    const NAMESPACE: &'static str;

    /// Combines a persisted snapshot with the built-in defaults.
    fn merge(persisted: Self, defaults: Self) -> Self;

    /// Clears fields that must never survive a reload.
    fn reset_ephemeral(&mut self) {}

    /// Copy of this state suitable for writing to storage.
    fn to_persisted(&self) -> Self {
        let mut copy = self.clone();
        copy.reset_ephemeral();
        copy
    }

    /// Full startup rule: merge, then reset ephemeral fields.
    fn hydrate(persisted: Self) -> Self {
        let mut merged = Self::merge(persisted, Self::default());
        merged.reset_ephemeral();
        merged
    }
}

/// Items that carry a stable identity for merging.
pub trait Identified {
    type Id: Eq + Hash + Clone;

    fn id(&self) -> &Self::Id;
}

/// Merges `persisted` with `defaults` by id, keeping persisted order.
pub fn merge_by_id<T: Identified>(persisted: Vec<T>, defaults: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<T::Id> = HashSet::with_capacity(persisted.len());
    let mut merged = Vec::with_capacity(persisted.len() + defaults.len());

    for item in persisted {
        if seen.insert(item.id().clone()) {
            merged.push(item);
        }
    }
    for item in defaults {
        if seen.insert(item.id().clone()) {
            merged.push(item);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u8,
        label: &'static str,
    }

    impl Identified for Item {
        type Id = u8;

        fn id(&self) -> &u8 {
            &self.id
        }
    }

    fn item(id: u8, label: &'static str) -> Item {
        Item { id, label }
    }

    #[test]
    fn persisted_wins_and_new_defaults_append() {
        let persisted = vec![item(2, "saved"), item(9, "custom")];
        let defaults = vec![item(1, "default"), item(2, "default")];

        let merged = merge_by_id(persisted, defaults);

        assert_eq!(
            merged,
            vec![item(2, "saved"), item(9, "custom"), item(1, "default")]
        );
    }

    #[test]
    fn empty_snapshot_yields_defaults() {
        let defaults = vec![item(1, "a"), item(2, "b")];
        assert_eq!(merge_by_id(vec![], defaults.clone()), defaults);
    }

    fn items() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec((0u8..16).prop_map(|id| item(id, "x")), 0..12)
    }

    proptest! {
        #[test]
        fn merged_ids_are_unique_and_cover_both_inputs(
            persisted in items(),
            defaults in items(),
        ) {
            let merged = merge_by_id(persisted.clone(), defaults.clone());
            let ids: Vec<u8> = merged.iter().map(|i| i.id).collect();
            let unique: HashSet<u8> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len(), unique.len());
            for i in persisted.iter().chain(defaults.iter()) {
                prop_assert!(unique.contains(&i.id));
            }
        }

        #[test]
        fn persisted_entry_wins_for_shared_ids(
            persisted_ids in prop::collection::hash_set(0u8..16, 0..8),
            default_ids in prop::collection::hash_set(0u8..16, 0..8),
        ) {
            let persisted: Vec<Item> = persisted_ids.iter().map(|&id| item(id, "persisted")).collect();
            let defaults: Vec<Item> = default_ids.iter().map(|&id| item(id, "default")).collect();
            let merged = merge_by_id(persisted, defaults);
            for entry in merged {
                if persisted_ids.contains(&entry.id) {
                    prop_assert_eq!(entry.label, "persisted");
                } else {
                    prop_assert_eq!(entry.label, "default");
                }
            }
        }
    }
}
