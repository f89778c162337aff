//! In-memory table of tracked groups.
//!
//! The registry is volatile and owned by the engine loop, so it needs no lock.
//! It is rebuilt from venue state at start and never read back from a store.

use std::collections::BTreeMap;

use crate::domain::shared::GroupId;

use super::group::SplitOrderGroup;

/// Tracked split order groups keyed by [`GroupId`].
#[derive(Debug, Default, Clone)]
pub struct GroupRegistry {
    groups: BTreeMap<GroupId, SplitOrderGroup>,
}

impl GroupRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a group.
    pub fn insert(&mut self, group: SplitOrderGroup) {
        self.groups.insert(group.id().clone(), group);
    }

    /// Look up a group.
    #[must_use]
    pub fn get(&self, id: &GroupId) -> Option<&SplitOrderGroup> {
        self.groups.get(id)
    }

    /// Look up a group for mutation.
    pub fn get_mut(&mut self, id: &GroupId) -> Option<&mut SplitOrderGroup> {
        self.groups.get_mut(id)
    }

    /// Remove a group.
    pub fn remove(&mut self, id: &GroupId) -> Option<SplitOrderGroup> {
        self.groups.remove(id)
    }

    /// Iterate groups in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SplitOrderGroup> {
        self.groups.values()
    }

    /// Iterate groups mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SplitOrderGroup> {
        self.groups.values_mut()
    }

    /// Snapshot of the tracked ids.
    #[must_use]
    pub fn ids(&self) -> Vec<GroupId> {
        self.groups.keys().cloned().collect()
    }

    /// Number of tracked groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of groups whose TP2 leg has closed.
    #[must_use]
    pub fn tp2_reached_count(&self) -> usize {
        self.groups.values().filter(|g| g.tp2_reached()).count()
    }

    /// Drop every group.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Symbol;
    use crate::domain::split_order::{NewGroup, OrderKind};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn make_group(id: &str) -> SplitOrderGroup {
        SplitOrderGroup::new(NewGroup {
            id: GroupId::new(id),
            symbol: Symbol::new("XAUUSD"),
            order_kind: OrderKind::BuyLimit,
            entry_price: dec!(4100),
            pip_value: dec!(0.10),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn insert_get_remove() {
        let mut registry = GroupRegistry::new();
        registry.insert(make_group("g-1"));
        registry.insert(make_group("g-2"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&GroupId::new("g-1")).is_some());

        let removed = registry.remove(&GroupId::new("g-1"));
        assert!(removed.is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&GroupId::new("g-1")).is_none());
    }

    #[test]
    fn iteration_is_ordered_by_id() {
        let mut registry = GroupRegistry::new();
        registry.insert(make_group("g-b"));
        registry.insert(make_group("g-a"));
        let ids: Vec<_> = registry.iter().map(|g| g.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["g-a", "g-b"]);
    }

    #[test]
    fn counts_tp2_reached() {
        let mut registry = GroupRegistry::new();
        registry.insert(make_group("g-1"));
        registry.insert(make_group("g-2"));
        if let Some(group) = registry.get_mut(&GroupId::new("g-2")) {
            group.mark_tp2_reached();
        }
        assert_eq!(registry.tp2_reached_count(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }
}
