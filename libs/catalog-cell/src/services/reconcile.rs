// libs/catalog-cell/src/services/reconcile.rs

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use shared_config::{AppConfig, ReconcilePolicy};
use shared_models::EntityId;

use crate::models::{NaturallyKeyed, ServiceGroup, ServiceItem, StagedEntity};

/// Temporary-to-permanent id mappings produced by one reconcile call.
///
/// A temporary id that is missing from a map is still unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMaps {
    pub item_id_map: HashMap<EntityId, EntityId>,
    pub group_id_map: HashMap<EntityId, EntityId>,
}

impl IdMaps {
    pub fn resolve_item(&self, id: EntityId) -> Option<EntityId> {
        self.item_id_map.get(&id).copied()
    }

    pub fn resolve_group(&self, id: EntityId) -> Option<EntityId> {
        self.group_id_map.get(&id).copied()
    }

    /// True when every temporary id among the staged entities has a mapping.
    pub fn is_fully_resolved(&self, staged_items: &[ServiceItem], staged_groups: &[ServiceGroup]) -> bool {
        staged_items
            .iter()
            .filter(|item| item.id.is_temporary())
            .all(|item| self.item_id_map.contains_key(&item.id))
            && staged_groups
                .iter()
                .filter(|group| group.id.is_temporary())
                .all(|group| self.group_id_map.contains_key(&group.id))
    }

    /// Rewrites resolved temporary ids, including each item's group reference.
    /// Unresolved ids are left as they are.
    pub fn apply_to_items(&self, items: &[ServiceItem]) -> Vec<ServiceItem> {
        items
            .iter()
            .map(|item| {
                let mut item = item.clone();
                if let Some(permanent) = self.resolve_item(item.id) {
                    item.id = permanent;
                }
                if let Some(permanent) = item.group_id.and_then(|group| self.resolve_group(group)) {
                    item.group_id = Some(permanent);
                }
                item
            })
            .collect()
    }

    pub fn apply_to_groups(&self, groups: &[ServiceGroup]) -> Vec<ServiceGroup> {
        groups
            .iter()
            .map(|group| {
                let mut group = group.clone();
                if let Some(permanent) = self.resolve_group(group.id) {
                    group.id = permanent;
                }
                group
            })
            .collect()
    }
}

/// Matches locally created entities to their server copies after a save.
///
/// Call only once the persistence response is complete, and before any
/// further edits against the temporary ids being resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReconciler {
    policy: ReconcilePolicy,
}

impl IdentityReconciler {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_policy(config.reconcile_policy)
    }

    pub fn with_policy(policy: ReconcilePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    #[instrument(skip_all, fields(policy = ?self.policy))]
    pub fn reconcile(
        &self,
        staged_items: &[ServiceItem],
        saved_items: &[ServiceItem],
        staged_groups: &[ServiceGroup],
        saved_groups: &[ServiceGroup],
    ) -> IdMaps {
        let maps = IdMaps {
            item_id_map: self.reconcile_collection(staged_items, saved_items),
            group_id_map: self.reconcile_collection(staged_groups, saved_groups),
        };

        info!(
            "Reconciled {} item ids and {} group ids",
            maps.item_id_map.len(),
            maps.group_id_map.len()
        );
        maps
    }

    /// Maps each staged temporary id to a saved permanent id with the same
    /// natural key.
    ///
    /// A saved entity is eligible only if its id is permanent, not already held
    /// by a staged entity, and not claimed by an earlier temporary id in this
    /// call. Among eligible entities, [`ReconcilePolicy::FirstMatch`] takes the
    /// first in response order; [`ReconcilePolicy::UniqueOnly`] maps only when
    /// exactly one is eligible.
    ///
    /// This is stricter than plain first-match: two temporaries sharing a key
    /// with a single saved entity leave the second one unresolved.
    pub fn reconcile_collection<T>(&self, staged: &[T], saved: &[T]) -> HashMap<EntityId, EntityId>
    where
        T: StagedEntity + NaturallyKeyed,
    {
        let held: HashSet<EntityId> = staged
            .iter()
            .map(|entity| entity.id())
            .filter(EntityId::is_permanent)
            .collect();

        let mut claimed: HashSet<EntityId> = HashSet::new();
        let mut id_map = HashMap::new();

        for entity in staged.iter().filter(|entity| entity.id().is_temporary()) {
            let key = entity.natural_key();
            let candidates: Vec<EntityId> = saved
                .iter()
                .filter(|candidate| {
                    let id = candidate.id();
                    id.is_permanent() && !held.contains(&id) && !claimed.contains(&id)
                })
                .filter(|candidate| candidate.natural_key() == key)
                .map(|candidate| candidate.id())
                .collect();

            let chosen = match (self.policy, candidates.as_slice()) {
                (_, []) => None,
                (_, [only]) => Some(*only),
                (ReconcilePolicy::FirstMatch, [first, ..]) => {
                    warn!(
                        "{} saved entities share key {:?}, resolving {} to the first ({})",
                        candidates.len(),
                        key,
                        entity.id(),
                        first
                    );
                    Some(*first)
                }
                (ReconcilePolicy::UniqueOnly, _) => {
                    warn!(
                        "{} saved entities share key {:?}, leaving {} unresolved",
                        candidates.len(),
                        key,
                        entity.id()
                    );
                    None
                }
            };

            match chosen {
                Some(permanent) => {
                    claimed.insert(permanent);
                    id_map.insert(entity.id(), permanent);
                }
                None => debug!("No saved match for {} with key {:?}", entity.id(), key),
            }
        }

        id_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_item(seq: i64, name: &str, duration: u32, clinic: i64) -> ServiceItem {
        ServiceItem::new(EntityId::Temporary(seq), name, duration, clinic)
    }

    fn saved_item(id: i64, name: &str, duration: u32, clinic: i64) -> ServiceItem {
        ServiceItem::new(EntityId::Permanent(id), name, duration, clinic)
    }

    #[test]
    fn test_maps_temporary_item_by_natural_key() {
        let staged = vec![tmp_item(-1, "Deep Cleaning", 120, 1)];
        let saved = vec![
            saved_item(41, "Deep Cleaning", 60, 1),
            saved_item(42, "Deep Cleaning", 120, 1),
        ];

        let maps = IdentityReconciler::default().reconcile(&staged, &saved, &[], &[]);

        assert_eq!(maps.resolve_item(EntityId::Temporary(-1)), Some(EntityId::Permanent(42)));
        assert!(maps.group_id_map.is_empty());
    }

    #[test]
    fn test_no_match_leaves_id_unresolved() {
        let staged = vec![tmp_item(-1, "Deep Cleaning", 120, 1)];
        let saved = vec![saved_item(42, "Deep Cleaning", 120, 2)];

        let maps = IdentityReconciler::default().reconcile(&staged, &saved, &[], &[]);

        assert_eq!(maps.resolve_item(EntityId::Temporary(-1)), None);
        assert!(!maps.is_fully_resolved(&staged, &[]));
    }

    #[test]
    fn test_saved_entities_with_temporary_ids_are_ignored() {
        let staged = vec![tmp_item(-1, "X-Ray", 15, 1)];
        let saved = vec![tmp_item(-1, "X-Ray", 15, 1)];

        let maps = IdentityReconciler::default().reconcile(&staged, &saved, &[], &[]);

        assert!(maps.item_id_map.is_empty());
    }

    #[test]
    fn test_first_match_wins_on_collision() {
        let staged = vec![tmp_item(-1, "Filling", 30, 1)];
        let saved = vec![saved_item(50, "Filling", 30, 1), saved_item(51, "Filling", 30, 1)];

        let first = IdentityReconciler::with_policy(ReconcilePolicy::FirstMatch).reconcile(&staged, &saved, &[], &[]);
        let unique = IdentityReconciler::with_policy(ReconcilePolicy::UniqueOnly).reconcile(&staged, &saved, &[], &[]);

        assert_eq!(first.resolve_item(EntityId::Temporary(-1)), Some(EntityId::Permanent(50)));
        assert_eq!(unique.resolve_item(EntityId::Temporary(-1)), None);
    }

    #[test]
    fn test_existing_permanent_entity_is_not_reused() {
        let staged = vec![saved_item(50, "Filling", 30, 1), tmp_item(-1, "Filling", 30, 1)];
        let saved = vec![saved_item(50, "Filling", 30, 1), saved_item(77, "Filling", 30, 1)];

        for policy in [ReconcilePolicy::FirstMatch, ReconcilePolicy::UniqueOnly] {
            let maps = IdentityReconciler::with_policy(policy).reconcile(&staged, &saved, &[], &[]);
            assert_eq!(maps.resolve_item(EntityId::Temporary(-1)), Some(EntityId::Permanent(77)));
            assert_eq!(maps.item_id_map.len(), 1);
        }
    }

    #[test]
    fn test_claimed_ids_are_not_handed_out_twice() {
        let staged = vec![tmp_item(-1, "Filling", 30, 1), tmp_item(-2, "Filling", 30, 1)];
        let saved = vec![saved_item(60, "Filling", 30, 1), saved_item(61, "Filling", 30, 1)];

        let maps = IdentityReconciler::with_policy(ReconcilePolicy::FirstMatch).reconcile(&staged, &saved, &[], &[]);

        assert_eq!(maps.resolve_item(EntityId::Temporary(-1)), Some(EntityId::Permanent(60)));
        assert_eq!(maps.resolve_item(EntityId::Temporary(-2)), Some(EntityId::Permanent(61)));
    }

    #[test]
    fn test_groups_and_item_references_rewritten() {
        let staged_groups = vec![ServiceGroup::new(EntityId::Temporary(-1), "Hygiene", 1)];
        let saved_groups = vec![ServiceGroup::new(EntityId::Permanent(9), "Hygiene", 1)];
        let mut item = tmp_item(-1, "Scale and polish", 30, 1);
        item.group_id = Some(EntityId::Temporary(-1));
        let staged_items = vec![item];
        let mut saved = saved_item(300, "Scale and polish", 30, 1);
        saved.group_id = Some(EntityId::Permanent(9));
        let saved_items = vec![saved];

        let maps = IdentityReconciler::default().reconcile(&staged_items, &saved_items, &staged_groups, &saved_groups);

        assert!(maps.is_fully_resolved(&staged_items, &staged_groups));
        let items = maps.apply_to_items(&staged_items);
        assert_eq!(items[0].id, EntityId::Permanent(300));
        assert_eq!(items[0].group_id, Some(EntityId::Permanent(9)));
        assert_eq!(maps.apply_to_groups(&staged_groups)[0].id, EntityId::Permanent(9));
    }

    #[test]
    fn test_inputs_not_mutated() {
        let staged = vec![tmp_item(-1, "Deep Cleaning", 120, 1)];
        let saved = vec![saved_item(42, "Deep Cleaning", 120, 1)];
        let staged_before = staged.clone();
        let saved_before = saved.clone();

        let _ = IdentityReconciler::default().reconcile(&staged, &saved, &[], &[]);

        assert_eq!(staged, staged_before);
        assert_eq!(saved, saved_before);
    }
}
