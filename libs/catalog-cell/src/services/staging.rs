// libs/catalog-cell/src/services/staging.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use shared_models::EntityId;

use crate::models::{ChangeSet, StagedEntity};

/// Working copy of an editable entity collection for one editing session.
///
/// `baseline` is the last server-confirmed state and doubles as the committed
/// view; `staging` is what the editor sees. Right after [`initialize`],
/// [`save`] or [`discard`] the two are equal and the store is clean.
///
/// Mutators take `&mut self`; callers sharing a store between tasks must
/// serialise access themselves (e.g. behind a mutex).
///
/// [`initialize`]: StagingStore::initialize
/// [`save`]: StagingStore::save
/// [`discard`]: StagingStore::discard
#[derive(Debug, Clone)]
pub struct StagingStore<T: StagedEntity> {
    baseline: Vec<T>,
    staging: Vec<T>,
    is_dirty: bool,
    // magnitude of the last temporary id handed out
    last_temporary: i64,
}

impl<T: StagedEntity> Default for StagingStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StagedEntity> StagingStore<T> {
    pub fn new() -> Self {
        Self {
            baseline: Vec::new(),
            staging: Vec::new(),
            is_dirty: false,
            last_temporary: 0,
        }
    }

    pub fn with_entities(entities: Vec<T>) -> Self {
        let mut store = Self::new();
        store.initialize(entities);
        store
    }

    /// Replaces all three views with `entities` and marks the store clean.
    pub fn initialize(&mut self, entities: Vec<T>) {
        // Unresolved temporaries can come back from a previous session.
        self.last_temporary = entities
            .iter()
            .filter_map(|entity| match entity.id() {
                EntityId::Temporary(v) => Some(v.saturating_abs()),
                EntityId::Permanent(_) => None,
            })
            .max()
            .unwrap_or(0);

        self.baseline = entities.clone();
        self.staging = entities;
        self.is_dirty = false;

        debug!("Staging store initialized with {} entities", self.baseline.len());
    }

    /// Shallow-merges `patch` into the staged entity with `id`. Returns `false`
    /// and changes nothing when no such entity is staged.
    pub fn update_staged(&mut self, id: EntityId, patch: &T::Patch) -> bool {
        let Some(entity) = self.staging.iter_mut().find(|entity| entity.id() == id) else {
            debug!("Ignoring update for unknown staged entity {}", id);
            return false;
        };

        entity.apply_patch(patch);
        self.refresh_dirty();
        true
    }

    /// Stages a new entity under the next temporary id (-1, -2, ...).
    pub fn stage_new(&mut self, draft: T::Draft) -> EntityId {
        if self.last_temporary == i64::MAX {
            warn!("Temporary id sequence exhausted, reusing {}", EntityId::Temporary(-i64::MAX));
        }
        self.last_temporary = self.last_temporary.saturating_add(1);
        let id = EntityId::Temporary(-self.last_temporary);

        self.staging.push(T::from_draft(id, draft));
        self.refresh_dirty();

        debug!("Staged new entity {}", id);
        id
    }

    pub fn remove_staged(&mut self, id: EntityId) -> bool {
        let before = self.staging.len();
        self.staging.retain(|entity| entity.id() != id);

        let removed = self.staging.len() != before;
        if removed {
            self.refresh_dirty();
        }
        removed
    }

    /// Acknowledges a successful external save: staging becomes the new baseline.
    pub fn save(&mut self) {
        self.baseline = self.staging.clone();
        self.is_dirty = false;

        info!("Staging saved, baseline now holds {} entities", self.baseline.len());
    }

    pub fn discard(&mut self) {
        self.staging = self.baseline.clone();
        self.is_dirty = false;

        debug!("Staged changes discarded");
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn baseline(&self) -> &[T] {
        &self.baseline
    }

    pub fn committed(&self) -> &[T] {
        &self.baseline
    }

    pub fn staging(&self) -> &[T] {
        &self.staging
    }

    pub fn get_staged(&self, id: EntityId) -> Option<&T> {
        self.staging.iter().find(|entity| entity.id() == id)
    }

    pub fn get_baseline(&self, id: EntityId) -> Option<&T> {
        self.baseline.iter().find(|entity| entity.id() == id)
    }

    /// Created, updated and removed entities relative to the baseline, in
    /// staging order (removals in baseline order).
    pub fn pending_changes(&self) -> ChangeSet<T> {
        let baseline: HashMap<EntityId, &T> =
            self.baseline.iter().map(|entity| (entity.id(), entity)).collect();

        let mut changes = ChangeSet::default();

        for entity in &self.staging {
            match baseline.get(&entity.id()) {
                None => changes.created.push(entity.clone()),
                Some(original) if *original != entity => changes.updated.push(entity.clone()),
                Some(_) => {}
            }
        }

        changes.removed = self
            .baseline
            .iter()
            .map(|entity| entity.id())
            .filter(|id| self.get_staged(*id).is_none())
            .collect();

        changes
    }

    fn refresh_dirty(&mut self) {
        self.is_dirty = !same_entities(&self.staging, &self.baseline);
    }
}

/// Order-independent structural equality, pairing entities by id.
fn same_entities<T: StagedEntity>(left: &[T], right: &[T]) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let mut left: Vec<&T> = left.iter().collect();
    let mut right: Vec<&T> = right.iter().collect();
    left.sort_by_key(|entity| entity.id());
    right.sort_by_key(|entity| entity.id());

    left.iter()
        .zip(right.iter())
        .all(|(a, b)| a.id() == b.id() && a == b)
}
