use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use shared_models::{ClinicId, EntityId};

/// An entity the staging store can hold: identified by [`EntityId`], edited
/// through a partial update, created from an id-less request.
pub trait StagedEntity: Clone + PartialEq + Debug {
    type Patch;
    type Draft;

    fn id(&self) -> EntityId;

    /// Shallow merge: every field set in the patch replaces the current value.
    fn apply_patch(&mut self, patch: &Self::Patch);

    fn from_draft(id: EntityId, draft: Self::Draft) -> Self;
}

/// Business fields that identify the same entity across a save round-trip.
pub trait NaturallyKeyed {
    type Key: PartialEq + Debug;

    fn natural_key(&self) -> Self::Key;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: EntityId,
    pub name: String,
    pub clinic_id: ClinicId,
    pub duration_minutes: u32,
    pub price: Option<f64>,
    pub group_id: Option<EntityId>,
    pub is_active: bool,
}

impl ServiceItem {
    pub fn new(id: EntityId, name: &str, duration_minutes: u32, clinic_id: ClinicId) -> Self {
        Self {
            id,
            name: name.to_string(),
            clinic_id,
            duration_minutes,
            price: None,
            group_id: None,
            is_active: true,
        }
    }
}

// Prices compare with `total_cmp` so a NaN price still equals itself and
// the dirty check can settle.
impl PartialEq for ServiceItem {
    fn eq(&self, other: &Self) -> bool {
        let same_price = match (self.price, other.price) {
            (Some(a), Some(b)) => a.total_cmp(&b).is_eq(),
            (a, b) => a.is_none() && b.is_none(),
        };
        self.id == other.id
            && self.name == other.name
            && self.clinic_id == other.clinic_id
            && self.duration_minutes == other.duration_minutes
            && same_price
            && self.group_id == other.group_id
            && self.is_active == other.is_active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroup {
    pub id: EntityId,
    pub name: String,
    pub clinic_id: ClinicId,
}

impl ServiceGroup {
    pub fn new(id: EntityId, name: &str, clinic_id: ClinicId) -> Self {
        Self {
            id,
            name: name.to_string(),
            clinic_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceItemRequest {
    pub name: String,
    pub clinic_id: ClinicId,
    pub duration_minutes: u32,
    pub price: Option<f64>,
    pub group_id: Option<EntityId>,
}

/// Nullable fields use `Option<Option<_>>`: `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceItemRequest {
    pub name: Option<String>,
    pub clinic_id: Option<ClinicId>,
    pub duration_minutes: Option<u32>,
    pub price: Option<Option<f64>>,
    pub group_id: Option<Option<EntityId>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceGroupRequest {
    pub name: String,
    pub clinic_id: ClinicId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceGroupRequest {
    pub name: Option<String>,
    pub clinic_id: Option<ClinicId>,
}

impl StagedEntity for ServiceItem {
    type Patch = UpdateServiceItemRequest;
    type Draft = CreateServiceItemRequest;

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &UpdateServiceItemRequest) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(clinic_id) = patch.clinic_id {
            self.clinic_id = clinic_id;
        }
        if let Some(duration) = patch.duration_minutes {
            self.duration_minutes = duration;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(group_id) = patch.group_id {
            self.group_id = group_id;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }

    fn from_draft(id: EntityId, draft: CreateServiceItemRequest) -> Self {
        Self {
            id,
            name: draft.name,
            clinic_id: draft.clinic_id,
            duration_minutes: draft.duration_minutes,
            price: draft.price,
            group_id: draft.group_id,
            is_active: true,
        }
    }
}

impl StagedEntity for ServiceGroup {
    type Patch = UpdateServiceGroupRequest;
    type Draft = CreateServiceGroupRequest;

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &UpdateServiceGroupRequest) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(clinic_id) = patch.clinic_id {
            self.clinic_id = clinic_id;
        }
    }

    fn from_draft(id: EntityId, draft: CreateServiceGroupRequest) -> Self {
        Self {
            id,
            name: draft.name,
            clinic_id: draft.clinic_id,
        }
    }
}

// Duration is part of an item's key so a 60 and a 120 minute variant of the
// same service never resolve to each other.
impl NaturallyKeyed for ServiceItem {
    type Key = (String, u32, ClinicId);

    fn natural_key(&self) -> Self::Key {
        (self.name.clone(), self.duration_minutes, self.clinic_id)
    }
}

impl NaturallyKeyed for ServiceGroup {
    type Key = (String, ClinicId);

    fn natural_key(&self) -> Self::Key {
        (self.name.clone(), self.clinic_id)
    }
}

/// What a save has to persist, derived from staging versus baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet<T> {
    pub created: Vec<T>,
    pub updated: Vec<T>,
    pub removed: Vec<EntityId>,
}

impl<T> ChangeSet<T> {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_patch_merges_only_set_fields() {
        let mut item = ServiceItem::new(EntityId::Permanent(1), "Scale and polish", 30, 1);
        item.price = Some(60.0);

        item.apply_patch(&UpdateServiceItemRequest {
            duration_minutes: Some(45),
            ..Default::default()
        });

        assert_eq!(item.duration_minutes, 45);
        assert_eq!(item.name, "Scale and polish");
        assert_eq!(item.price, Some(60.0));
    }

    #[test]
    fn test_item_patch_can_clear_nullable_fields() {
        let mut item = ServiceItem::new(EntityId::Permanent(1), "Whitening", 60, 1);
        item.price = Some(250.0);
        item.group_id = Some(EntityId::Permanent(3));

        item.apply_patch(&UpdateServiceItemRequest {
            price: Some(None),
            group_id: Some(None),
            ..Default::default()
        });

        assert_eq!(item.price, None);
        assert_eq!(item.group_id, None);
    }

    #[test]
    fn test_group_patch() {
        let mut group = ServiceGroup::new(EntityId::Temporary(-1), "Hygiene", 1);
        group.apply_patch(&UpdateServiceGroupRequest {
            name: Some("Hygiene & Prevention".to_string()),
            clinic_id: None,
        });

        assert_eq!(group.name, "Hygiene & Prevention");
        assert_eq!(group.clinic_id, 1);
        assert_eq!(group.id, EntityId::Temporary(-1));
    }

    #[test]
    fn test_natural_keys() {
        let a = ServiceItem::new(EntityId::Temporary(-1), "Deep Cleaning", 120, 1);
        let b = ServiceItem::new(EntityId::Permanent(42), "Deep Cleaning", 120, 1);
        let other_duration = ServiceItem::new(EntityId::Permanent(43), "Deep Cleaning", 60, 1);
        let other_clinic = ServiceItem::new(EntityId::Permanent(44), "Deep Cleaning", 120, 2);

        assert_eq!(a.natural_key(), b.natural_key());
        assert_ne!(a.natural_key(), other_duration.natural_key());
        assert_ne!(a.natural_key(), other_clinic.natural_key());

        let g1 = ServiceGroup::new(EntityId::Temporary(-1), "Surgery", 1);
        let g2 = ServiceGroup::new(EntityId::Permanent(8), "Surgery", 2);
        assert_ne!(g1.natural_key(), g2.natural_key());
    }

    #[test]
    fn test_item_equality_handles_nan_price() {
        let mut a = ServiceItem::new(EntityId::Permanent(1), "Consultation", 30, 1);
        a.price = Some(f64::NAN);
        let mut b = a.clone();

        assert_eq!(a, b);

        b.price = Some(40.0);
        assert_ne!(a, b);
        b.price = None;
        assert_ne!(a, b);
        a.price = None;
        assert_eq!(a, b);
    }

    #[test]
    fn test_change_set_empty() {
        let changes: ChangeSet<ServiceGroup> = ChangeSet::default();
        assert!(changes.is_empty());
    }
}
