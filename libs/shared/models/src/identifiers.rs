use std::fmt;

use serde::{Deserialize, Serialize};

pub type PractitionerId = i64;
pub type ClinicId = i64;

/// Identifier of an editable catalog entity.
///
/// Entities created locally carry a `Temporary` id drawn from the editing
/// session's own sequence until the server assigns a `Permanent` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntityId {
    Temporary(i64),
    Permanent(i64),
}

impl EntityId {
    pub fn is_temporary(&self) -> bool {
        matches!(self, EntityId::Temporary(_))
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, EntityId::Permanent(_))
    }

    pub fn value(&self) -> i64 {
        match self {
            EntityId::Temporary(v) | EntityId::Permanent(v) => *v,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Temporary(v) => write!(f, "tmp:{}", v),
            EntityId::Permanent(v) => write!(f, "{}", v),
        }
    }
}
