pub mod error;
pub mod identifiers;

pub use error::ValidationError;
pub use identifiers::{ClinicId, EntityId, PractitionerId};
