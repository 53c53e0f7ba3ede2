pub mod staging;
pub mod reconcile;

pub use staging::StagingStore;
pub use reconcile::{IdMaps, IdentityReconciler};
