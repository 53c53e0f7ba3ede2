pub mod models;
pub mod services;

pub use models::*;
pub use services::*;

pub type ServiceItemStore = StagingStore<ServiceItem>;
pub type ServiceGroupStore = StagingStore<ServiceGroup>;
