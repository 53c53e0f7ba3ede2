pub mod index;
pub mod checker;

pub use index::{build_index, build_index_with_report, AvailabilityIndex};
pub use checker::SlotAvailabilityChecker;
