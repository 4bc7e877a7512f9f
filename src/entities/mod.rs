//! Database entities for the pantry inventory core.

pub mod category;
pub mod inventory_entry;
pub mod item;
pub mod storage_location;
pub mod usage_log;

pub use inventory_entry::{ExpirationStatus, DEFAULT_EXPIRING_SOON_DAYS};
