//! Service layer: all business rules live here. Services validate
//! their own invariants before touching the store and return typed
//! [`crate::errors::ServiceError`] failures.

pub mod categories;
pub mod inventory;
pub mod items;
pub mod locations;
pub mod reports;
pub mod usage;

pub use categories::CategoryService;
pub use inventory::InventoryService;
pub use items::ItemService;
pub use locations::LocationService;
pub use reports::ReportService;
pub use usage::UsageService;
