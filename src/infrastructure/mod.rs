//! Infrastructure layer for Pulse
//!
//! Storage records, their conversions to domain types, and the repository
//! the application layer reads venues and specials through.

pub mod catalog;
pub mod records;

pub use catalog::{JsonCatalog, VenueRepository};
pub use records::{AddressRecord, CatalogDocument, ScheduleRecord, SpecialRecord, VenueRecord};
