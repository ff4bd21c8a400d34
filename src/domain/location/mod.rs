//! Location catalog
//!
//! Locations and their weekly opening hours are static reference data loaded
//! from configuration. The engine only reads them.

pub mod catalog;
pub mod model;

pub use catalog::{LocationCatalog, SharedLocationCatalog};
pub use model::{iso_weekday, weekday_name, Location, OpeningHours};
