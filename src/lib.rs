//! # Foodtruck Booking
//!
//! Daily inventory and reservation allocation for a foodtruck that parks at
//! a different location each weekday. Staff enter the day's stock of
//! grilled chicken; customers reserve units for same-day pickup; the
//! engine guarantees a location's day is never overbooked, even under
//! concurrent requests.
//!
//! ## Architecture
//!
//! - **domain**: Locations, the daily ledger row, reservations and their
//!   status machine, repository traits
//! - **application**: Per-key lock arena, capacity ledger, allocation engine
//!   and availability projector
//! - **infrastructure**: In-memory and SeaORM/SQLite storage, API key hashing
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: Error taxonomy, clock, retry and shutdown helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export storage setup for easy access
pub use infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::create_api_router;
