pub mod availability;
pub mod health;
pub mod inventory;
pub mod locations;
pub mod metrics;
pub mod reservations;
