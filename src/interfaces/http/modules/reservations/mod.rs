//! Reservation endpoints: public booking by confirmation code, staff
//! management and the admin day overview

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
