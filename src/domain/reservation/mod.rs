//! Reservation aggregate
//!
//! Contains the Reservation entity, its status state machine, confirmation
//! codes, and the repository interface.

pub mod code;
pub mod model;
pub mod repository;
pub mod status;

pub use code::{ConfirmationCode, CODE_ALPHABET, CODE_LENGTH};
pub use model::{NewReservation, Reservation};
pub use repository::ReservationRepository;
pub use status::{ReservationStatus, TransitionError};
