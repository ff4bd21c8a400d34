//! Database entities module

pub mod daily_inventory;
pub mod reservation;

pub use daily_inventory::Entity as DailyInventory;
pub use reservation::Entity as Reservation;
