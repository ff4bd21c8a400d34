//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod inventory_repository;
pub mod repository_provider;
pub mod reservation_repository;

pub use inventory_repository::SeaOrmInventoryRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use reservation_repository::SeaOrmReservationRepository;
