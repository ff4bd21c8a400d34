use thiserror::Error;

/// Domain-level failures surfaced by the booking engine.
///
/// Every engine operation either succeeds completely or returns one of
/// these without having mutated the ledger or the reservation store.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input, rejected before any mutation.
    #[error("Validation: {0}")]
    Validation(String),

    /// Admission denied. `available` is `None` when no inventory has been
    /// entered for the day yet.
    #[error("{}", capacity_message(.requested, .available))]
    CapacityExceeded {
        requested: u32,
        available: Option<u32>,
    },

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Reservation is already finalized (status: {status})")]
    AlreadyFinalized { status: String },

    /// Unique-key violation inside a store.
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Per-key lock could not be acquired in time. Retryable.
    #[error("Contention: {0}")]
    Contention(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

fn capacity_message(requested: &u32, available: &Option<u32>) -> String {
    match available {
        None => "Reservation not possible: today's inventory has not been entered yet".to_string(),
        Some(available) => format!(
            "Not enough stock: requested {}, only {} available",
            requested, available
        ),
    }
}

impl DomainError {
    /// Whether the operation may succeed if retried unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Contention(_))
    }

    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<InfraError> for DomainError {
    fn from(err: InfraError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
