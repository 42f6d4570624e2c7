//! Repository Layer
//!
//! SQLite repositories for all domain entities. Reads and writes that must be
//! atomic with other statements take a `&mut SqliteConnection` so callers can
//! compose them inside one transaction; the store's UNIQUE indexes remain the
//! final arbiter of uniqueness under concurrent requests.

pub mod audit_log;
pub mod campus;
pub mod matricule_counter;
pub mod payment;
pub mod schema;
pub mod user;

pub use audit_log::AuditLogRepository;
pub use campus::CampusRepository;
pub use matricule_counter::MatriculeCounterRepository;
pub use payment::PaymentRepository;
pub use schema::init_schema;
pub use user::UserRepository;

use crate::error::PlatformError;

/// Convert a failed insert into a `Duplicate` error when the store rejected
/// it over a UNIQUE index; everything else stays a database error.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    entity_type: &str,
    field: &str,
    value: &str,
) -> PlatformError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => PlatformError::duplicate(entity_type, field, value),
        _ => PlatformError::Database(err),
    }
}
