//! Mapping from sqlx errors to the storage error kinds.

use chatstore_types::error::RepositoryError;
use sqlx::error::ErrorKind;

/// Classify a sqlx error.
///
/// Constraint violations surface as `Constraint`, transport and pool
/// failures as `Connection`, and everything else as `Query`.
pub fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db_err) => match db_err.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => RepositoryError::Constraint(db_err.message().to_string()),
            _ => RepositoryError::Query(err.to_string()),
        },
        sqlx::Error::Configuration(_)
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RepositoryError::Connection(err.to_string()),
        _ => RepositoryError::Query(err.to_string()),
    }
}
