use thiserror::Error;

/// Errors from storage operations (used by trait definitions in chatstore-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backend unreachable. Fatal at startup.
    #[error("database connection error: {0}")]
    Connection(String),

    /// A versioned schema script or its ledger write failed. Fatal at startup.
    #[error("migration {version} failed: {reason}")]
    Migration { version: i64, reason: String },

    #[error("entity not found")]
    NotFound,

    /// Foreign-key, uniqueness, or not-null violation caused by the input.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Any other backend-reported failure.
    #[error("query error: {0}")]
    Query(String),
}

/// Errors from translating an inbound event into stored records.
///
/// Each variant names the step that failed; the underlying storage error is
/// kept as the source.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("chat lookup failed")]
    ChatLookup(#[source] RepositoryError),

    #[error("chat store failed")]
    ChatStore(#[source] RepositoryError),

    #[error("message store failed")]
    MessageStore(#[source] RepositoryError),

    #[error("invalid address '{0}'")]
    InvalidJid(String),
}

impl IngestError {
    /// The storage error behind this failure, if any.
    pub fn repository_error(&self) -> Option<&RepositoryError> {
        match self {
            Self::ChatLookup(e) | Self::ChatStore(e) | Self::MessageStore(e) => Some(e),
            Self::InvalidJid(_) => None,
        }
    }
}
