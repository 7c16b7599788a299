use crate::auth::PasswordError;

/// Failures raised by the stores. Everything not listed as a domain outcome is internal.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    /// Missing entity, or one owned by someone else. The two are never told apart.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound(message.into())
    }
}

/// Maps a storage-level unique violation to `Conflict`; racing writers land here.
pub(crate) fn unique_violation_as(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::conflict(message),
        _ => StoreError::Database(err),
    }
}
