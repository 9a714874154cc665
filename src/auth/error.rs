use thiserror::Error;

/// Failures surfaced by the credential and authorization core.
///
/// Each variant maps to exactly one user-visible status in the HTTP layer. The
/// `Internal` message is for logs only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("username already taken")]
    DuplicateUsername,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Errors raised by persistence adapters behind the store ports.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated")]
    Conflict,
    /// The row addressed by the write no longer exists.
    #[error("row not found")]
    NotFound,
    #[error("store backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

// Registration maps `Conflict` itself; anywhere else a conflict is unexpected.
impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::internal("unexpected unique constraint violation"),
            StoreError::NotFound => Self::NotFound,
            StoreError::Backend(source) => Self::Internal(source.to_string()),
        }
    }
}
