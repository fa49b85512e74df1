use thiserror::Error;

/// Canonical error taxonomy shared by every procedure (unary and streaming).
///
/// Each crate in the workspace defines its own error enum for the failures
/// specific to its domain (`travel-sessions::SessionError`,
/// `travel-users::UserError`, `travel-llm::ProviderError`, ...). At the
/// gateway boundary every one of those converts into exactly one variant
/// here, so `.code()` is never guessed — it is decided once, at the crate
/// that owns the failure, and carried through unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("canceled")]
    Canceled,

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Taxonomy kind string, stable across releases — clients match on this,
    /// not on the Display message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Unauthenticated => "unauthenticated",
            Error::PermissionDenied(_) => "permission_denied",
            Error::NotFound(_) => "not_found",
            Error::ResourceExhausted(_) => "resource_exhausted",
            Error::DeadlineExceeded => "deadline_exceeded",
            Error::Canceled => "canceled",
            Error::Unavailable(_) => "unavailable",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidArgument(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
