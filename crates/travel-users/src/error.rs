use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token is malformed or has an invalid signature")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    /// A refresh token was presented as the wrong kind, or has been revoked.
    #[error("token revoked or wrong kind")]
    TokenRejected,
}

pub type Result<T> = std::result::Result<T, UserError>;

impl From<UserError> for travel_core::Error {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(id) => travel_core::Error::NotFound(format!("user {id}")),
            UserError::EmailTaken(email) => {
                travel_core::Error::InvalidArgument(format!("email already registered: {email}"))
            }
            UserError::Database(err) => travel_core::Error::Unavailable(err.to_string()),
            UserError::InvalidCredentials => travel_core::Error::Unauthenticated,
            UserError::Hash(msg) => travel_core::Error::Internal(msg),
            UserError::TokenInvalid | UserError::TokenExpired | UserError::TokenRejected => {
                travel_core::Error::Unauthenticated
            }
        }
    }
}
