use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {session_id}")]
    NotFound { session_id: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// `append_message` on a session whose status is no longer `active`.
    #[error("session {session_id} is not active")]
    NotActive { session_id: String },

    /// `update_context` lost the optimistic check on `updated_at`.
    #[error("session {session_id} was modified concurrently")]
    StaleUpdate { session_id: String },
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl From<SessionError> for travel_core::Error {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound { session_id } => {
                travel_core::Error::NotFound(format!("session {session_id}"))
            }
            SessionError::Database(err) => travel_core::Error::Unavailable(err.to_string()),
            SessionError::NotActive { session_id } => {
                travel_core::Error::PermissionDenied(format!("session {session_id} is not active"))
            }
            SessionError::StaleUpdate { session_id } => {
                travel_core::Error::InvalidArgument(format!("session {session_id} changed concurrently"))
            }
        }
    }
}
