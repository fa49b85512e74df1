use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollabError {
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<CollabError> for travel_core::Error {
    fn from(e: CollabError) -> Self {
        match e {
            CollabError::NotFound(msg) => travel_core::Error::NotFound(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, CollabError>;
