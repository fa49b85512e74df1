use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The producer closure for a fingerprint returned an error; carried
    /// verbatim so the caller's error taxonomy survives the single-flight.
    #[error("generation failed for {fingerprint}: {message}")]
    ProducerFailed { fingerprint: String, message: String },
}

pub type Result<T> = std::result::Result<T, CacheError>;

impl From<CacheError> for travel_core::Error {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Database(err) => travel_core::Error::Unavailable(err.to_string()),
            CacheError::ProducerFailed { fingerprint, message } => {
                travel_core::Error::Unavailable(format!("{fingerprint}: {message}"))
            }
        }
    }
}
