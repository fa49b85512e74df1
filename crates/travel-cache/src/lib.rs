pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::CacheError;
pub use store::CacheStore;
pub use types::{compute_fingerprint, hash_content, CachedGeneration};
