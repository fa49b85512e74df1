pub mod error;
pub mod in_memory;
pub mod repository;
pub mod types;

pub use error::CollabError;
pub use in_memory::InMemoryCollaborators;
pub use repository::{CityRepository, PoiRepository, ProfileRepository, TagRepository};
pub use types::{City, ContentFilter, Poi, Profile};
