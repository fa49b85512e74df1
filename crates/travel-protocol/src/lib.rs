pub mod events;
pub mod procedures;
pub mod requests;

pub use events::{EventPayload, StreamEvent};
