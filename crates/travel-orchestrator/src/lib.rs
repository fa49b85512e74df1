pub mod navigation;
pub mod orchestrator;
pub mod shared;
pub mod terminal_event;
pub mod worker;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use shared::SharedState;
