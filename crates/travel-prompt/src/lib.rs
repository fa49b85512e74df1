pub mod builder;
pub mod fingerprint;
pub mod templates;
pub mod types;

pub use builder::PromptBuilder;
pub use fingerprint::user_profile_fingerprint;
pub use types::PartPrompt;
