pub mod auth;
pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use auth::TokenIssuer;
pub use error::UserError;
pub use store::UserStore;
pub use types::{Claims, IssuedTokens, User};
