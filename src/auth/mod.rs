//! Credentials, token storage, refresh coordination, and session lifecycle.

pub mod refresh;
pub mod session;
pub mod store;
pub mod token;

pub use refresh::RefreshCoordinator;
pub use session::{AuthSession, RegisterRequest};
pub use store::{FileTokenStore, NoopTokenStore, TokenStore};
pub use token::Credentials;
