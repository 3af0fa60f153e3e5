//! Lendkit — client SDK for the Lendkit item-lending API
//!
//! Wraps the platform's JSON REST backend behind an authenticated client
//! that attaches bearer access tokens, coordinates token refresh across
//! concurrent requests, and retries a failed request once with the
//! refreshed credentials.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use lendkit::auth::FileTokenStore;
//! use lendkit::client::ApiClient;
//!
//! # async fn example() -> lendkit::error::Result<()> {
//! let store = Arc::new(FileTokenStore::new_default());
//! let client = ApiClient::new("https://api.lendkit.example", store);
//! let items: serde_json::Value = client.get("/api/items/").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
