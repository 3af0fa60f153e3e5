use serde::Serialize;

use crate::client::{ApiClient, RequestConfig};
use crate::error::Result;

use super::token::Credentials;

/// Session facade: the operations that create and destroy credentials.
///
/// Login and registration go out with auth skipped (there is nothing to
/// attach yet) and persist the token pair the backend returns. Logout only
/// clears local credentials; token revocation is the backend's concern.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use lendkit::auth::{AuthSession, FileTokenStore};
/// use lendkit::client::ApiClient;
///
/// # async fn example() -> lendkit::error::Result<()> {
/// let client = ApiClient::new("https://api.lendkit.example", Arc::new(FileTokenStore::new_default()));
/// let session = AuthSession::new(client);
/// session.login("ada@example.com", "hunter2").await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthSession {
    client: ApiClient,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Fields the registration endpoint requires.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl AuthSession {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange email/password for a token pair and persist it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials> {
        let credentials: Credentials = self
            .client
            .post_with(
                "/api/auth/login/",
                &LoginRequest { email, password },
                RequestConfig::new().skip_auth(),
            )
            .await?;
        self.client.token_store().save(&credentials)?;
        Ok(credentials)
    }

    /// Create an account; the backend logs the new user straight in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Credentials> {
        let credentials: Credentials = self
            .client
            .post_with(
                "/api/auth/register/",
                request,
                RequestConfig::new().skip_auth(),
            )
            .await?;
        self.client.token_store().save(&credentials)?;
        Ok(credentials)
    }

    /// Forget the stored token pair.
    pub fn logout(&self) -> Result<()> {
        self.client.token_store().clear()
    }

    /// Whether a token pair is currently stored.
    pub fn logged_in(&self) -> Result<bool> {
        Ok(self.client.token_store().load()?.is_some())
    }
}
