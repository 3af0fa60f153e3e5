use serde::{Deserialize, Serialize};

/// The access/refresh token pair issued by the backend.
///
/// Both tokens are opaque strings. The pair is always stored and cleared as
/// a unit — an access token without a refresh token (or the reverse) is
/// treated as not being logged in at all.
///
/// # Example
/// ```
/// use lendkit::auth::Credentials;
///
/// let creds = Credentials {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
/// };
/// assert_eq!(creds.access_token, "access");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// A copy of these credentials with a replacement access token.
    ///
    /// Used after a successful refresh: the refresh token is reused.
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}
