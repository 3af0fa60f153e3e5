//! Authenticated API client with transparent token refresh.

pub mod http;
mod request;

pub use request::{ApiRequest, MultipartPayload, RequestConfig};

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::refresh::RefreshCoordinator;
use crate::auth::store::TokenStore;
use crate::error::Result;

use request::RequestBody;

const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh/";

/// Client for the Lendkit REST backend.
///
/// Performs one authorized HTTP round-trip per call. When an authorized
/// request comes back 401, the client refreshes the access token through a
/// per-client [`RefreshCoordinator`] shared by all concurrent callers and
/// retries the request exactly once with the new token. Non-success
/// responses are normalized into [`LendkitError::Api`](crate::error::LendkitError::Api);
/// transport failures propagate as
/// [`LendkitError::Network`](crate::error::LendkitError::Network).
///
/// Cloning is cheap; clones share the token store and refresh state.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    refresh_path: String,
    store: Arc<dyn TokenStore>,
    refresh: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Build a client over the process-wide shared transport.
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        Self::with_http_client(http::shared_client().clone(), base_url, store)
    }

    /// Build a client over a caller-provided transport.
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            store,
            refresh: Arc::new(RefreshCoordinator::new()),
        }
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// The token store this client reads and (via refresh) writes.
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    /// Perform one logical API call described by `request`.
    ///
    /// Empty and 204 responses decode `T` from JSON `null`, so no-content
    /// endpoints are called with `T = ()`.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(&request).await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED && !request.skip_auth {
            let refresh_url = self.url_for(&self.refresh_path);
            let refreshed = self
                .refresh
                .refresh(&self.http, &refresh_url, &self.store)
                .await;
            if refreshed {
                tracing::debug!(path = %request.path, "retrying with refreshed token");
                self.send(&request).await?
            } else {
                // Surface the original 401; never retry a second time.
                response
            }
        } else {
            response
        };

        decode(response).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with(path, RequestConfig::new()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(configured(Method::GET, path, config)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.post_with(path, body, RequestConfig::new()).await
    }

    pub async fn post_with<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(configured(Method::POST, path, config).json(body)?)
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.patch_with(path, body, RequestConfig::new()).await
    }

    pub async fn patch_with<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(configured(Method::PATCH, path, config).json(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.delete_with(path, RequestConfig::new()).await
    }

    pub async fn delete_with<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(configured(Method::DELETE, path, config)).await
    }

    /// POST a multipart form. The JSON content type is not set here; the
    /// transport writes the multipart boundary itself.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: MultipartPayload,
    ) -> Result<T> {
        self.upload_with(path, payload, RequestConfig::new()).await
    }

    pub async fn upload_with<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: MultipartPayload,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(configured(Method::POST, path, config).multipart(payload))
            .await
    }

    /// Build and send the wire request for one attempt.
    ///
    /// The bearer token is read from the store per attempt, so a retry after
    /// a refresh picks up the new access token.
    async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let url = self.url_for(&request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());

        builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(payload) => builder.multipart(payload.to_form()?),
        };

        if !request.skip_auth {
            if let Some(credentials) = self.store.load()? {
                builder = builder.bearer_auth(credentials.access_token);
            }
        }

        Ok(builder.send().await?)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn configured(method: Method, path: &str, config: RequestConfig) -> ApiRequest {
    ApiRequest::new(method, path)
        .headers(config.headers)
        .skip_auth(config.skip_auth)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(http::normalize_error_body(status.as_u16(), &body));
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }
    let body = response.text().await?;
    if body.is_empty() {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }
    Ok(serde_json::from_str(&body)?)
}
