use reqwest::header::HeaderMap;
use reqwest::{multipart, Method};
use serde::Serialize;

use crate::error::{LendkitError, Result};

/// Descriptor for one logical API call.
///
/// Immutable once handed to [`ApiClient::request`](crate::client::ApiClient::request);
/// the retry path rebuilds the wire request from this descriptor rather than
/// reusing a consumed `reqwest` request.
#[derive(Debug)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) body: RequestBody,
    pub(crate) headers: HeaderMap,
    pub(crate) skip_auth: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::None,
            headers: HeaderMap::new(),
            skip_auth: false,
        }
    }

    /// Attach a JSON body, serialized once up front.
    pub fn json(mut self, body: &(impl Serialize + ?Sized)) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a multipart body. The payload keeps its raw parts so the
    /// form can be rebuilt for a retry.
    pub fn multipart(mut self, payload: MultipartPayload) -> Self {
        self.body = RequestBody::Multipart(payload);
        self
    }

    /// Extra headers merged into the request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Bypass bearer-token attachment and the refresh-and-retry path.
    ///
    /// Used for public endpoints: login, registration, password reset,
    /// anonymous share-link lookups.
    pub fn skip_auth(mut self, skip: bool) -> Self {
        self.skip_auth = skip;
        self
    }
}

/// Body of an [`ApiRequest`].
#[derive(Debug)]
pub(crate) enum RequestBody {
    None,
    Json(serde_json::Value),
    Multipart(MultipartPayload),
}

/// Multipart form payload that can produce a fresh `reqwest` form per send.
///
/// `reqwest::multipart::Form` is consumed when sent, so the raw fields are
/// held here and materialized for each attempt. No JSON content type is set
/// for these requests; the transport owns the multipart boundary.
///
/// # Example
/// ```
/// use lendkit::client::MultipartPayload;
///
/// let payload = MultipartPayload::new()
///     .text("title", "Cordless drill")
///     .bytes("photo", vec![0xFF, 0xD8], "drill.jpg", "image/jpeg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    fields: Vec<MultipartField>,
}

#[derive(Debug, Clone)]
enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    Bytes {
        name: String,
        bytes: Vec<u8>,
        file_name: String,
        mime: String,
    },
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(MultipartField::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn bytes(
        mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        self.fields.push(MultipartField::Bytes {
            name: name.into(),
            bytes,
            file_name: file_name.into(),
            mime: mime.into(),
        });
        self
    }

    pub(crate) fn to_form(&self) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for field in &self.fields {
            form = match field {
                MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartField::Bytes {
                    name,
                    bytes,
                    file_name,
                    mime,
                } => {
                    let part = multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime)
                        .map_err(|err| LendkitError::InvalidRequest(err.to_string()))?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// Per-call options for the convenience verbs.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub headers: HeaderMap,
    pub skip_auth: bool,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}
