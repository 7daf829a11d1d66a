// crates/dataprep-core/src/http.rs
// ============================================================================
// Module: Dataprep HTTP Plumbing
// Description: Blocking request executor shared by every fixture wrapper.
// Purpose: Build, authenticate, send, and classify one request per call.
// Dependencies: reqwest, serde, serde_json, tracing, url
// ============================================================================

//! ## Overview
//! [`HttpClient`] executes a [`RestRequest`] synchronously with basic
//! authentication, reads the bounded body, and releases the connection before
//! returning a [`RestResponse`]. Wrappers then branch on the status code with
//! [`RestResponse::into_outcome`] or [`RestResponse::require_status`].
//! Invariants:
//! - HTTP 401 is mapped to [`DataPrepError::Unauthorized`] for every request.
//! - No idle connections are pooled between calls.
//! - Redirects are never followed; callers see the 3xx status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::multipart::Part;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use tracing::warn;
use url::Url;
use url::form_urlencoded;

use crate::error::DataPrepError;
use crate::identifiers::Credentials;

// ============================================================================
// SECTION: Endpoint Paths
// ============================================================================

/// Public REST API root.
pub const PUBLIC_API_PATH: &str = "alfresco/api/-default-/public/alfresco/versions/1";
/// Public workflow API root.
pub const WORKFLOW_API_PATH: &str = "alfresco/api/-default-/public/workflow/versions/1";
/// Legacy web-script service API root.
pub const SERVICE_API_PATH: &str = "alfresco/service/api";
/// CMIS 1.1 browser binding root.
pub const CMIS_BROWSER_PATH: &str = "alfresco/api/-default-/public/cmis/versions/1.1/browser";
/// CMIS 1.1 AtomPub binding root.
pub const CMIS_ATOM_PATH: &str = "alfresco/api/-default-/public/cmis/versions/1.1/atom";
/// Share web tier root.
pub const SHARE_PATH: &str = "share";

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default response body limit in bytes.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
/// Default user agent for outbound requests.
pub const DEFAULT_USER_AGENT: &str = "dataprep/0.1";
/// Maximum characters of a response body carried in error messages.
const MAX_ERROR_BODY_CHARS: usize = 512;
/// Content type for url-encoded form bodies.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

// ============================================================================
// SECTION: Server Address
// ============================================================================

/// URL scheme used to reach the content server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Cleartext HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Returns the scheme label used in URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Coordinates of the content server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    /// URL scheme.
    pub scheme: Scheme,
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerAddress {
    /// Creates a server address.
    #[must_use]
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    /// Returns the server root URL (always ends with `/`).
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::InvalidArgument`] when the host does not form a valid URL.
    pub fn base_url(&self) -> Result<Url, DataPrepError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(DataPrepError::InvalidArgument("server host must not be empty".to_string()));
        }
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        let raw = format!("{}://{}:{}/", self.scheme.as_str(), host, self.port);
        Url::parse(&raw)
            .map_err(|err| DataPrepError::InvalidArgument(format!("invalid server address: {err}")))
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new(Scheme::Http, "localhost", 8080)
    }
}

// ============================================================================
// SECTION: Client Options
// ============================================================================

/// Tunables applied to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientOptions {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response body accepted, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// File part of a multipart body.
#[derive(Debug, Clone)]
struct FilePart {
    /// Form field name.
    field: String,
    /// File name reported to the server.
    file_name: String,
    /// MIME type of the content.
    mime_type: String,
    /// Raw content bytes.
    bytes: Vec<u8>,
}

/// Multipart form body with text fields and an optional file part.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    /// Text fields in insertion order.
    fields: Vec<(String, String)>,
    /// Optional file content.
    file: Option<FilePart>,
}

impl MultipartBody {
    /// Creates an empty multipart body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Sets the file part.
    #[must_use]
    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.file = Some(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        });
        self
    }

    /// Converts the body into a reqwest form.
    fn into_form(self) -> Result<Form, DataPrepError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some(file) = self.file {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)
                .map_err(|err| DataPrepError::InvalidArgument(format!("invalid mime type: {err}")))?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// Request payload variants.
#[derive(Debug, Clone)]
enum RequestBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Url-encoded form fields.
    Form(Vec<(String, String)>),
    /// Multipart form.
    Multipart(MultipartBody),
    /// Pre-encoded document with an explicit content type.
    Raw {
        /// `Content-Type` header value.
        content_type: String,
        /// Encoded body.
        bytes: Vec<u8>,
    },
}

/// A single request to the content server.
///
/// # Invariants
/// - `operation` labels logs and error messages; it never reaches the wire.
#[derive(Debug, Clone)]
pub struct RestRequest {
    /// Operation label.
    operation: String,
    /// HTTP method.
    method: Method,
    /// Fully built target URL.
    url: Url,
    /// Request payload.
    body: RequestBody,
    /// Extra request headers.
    headers: Vec<(String, String)>,
    /// Whether basic authentication is attached.
    basic_auth: bool,
}

impl RestRequest {
    /// Creates a request with the given method.
    #[must_use]
    pub fn new(operation: impl Into<String>, method: Method, url: Url) -> Self {
        Self {
            operation: operation.into(),
            method,
            url,
            body: RequestBody::Empty,
            headers: Vec::new(),
            basic_auth: true,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(operation: impl Into<String>, url: Url) -> Self {
        Self::new(operation, Method::GET, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(operation: impl Into<String>, url: Url) -> Self {
        Self::new(operation, Method::POST, url)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(operation: impl Into<String>, url: Url) -> Self {
        Self::new(operation, Method::PUT, url)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(operation: impl Into<String>, url: Url) -> Self {
        Self::new(operation, Method::DELETE, url)
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Attaches a url-encoded form body.
    #[must_use]
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = fields.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        self.body = RequestBody::Form(pairs);
        self
    }

    /// Attaches a multipart body.
    #[must_use]
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }

    /// Attaches a pre-encoded body sent with the given content type.
    #[must_use]
    pub fn raw(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.body = RequestBody::Raw {
            content_type: content_type.into(),
            bytes,
        };
        self
    }

    /// Adds a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sends the request without a basic authentication header.
    #[must_use]
    pub const fn without_basic_auth(mut self) -> Self {
        self.basic_auth = false;
        self
    }

    /// Returns the operation label.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the target URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Fully read response from the content server.
#[derive(Debug, Clone)]
pub struct RestResponse {
    /// Operation label copied from the request.
    operation: String,
    /// HTTP status code.
    status: u16,
    /// Response headers.
    headers: HeaderMap,
    /// Response body bytes.
    body: Vec<u8>,
}

impl RestResponse {
    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns the operation label.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body decoded as UTF-8 (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns the first value of a header, if present and valid ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns every value of a header.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers.get_all(name).iter().filter_map(|value| value.to_str().ok()).collect()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::Protocol`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DataPrepError> {
        serde_json::from_slice(&self.body).map_err(|err| {
            DataPrepError::Protocol(format!("{}: invalid json response: {err}", self.operation))
        })
    }

    /// Passes the response through when its status is one of `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::UnexpectedStatus`] for any other status.
    pub fn require_status(self, expected: &[u16]) -> Result<Self, DataPrepError> {
        if expected.contains(&self.status) {
            return Ok(self);
        }
        Err(self.into_error())
    }

    /// Maps the status onto a boolean outcome.
    ///
    /// `success` statuses yield `true`; `soft_failure` statuses are logged and
    /// yield `false`.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::UnexpectedStatus`] for any other status.
    pub fn into_outcome(self, success: &[u16], soft_failure: &[u16]) -> Result<bool, DataPrepError> {
        if success.contains(&self.status) {
            return Ok(true);
        }
        if soft_failure.contains(&self.status) {
            warn!(
                operation = %self.operation,
                status = self.status,
                body = %excerpt(&self.text()),
                "operation reported failure"
            );
            return Ok(false);
        }
        Err(self.into_error())
    }

    /// Converts the response into an unexpected-status error.
    #[must_use]
    pub fn into_error(self) -> DataPrepError {
        DataPrepError::UnexpectedStatus {
            body: excerpt(&self.text()),
            operation: self.operation,
            status: self.status,
        }
    }
}

// ============================================================================
// SECTION: HTTP Client
// ============================================================================

/// Blocking HTTP executor bound to one content server.
///
/// # Invariants
/// - Redirects are not followed.
/// - Connections are released after each request; nothing idles in a pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Server coordinates.
    server: ServerAddress,
    /// Cached server root URL.
    base_url: Url,
    /// Request tunables.
    options: HttpClientOptions,
    /// Underlying reqwest client.
    client: Client,
}

impl HttpClient {
    /// Creates a client for the given server.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the address is invalid or the client cannot be built.
    pub fn new(server: ServerAddress, options: HttpClientOptions) -> Result<Self, DataPrepError> {
        let base_url = server.base_url()?;
        let client = build_client(&options, false)?;
        Ok(Self {
            server,
            base_url,
            options,
            client,
        })
    }

    /// Returns a client with a fresh cookie jar for one browser-style session.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::Transport`] when the client cannot be built.
    pub fn with_cookie_store(&self) -> Result<Self, DataPrepError> {
        Ok(Self {
            server: self.server.clone(),
            base_url: self.base_url.clone(),
            options: self.options.clone(),
            client: build_client(&self.options, true)?,
        })
    }

    /// Returns the server coordinates.
    #[must_use]
    pub const fn server(&self) -> &ServerAddress {
        &self.server
    }

    /// Returns the server root URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the request tunables.
    #[must_use]
    pub const fn options(&self) -> &HttpClientOptions {
        &self.options
    }

    /// Builds an endpoint URL from an API root and percent-encoded path segments.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::Protocol`] when the URL cannot be assembled.
    pub fn endpoint(&self, api_root: &str, segments: &[&str]) -> Result<Url, DataPrepError> {
        let mut url = self
            .base_url
            .join(api_root)
            .map_err(|err| DataPrepError::Protocol(format!("invalid api root {api_root}: {err}")))?;
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                DataPrepError::Protocol("server url cannot carry a path".to_string())
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Executes a request and reads the full response.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::Unauthorized`] on HTTP 401,
    /// [`DataPrepError::Transport`] when the request fails, and
    /// [`DataPrepError::ResponseTooLarge`] when the body exceeds the limit.
    pub fn execute(
        &self,
        credentials: &Credentials,
        request: RestRequest,
    ) -> Result<RestResponse, DataPrepError> {
        let RestRequest {
            operation,
            method,
            url,
            body,
            headers,
            basic_auth,
        } = request;
        let mut builder = self.client.request(method.clone(), url.clone());
        if basic_auth {
            builder = builder.basic_auth(credentials.username(), Some(credentials.password()));
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => {
                builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(encode_form(&fields))
            }
            RequestBody::Multipart(body) => builder.multipart(body.into_form()?),
            RequestBody::Raw {
                content_type,
                bytes,
            } => builder.header(CONTENT_TYPE, content_type).body(bytes),
        };

        let mut response = builder
            .send()
            .map_err(|err| DataPrepError::Transport(format!("{operation}: {err}")))?;
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let body = read_response_limited(&mut response, self.options.max_response_bytes)?;
        drop(response);
        debug!(
            operation = %operation,
            method = method.as_str(),
            url = %url,
            status,
            "request completed"
        );

        if status == 401 {
            warn!(operation = %operation, user = credentials.username(), "credentials rejected");
            return Err(DataPrepError::Unauthorized {
                username: credentials.username().to_string(),
            });
        }
        Ok(RestResponse {
            operation,
            status,
            headers: response_headers,
            body,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the underlying reqwest client.
fn build_client(options: &HttpClientOptions, cookies: bool) -> Result<Client, DataPrepError> {
    Client::builder()
        .timeout(Duration::from_millis(options.timeout_ms))
        .user_agent(options.user_agent.clone())
        .redirect(Policy::none())
        .pool_max_idle_per_host(0)
        .cookie_store(cookies)
        .build()
        .map_err(|err| DataPrepError::Transport(format!("http client build failed: {err}")))
}

/// Encodes form fields as `application/x-www-form-urlencoded`.
fn encode_form(fields: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// Truncates a response body for error messages.
fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut short: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    short.push_str("...");
    short
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, DataPrepError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| DataPrepError::Protocol("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(DataPrepError::ResponseTooLarge {
            actual: usize::try_from(expected).unwrap_or(usize::MAX),
            limit: max_bytes,
        });
    }
    let mut buf = Vec::new();
    let mut handle = response.take(max_bytes_u64.saturating_add(1));
    handle
        .read_to_end(&mut buf)
        .map_err(|err| DataPrepError::Transport(format!("failed to read response: {err}")))?;
    if buf.len() > max_bytes {
        return Err(DataPrepError::ResponseTooLarge {
            actual: buf.len(),
            limit: max_bytes,
        });
    }
    Ok(buf)
}
