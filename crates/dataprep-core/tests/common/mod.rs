// crates/dataprep-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared mock content server for dataprep-core tests.
// Purpose: Serve canned responses and record requests over real HTTP.
// Dependencies: base64, serde_json, tiny_http, url
// ============================================================================

//! ## Overview
//! [`MockServer`] binds `127.0.0.1:0`, answers every request through a
//! handler closure, and records what it saw so tests can assert on paths,
//! query strings, forms, and authentication headers.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dataprep_core::Credentials;
use dataprep_core::HttpClient;
use dataprep_core::HttpClientOptions;
use dataprep_core::Scheme;
use dataprep_core::ServerAddress;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;
use url::form_urlencoded;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Credentials the mock servers accept.
pub fn admin() -> Credentials {
    Credentials::new("admin", "admin")
}

/// Credentials the mock servers reject.
pub fn intruder() -> Credentials {
    Credentials::new("admin", "wrong-password")
}

/// Returns true when the request carries the admin basic-auth header.
pub fn is_admin(request: &RecordedRequest) -> bool {
    let expected = format!("Basic {}", BASE64.encode("admin:admin"));
    request.header("authorization") == Some(expected.as_str())
}

// ============================================================================
// SECTION: CMIS Fixtures
// ============================================================================

/// Browser-binding path prefix as seen by the server.
pub const BROWSER_ROOT: &str = "/alfresco/api/-default-/public/cmis/versions/1.1/browser";

/// AtomPub service document path as seen by the server.
pub const ATOM_ROOT: &str = "/alfresco/api/-default-/public/cmis/versions/1.1/atom";

/// Repository service document listing a single repository.
pub fn repository_info() -> Value {
    json!({
        "-default-": {
            "repositoryId": "-default-",
            "rootFolderId": "workspace://SpacesStore/root",
        }
    })
}

/// Succinct folder object.
pub fn folder(id: &str, name: &str) -> Value {
    json!({
        "succinctProperties": {
            "cmis:objectId": format!("workspace://SpacesStore/{id}"),
            "cmis:name": name,
            "cmis:baseTypeId": "cmis:folder",
            "cmis:objectTypeId": "cmis:folder",
        }
    })
}

/// Succinct document object.
pub fn document(id: &str, name: &str) -> Value {
    json!({
        "succinctProperties": {
            "cmis:objectId": format!("workspace://SpacesStore/{id};1.0"),
            "cmis:name": name,
            "cmis:baseTypeId": "cmis:document",
            "cmis:objectTypeId": "cmis:document",
        }
    })
}

/// AtomPub service document listing a single repository.
pub fn atom_service_document() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<app:service xmlns:app="http://www.w3.org/2007/app" "#,
        r#"xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/" "#,
        r#"xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/">"#,
        "<app:workspace><cmisra:repositoryInfo>",
        "<cmis:repositoryId>-default-</cmis:repositoryId>",
        "<cmis:rootFolderId>workspace://SpacesStore/root</cmis:rootFolderId>",
        "</cmisra:repositoryInfo></app:workspace></app:service>",
    )
    .to_string()
}

/// AtomPub entry for an object with the given raw id and base type.
pub fn atom_entry(object_id: &str, name: &str, base_type: &str) -> String {
    let property = |kind: &str, id: &str, value: &str| {
        format!(
            r#"<cmis:{kind} propertyDefinitionId="{id}"><cmis:value>{value}</cmis:value></cmis:{kind}>"#
        )
    };
    format!(
        "<atom:entry><atom:title>{name}</atom:title><cmisra:object><cmis:properties>{}{}{}{}</cmis:properties></cmisra:object></atom:entry>",
        property("propertyId", "cmis:objectId", object_id),
        property("propertyString", "cmis:name", name),
        property("propertyId", "cmis:baseTypeId", base_type),
        property("propertyId", "cmis:objectTypeId", base_type),
    )
}

/// AtomPub folder entry.
pub fn atom_folder(id: &str, name: &str) -> String {
    atom_entry(&format!("workspace://SpacesStore/{id}"), name, "cmis:folder")
}

/// AtomPub document entry.
pub fn atom_document(id: &str, name: &str) -> String {
    atom_entry(&format!("workspace://SpacesStore/{id};1.0"), name, "cmis:document")
}

/// Wraps an entry into a standalone AtomPub document.
pub fn atom_document_root(entry: &str) -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8"?>{}"#, with_namespaces(entry, "atom:entry"))
}

/// AtomPub children feed; `next` adds the link announcing another page.
pub fn atom_feed(entries: &[String], next: bool) -> String {
    let next_link = if next { r#"<atom:link rel="next" href="next"/>"# } else { "" };
    let feed = format!("<atom:feed>{next_link}{}</atom:feed>", entries.concat());
    format!(r#"<?xml version="1.0" encoding="UTF-8"?>{}"#, with_namespaces(&feed, "atom:feed"))
}

/// Adds the Atom and CMIS namespace declarations to the root element.
fn with_namespaces(document: &str, root: &str) -> String {
    let declarations = concat!(
        r#" xmlns:atom="http://www.w3.org/2005/Atom""#,
        r#" xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/""#,
        r#" xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/""#,
    );
    document.replacen(&format!("<{root}>"), &format!("<{root}{declarations}>"), 1)
}

/// Children page wrapping the given succinct objects.
pub fn children_page(objects: &[Value], has_more: bool) -> Value {
    let entries: Vec<Value> = objects.iter().map(|object| json!({ "object": object })).collect();
    json!({
        "objects": entries,
        "hasMoreItems": has_more,
        "numItems": objects.len(),
    })
}

// ============================================================================
// SECTION: Recorded Requests
// ============================================================================

/// A request captured by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Raw request target (path and query).
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    fn parsed(&self) -> Url {
        Url::parse(&format!("http://mock{}", self.url)).expect("request url")
    }

    /// Returns the percent-decoded path.
    pub fn path(&self) -> String {
        let parsed = self.parsed();
        percent_decode(parsed.path())
    }

    /// Returns a query parameter.
    pub fn query(&self, key: &str) -> Option<String> {
        self.parsed().query_pairs().find(|(name, _)| name == key).map(|(_, value)| value.into_owned())
    }

    /// Returns a url-encoded form field from the body.
    pub fn form(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(&self.body)
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    /// Returns a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    /// Returns the body as lossy UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn percent_decode(path: &str) -> String {
    let query = format!("p={}", path.replace('+', "%2B"));
    form_urlencoded::parse(query.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Mock Responses
// ============================================================================

/// Canned response returned by a handler.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text.
    pub body: String,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
}

impl MockResponse {
    /// Empty response with a status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    /// JSON response with a status.
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            body: value.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    /// Plain-text response with a status.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// AtomPub XML response with a status.
    pub fn atom(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: vec![("Content-Type".to_string(), "application/atom+xml".to_string())],
        }
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

// ============================================================================
// SECTION: Mock Server
// ============================================================================

/// HTTP server answering requests through a handler closure.
pub struct MockServer {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    port: u16,
}

impl MockServer {
    /// Starts the server on an ephemeral loopback port.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("http server"));
        let port = server.server_addr().to_ip().expect("ip listener").port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let worker_server = Arc::clone(&server);
        let worker_requests = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for mut request in worker_server.incoming_requests() {
                let mut body = Vec::new();
                let _ = request.as_reader().read_to_end(&mut body);
                let recorded = RecordedRequest {
                    method: request.method().as_str().to_string(),
                    url: request.url().to_string(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|header| {
                            (header.field.as_str().as_str().to_string(), header.value.as_str().to_string())
                        })
                        .collect(),
                    body,
                };
                let reply = handler(&recorded);
                worker_requests.lock().expect("request log").push(recorded);
                let mut response = Response::from_string(reply.body).with_status_code(reply.status);
                for (name, value) in &reply.headers {
                    response = response.with_header(
                        Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("header"),
                    );
                }
                let _ = request.respond(response);
            }
        });
        Self {
            server,
            handle: Some(handle),
            requests,
            port,
        }
    }

    /// Returns the server address.
    pub fn address(&self) -> ServerAddress {
        ServerAddress::new(Scheme::Http, "127.0.0.1", self.port)
    }

    /// Returns an HTTP client bound to this server.
    pub fn client(&self) -> HttpClient {
        HttpClient::new(self.address(), HttpClientOptions::default()).expect("http client")
    }

    /// Returns an HTTP client with custom options.
    pub fn client_with(&self, options: HttpClientOptions) -> HttpClient {
        HttpClient::new(self.address(), options).expect("http client")
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
