// crates/dataprep-services/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Stateful fake content server for fixture service tests.
// Purpose: Emulate the REST, CMIS, and web-tier endpoints over real HTTP.
// Dependencies: base64, serde_json, tiny_http, url
// ============================================================================

//! ## Overview
//! [`FakeContentServer`] binds `127.0.0.1:0` and keeps sites, users, content,
//! social metadata, and processes in memory so wrappers can be checked for
//! round trips (create, exists, delete) rather than single canned replies.

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

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dataprep_core::Binding;
use dataprep_core::Credentials;
use dataprep_core::HttpClient;
use dataprep_core::HttpClientOptions;
use dataprep_core::Scheme;
use dataprep_core::ServerAddress;
use dataprep_services::DataPrep;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;
use url::form_urlencoded;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Public REST API prefix.
const PUBLIC: &str = "/alfresco/api/-default-/public/alfresco/versions/1";
/// Workflow REST API prefix.
const WORKFLOW: &str = "/alfresco/api/-default-/public/workflow/versions/1";
/// Legacy service API prefix.
const SERVICE: &str = "/alfresco/service/api";
/// CMIS browser binding prefix.
const BROWSER: &str = "/alfresco/api/-default-/public/cmis/versions/1.1/browser";
/// Web-tier prefix.
const SHARE: &str = "/share";
/// CSRF token issued by the fake web tier (already decoded).
pub const CSRF_TOKEN: &str = "tok+en/1";

/// Credentials the fake server accepts.
pub fn admin() -> Credentials {
    Credentials::new("admin", "admin")
}

/// Credentials the fake server rejects.
pub fn intruder() -> Credentials {
    Credentials::new("admin", "wrong-password")
}

// ============================================================================
// SECTION: Recorded Requests
// ============================================================================

/// A request captured by the fake server.
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
        Url::parse(&format!("http://fake{}", self.url)).expect("request url")
    }

    /// Returns the percent-decoded path segments.
    pub fn segments(&self) -> Vec<String> {
        self.parsed()
            .path_segments()
            .map(|segments| segments.map(decode).collect())
            .unwrap_or_default()
    }

    /// Returns the percent-decoded path.
    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }

    /// Returns a query parameter.
    pub fn query(&self, key: &str) -> Option<String> {
        self.parsed().query_pairs().find(|(name, _)| name == key).map(|(_, value)| value.into_owned())
    }

    /// Returns a url-encoded form field from the body.
    pub fn form(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(&self.body).find(|(name, _)| name == key).map(|(_, value)| value.into_owned())
    }

    /// Returns a text field from a multipart body.
    pub fn multipart_field(&self, key: &str) -> Option<String> {
        let text = String::from_utf8_lossy(&self.body);
        let marker = format!("name=\"{key}\"");
        let start = text.find(&marker)? + marker.len();
        let rest = &text[start..];
        let value_start = rest.find("\r\n\r\n")? + 4;
        let value = &rest[value_start..];
        let value_end = value.find("\r\n")?;
        Some(value[..value_end].to_string())
    }

    /// Returns a CMIS action from either a form or multipart body.
    pub fn cmis_field(&self, key: &str) -> Option<String> {
        self.form(key).or_else(|| self.multipart_field(key))
    }

    /// Returns a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    /// Returns true when the request carries the admin basic-auth header.
    pub fn is_admin(&self) -> bool {
        let expected = format!("Basic {}", BASE64.encode("admin:admin"));
        self.header("authorization") == Some(expected.as_str())
    }
}

fn decode(segment: &str) -> String {
    let query = format!("p={}", segment.replace('+', "%2B"));
    form_urlencoded::parse(query.as_bytes()).next().map(|(_, value)| value.into_owned()).unwrap_or_default()
}

/// Store prefix of every CMIS object id the fake issues.
const STORE_PREFIX: &str = "workspace://SpacesStore/";

// ============================================================================
// SECTION: Fake State
// ============================================================================

/// A folder or document in the fake repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeNode {
    /// Bare node id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// True for folders.
    pub folder: bool,
}

/// In-memory server state.
#[derive(Debug, Default)]
pub struct FakeState {
    /// Site ids.
    pub sites: BTreeSet<String>,
    /// Site members as (site, user) pairs.
    pub members: BTreeSet<(String, String)>,
    /// User ids.
    pub people: BTreeSet<String>,
    /// Children per bare folder id.
    pub tree: BTreeMap<String, Vec<FakeNode>>,
    /// Tags per node as (tag id, text).
    pub tags: BTreeMap<String, Vec<(String, String)>>,
    /// Comments per node as (comment id, text).
    pub comments: BTreeMap<String, Vec<(String, String)>>,
    /// Users who liked each node.
    pub likes: BTreeMap<String, BTreeSet<String>>,
    /// Started processes with their creation body.
    pub processes: BTreeMap<String, Value>,
    /// Dashboards keyed by page with their posted body.
    pub dashboards: BTreeMap<String, Value>,
    /// Monotonic id counter.
    pub next_id: u64,
}

impl FakeState {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn library_id(site: &str) -> String {
        format!("lib-{site}")
    }

    /// Adds a node under a parent and returns its id.
    pub fn add_node(&mut self, parent: &str, name: &str, folder: bool) -> String {
        let id = self.allocate("n");
        self.tree.entry(parent.to_string()).or_default().push(FakeNode {
            id: id.clone(),
            name: name.to_string(),
            folder,
        });
        id
    }

    /// Seeds a site with an empty document library.
    pub fn seed_site(&mut self, site: &str) -> String {
        self.sites.insert(site.to_string());
        let library = Self::library_id(site);
        self.tree.entry(library.clone()).or_default();
        library
    }

    /// Returns true when a node with this id is anywhere in the tree.
    pub fn contains_node(&self, id: &str) -> bool {
        self.tree.values().flatten().any(|node| node.id == id)
    }

    /// Maps a CMIS object id onto a node key.
    ///
    /// Only the exact id the fake issued is accepted; normalized references
    /// and document ids without their version suffix are refused.
    fn node_key(&self, object_id: &str) -> Option<String> {
        let qualified = object_id.strip_prefix(STORE_PREFIX)?;
        let key = qualified.split(';').next().unwrap_or(qualified);
        let issued = self
            .tree
            .values()
            .flatten()
            .find(|node| node.id == key)
            .map_or_else(|| format!("{STORE_PREFIX}{key}"), cmis_id);
        (issued == object_id).then(|| key.to_string())
    }

    fn remove_node(&mut self, id: &str) -> bool {
        let mut removed = false;
        for children in self.tree.values_mut() {
            let before = children.len();
            children.retain(|node| node.id != id);
            removed |= children.len() != before;
        }
        self.tree.remove(id);
        removed
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Canned response.
#[derive(Debug, Clone)]
struct Reply {
    /// HTTP status code.
    status: u16,
    /// Body text.
    body: String,
    /// Extra headers.
    headers: Vec<(String, String)>,
}

impl Reply {
    fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            body: value.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Returns the CMIS object id issued for a node.
fn cmis_id(node: &FakeNode) -> String {
    if node.folder {
        format!("{STORE_PREFIX}{}", node.id)
    } else {
        format!("{STORE_PREFIX}{};1.0", node.id)
    }
}

fn object_json(node: &FakeNode) -> Value {
    let base = if node.folder { "cmis:folder" } else { "cmis:document" };
    json!({
        "succinctProperties": {
            "cmis:objectId": cmis_id(node),
            "cmis:name": node.name,
            "cmis:baseTypeId": base,
            "cmis:objectTypeId": base,
        }
    })
}

/// Renders the page of a collection selected by `skipCount` and `maxItems`.
fn list_json(request: &RecordedRequest, entries: Vec<Value>) -> Value {
    let number = |key: &str, default: usize| {
        request.query(key).and_then(|value| value.parse().ok()).unwrap_or(default)
    };
    let skip = number("skipCount", 0);
    let max = number("maxItems", 100);
    let total = entries.len();
    let wrapped: Vec<Value> =
        entries.into_iter().skip(skip).take(max).map(|entry| json!({ "entry": entry })).collect();
    let has_more = skip + wrapped.len() < total;
    json!({
        "list": {
            "pagination": {
                "count": wrapped.len(),
                "hasMoreItems": has_more,
                "skipCount": skip,
                "maxItems": max,
                "totalItems": total,
            },
            "entries": wrapped,
        }
    })
}

// ============================================================================
// SECTION: Routing
// ============================================================================

fn route(state: &mut FakeState, request: &RecordedRequest) -> Reply {
    let path = request.path();
    if path.starts_with(SHARE) {
        return route_share(state, request, &path);
    }
    if !request.is_admin() {
        return Reply::status(401);
    }
    if let Some(rest) = path.strip_prefix(BROWSER) {
        return route_cmis(state, request, rest);
    }
    if let Some(rest) = path.strip_prefix(PUBLIC) {
        return route_public(state, request, rest);
    }
    if let Some(rest) = path.strip_prefix(WORKFLOW) {
        return route_workflow(state, request, rest);
    }
    if let Some(rest) = path.strip_prefix(SERVICE) {
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        if let (["people", user], "DELETE") = (segments.as_slice(), request.method.as_str()) {
            return Reply::status(if state.people.remove(*user) { 200 } else { 404 });
        }
    }
    Reply::status(404)
}

fn route_public(state: &mut FakeState, request: &RecordedRequest, rest: &str) -> Reply {
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    match (request.method.as_str(), segments.as_slice()) {
        ("POST", ["sites"]) => {
            let id = request.json()["id"].as_str().unwrap_or_default().to_string();
            if state.sites.contains(&id) {
                return Reply::status(409);
            }
            state.seed_site(&id);
            Reply::json(201, &json!({ "entry": { "id": id } }))
        }
        ("GET", ["sites", site]) => Reply::status(if state.sites.contains(*site) { 200 } else { 404 }),
        ("DELETE", ["sites", site]) => {
            assert_eq!(request.query("permanent").as_deref(), Some("true"));
            Reply::status(if state.sites.remove(*site) { 204 } else { 404 })
        }
        ("POST", ["sites", site, "members"]) => {
            if !state.sites.contains(*site) {
                return Reply::status(404);
            }
            let user = request.json()["id"].as_str().unwrap_or_default().to_string();
            if state.members.insert(((*site).to_string(), user)) {
                Reply::json(201, &request.json())
            } else {
                Reply::status(409)
            }
        }
        ("POST", ["people"]) => {
            let id = request.json()["id"].as_str().unwrap_or_default().to_string();
            if state.people.insert(id) {
                Reply::json(201, &request.json())
            } else {
                Reply::status(409)
            }
        }
        ("GET", ["people", user]) => Reply::status(if state.people.contains(*user) { 200 } else { 404 }),
        (method, ["nodes", node, collection, tail @ ..]) => {
            if !state.contains_node(node) {
                return Reply::status(404);
            }
            route_social(state, request, method, node, collection, tail)
        }
        _ => Reply::status(404),
    }
}

fn route_social(
    state: &mut FakeState,
    request: &RecordedRequest,
    method: &str,
    node: &str,
    collection: &str,
    tail: &[&str],
) -> Reply {
    match (method, collection, tail) {
        ("POST", "tags", []) => {
            let tag = request.json()[0]["tag"].as_str().unwrap_or_default().to_string();
            let id = state.allocate("tag-");
            state.tags.entry(node.to_string()).or_default().push((id.clone(), tag.clone()));
            Reply::json(201, &json!({ "entry": { "id": id, "tag": tag } }))
        }
        ("GET", "tags", []) => {
            let entries = state.tags.get(node).cloned().unwrap_or_default();
            Reply::json(
                200,
                &list_json(
                    request,
                    entries.into_iter().map(|(id, tag)| json!({ "id": id, "tag": tag })).collect(),
                ),
            )
        }
        ("DELETE", "tags", [tag_id]) => {
            let tags = state.tags.entry(node.to_string()).or_default();
            let before = tags.len();
            tags.retain(|(id, _)| id != *tag_id);
            Reply::status(if tags.len() == before { 404 } else { 204 })
        }
        ("POST", "comments", []) => {
            let content = request.json()["content"].as_str().unwrap_or_default().to_string();
            let id = state.allocate("comment-");
            state.comments.entry(node.to_string()).or_default().push((id.clone(), content.clone()));
            Reply::json(201, &json!({ "entry": { "id": id, "content": content } }))
        }
        ("GET", "comments", []) => {
            let entries = state.comments.get(node).cloned().unwrap_or_default();
            Reply::json(
                200,
                &list_json(
                    request,
                    entries.into_iter().map(|(id, content)| json!({ "id": id, "content": content })).collect(),
                ),
            )
        }
        ("DELETE", "comments", [comment_id]) => {
            let comments = state.comments.entry(node.to_string()).or_default();
            let before = comments.len();
            comments.retain(|(id, _)| id != *comment_id);
            Reply::status(if comments.len() == before { 404 } else { 204 })
        }
        ("POST", "ratings", []) => {
            let body = request.json();
            assert_eq!(body["id"], "likes");
            assert_eq!(body["myRating"], true);
            state.likes.entry(node.to_string()).or_default().insert("admin".to_string());
            Reply::json(201, &json!({ "entry": { "id": "likes", "myRating": true } }))
        }
        ("GET", "ratings", ["likes"]) => {
            let count = state.likes.get(node).map_or(0, BTreeSet::len);
            Reply::json(
                200,
                &json!({ "entry": { "id": "likes", "aggregate": { "numberOfRatings": count } } }),
            )
        }
        ("DELETE", "ratings", ["likes"]) => {
            let removed = state.likes.entry(node.to_string()).or_default().remove("admin");
            Reply::status(if removed { 204 } else { 404 })
        }
        _ => Reply::status(404),
    }
}

fn route_workflow(state: &mut FakeState, request: &RecordedRequest, rest: &str) -> Reply {
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    match (request.method.as_str(), segments.as_slice()) {
        ("POST", ["processes"]) => {
            let id = state.allocate("");
            state.processes.insert(id.clone(), request.json());
            Reply::json(201, &json!({ "entry": { "id": id, "processDefinitionKey": "activitiAdhoc" } }))
        }
        ("DELETE", ["processes", id]) => {
            Reply::status(if state.processes.remove(*id).is_some() { 204 } else { 404 })
        }
        _ => Reply::status(404),
    }
}

fn route_cmis(state: &mut FakeState, request: &RecordedRequest, rest: &str) -> Reply {
    if rest.is_empty() {
        return Reply::json(
            200,
            &json!({ "-default-": { "repositoryId": "-default-", "rootFolderId": "workspace://SpacesStore/root" } }),
        );
    }
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if request.method == "GET" {
        if let ["root", "Sites", site, "documentLibrary"] = segments.as_slice() {
            if !state.sites.contains(*site) {
                return Reply::status(404);
            }
            let library = FakeNode {
                id: FakeState::library_id(site),
                name: "documentLibrary".to_string(),
                folder: true,
            };
            return Reply::json(200, &object_json(&library));
        }
        if segments.as_slice() == ["root"] && request.query("cmisselector").as_deref() == Some("children") {
            let Some(folder) = state.node_key(&request.query("objectId").unwrap_or_default()) else {
                return Reply::status(400);
            };
            let Some(children) = state.tree.get(&folder) else {
                return Reply::status(404);
            };
            let objects: Vec<Value> = children.iter().map(|node| json!({ "object": object_json(node) })).collect();
            return Reply::json(200, &json!({ "objects": objects, "hasMoreItems": false }));
        }
        return Reply::status(404);
    }
    let Some(target) = state.node_key(&request.query("objectId").unwrap_or_default()) else {
        return Reply::status(400);
    };
    match request.cmis_field("cmisaction").as_deref() {
        Some(action @ ("createFolder" | "createDocument")) => {
            if !state.tree.contains_key(&target) {
                return Reply::status(404);
            }
            let name = request.cmis_field("propertyValue[1]").unwrap_or_default();
            let folder = action == "createFolder";
            let id = state.add_node(&target, &name, folder);
            if folder {
                state.tree.entry(id.clone()).or_default();
            }
            Reply::json(201, &object_json(&FakeNode { id, name, folder }))
        }
        Some("delete" | "deleteTree") => Reply::status(if state.remove_node(&target) { 200 } else { 404 }),
        _ => Reply::status(400),
    }
}

fn route_share(state: &mut FakeState, request: &RecordedRequest, path: &str) -> Reply {
    match (request.method.as_str(), path) {
        ("POST", "/share/page/dologin") => {
            let accepted = request.form("username").as_deref() == Some("admin")
                && request.form("password").as_deref() == Some("admin");
            if accepted {
                Reply::status(302)
                    .with_header("Location", "/share/page/")
                    .with_header("Set-Cookie", "JSESSIONID=fake-session; Path=/share; HttpOnly")
            } else {
                Reply::status(302).with_header("Location", "/share/page/?error=true")
            }
        }
        ("GET", page) if page.starts_with("/share/page/") => {
            if !has_session(request) {
                return Reply::status(302).with_header("Location", "/share/page/");
            }
            Reply::status(200).with_header(
                "Set-Cookie",
                &format!("Alfresco-CSRFToken={}; Path=/share", urlencode(CSRF_TOKEN)),
            )
        }
        ("POST", "/share/service/components/dashboard/customise-dashboard") => {
            if !has_session(request) || request.header("Alfresco-CSRFToken") != Some(CSRF_TOKEN) {
                return Reply::status(403);
            }
            let body = request.json();
            let page = body["dashboardPage"].as_str().unwrap_or_default().to_string();
            state.dashboards.insert(page, body);
            Reply::json(200, &json!({ "success": true }))
        }
        _ => Reply::status(404),
    }
}

fn has_session(request: &RecordedRequest) -> bool {
    request.header("cookie").is_some_and(|cookie| cookie.contains("JSESSIONID=fake-session"))
}

fn urlencode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

// ============================================================================
// SECTION: Fake Server
// ============================================================================

/// Stateful fake content server on an ephemeral loopback port.
pub struct FakeContentServer {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    state: Arc<Mutex<FakeState>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    port: u16,
}

impl FakeContentServer {
    /// Starts the server with empty state.
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("http server"));
        let port = server.server_addr().to_ip().expect("ip listener").port();
        let state = Arc::new(Mutex::new(FakeState::default()));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let worker_server = Arc::clone(&server);
        let worker_state = Arc::clone(&state);
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
                        .map(|header| (header.field.as_str().as_str().to_string(), header.value.as_str().to_string()))
                        .collect(),
                    body,
                };
                let reply = {
                    let mut guard = worker_state.lock().expect("state");
                    route(&mut *guard, &recorded)
                };
                worker_requests.lock().expect("request log").push(recorded);
                let mut response = Response::from_string(reply.body).with_status_code(reply.status);
                for (name, value) in &reply.headers {
                    response =
                        response.with_header(Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("header"));
                }
                let _ = request.respond(response);
            }
        });
        Self {
            server,
            handle: Some(handle),
            state,
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

    /// Returns the service facade bound to this server.
    pub fn dataprep(&self) -> DataPrep {
        DataPrep::new(self.client(), Binding::Browser)
    }

    /// Runs a closure against the server state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut guard = self.state.lock().expect("state");
        f(&mut *guard)
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl Drop for FakeContentServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
