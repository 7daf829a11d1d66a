// crates/dataprep-core/src/session.rs
// ============================================================================
// Module: CMIS Sessions
// Description: Per-call CMIS session acquisition and repository operations.
// Purpose: Open authenticated sessions and navigate or mutate the folder tree.
// Dependencies: quick-xml (via atom), tracing, url
// ============================================================================

//! ## Overview
//! [`SessionFactory::open`] authenticates against the selected binding and
//! discovers the repository. The resulting [`CmisSession`] is owned by a single
//! logical operation and dropped afterwards; nothing is pooled or cached.
//! Repository navigation and mutation speak the binding the session was
//! opened with: succinct JSON for the browser binding and Atom entries and
//! feeds for the AtomPub binding.
//! Invariants:
//! - Rejected credentials surface as [`DataPrepError::Unauthorized`] at open time.
//! - Children listings are paged until the server reports no more items.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;
use url::Url;

use crate::atom;
use crate::atom::ATOM_ENTRY_CONTENT_TYPE;
use crate::cmis::Binding;
use crate::cmis::ChildrenPage;
use crate::cmis::CmisObject;
use crate::cmis::RepositoryInfo;
use crate::cmis::SuccinctObject;
use crate::cmis::first_repository;
use crate::error::DataPrepError;
use crate::error::require_value;
use crate::http::CMIS_ATOM_PATH;
use crate::http::CMIS_BROWSER_PATH;
use crate::http::HttpClient;
use crate::http::MultipartBody;
use crate::http::RestRequest;
use crate::http::RestResponse;
use crate::identifiers::Credentials;
use crate::resolver::FolderTree;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Page size requested when listing folder children.
pub const CHILDREN_PAGE_SIZE: usize = 100;

// ============================================================================
// SECTION: Session Factory
// ============================================================================

/// Opens CMIS sessions against one content server.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    /// HTTP executor shared with the opened sessions.
    client: HttpClient,
}

impl SessionFactory {
    /// Creates a factory over the given HTTP client.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self {
            client,
        }
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Opens a fresh authenticated session.
    ///
    /// The repository id and root folder id are read from the service
    /// document of the selected binding.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::Unauthorized`] when the server rejects the
    /// credentials and [`DataPrepError`] for any other failure.
    pub fn open(
        &self,
        credentials: &Credentials,
        binding: Binding,
    ) -> Result<CmisSession, DataPrepError> {
        require_value(credentials.username(), "username")?;
        let url = self.client.endpoint(binding_root(binding), &[])?;
        let response = self
            .client
            .execute(credentials, RestRequest::get("open cmis session", url))?
            .require_status(&[200])?;
        let repository = match binding {
            Binding::Browser => first_repository(response.body())?,
            Binding::AtomPub => atom::parse_service_document(response.body())?,
        };
        debug!(
            binding = binding.as_str(),
            repository = %repository.id,
            user = credentials.username(),
            "cmis session opened"
        );
        Ok(CmisSession {
            client: self.client.clone(),
            credentials: credentials.clone(),
            binding,
            repository,
        })
    }
}

/// Returns the service root path of a binding.
const fn binding_root(binding: Binding) -> &'static str {
    match binding {
        Binding::Browser => CMIS_BROWSER_PATH,
        Binding::AtomPub => CMIS_ATOM_PATH,
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Authenticated CMIS session for one logical operation.
#[derive(Debug, Clone)]
pub struct CmisSession {
    /// HTTP executor.
    client: HttpClient,
    /// Credentials attached to every request.
    credentials: Credentials,
    /// Binding the session was opened with.
    binding: Binding,
    /// Repository discovered at open time.
    repository: RepositoryInfo,
}

impl CmisSession {
    /// Returns the repository discovered at open time.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryInfo {
        &self.repository
    }

    /// Returns the binding the session was opened with.
    #[must_use]
    pub const fn binding(&self) -> Binding {
        self.binding
    }

    /// Returns the session user name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Looks up an object by repository path (`/Sites/x/documentLibrary`).
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails.
    pub fn object_by_path(&self, path: &str) -> Result<Option<CmisObject>, DataPrepError> {
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
        let url = match self.binding {
            Binding::Browser => {
                let mut browser_segments = vec!["root"];
                browser_segments.extend(segments);
                let mut url = self.client.endpoint(CMIS_BROWSER_PATH, &browser_segments)?;
                url.query_pairs_mut()
                    .append_pair("cmisselector", "object")
                    .append_pair("succinct", "true");
                url
            }
            Binding::AtomPub => {
                let mut url = self.client.endpoint(CMIS_ATOM_PATH, &["path"])?;
                url.query_pairs_mut().append_pair("path", &format!("/{}", segments.join("/")));
                url
            }
        };
        self.fetch_object("get object by path", url)
    }

    /// Looks up an object by id.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails.
    pub fn object_by_id(&self, object_id: &str) -> Result<Option<CmisObject>, DataPrepError> {
        require_value(object_id, "object id")?;
        let url = match self.binding {
            Binding::Browser => {
                let mut url = self.object_url(object_id)?;
                url.query_pairs_mut()
                    .append_pair("cmisselector", "object")
                    .append_pair("succinct", "true");
                url
            }
            Binding::AtomPub => self.atom_url("id", object_id)?,
        };
        self.fetch_object("get object by id", url)
    }

    /// Lists every child of a folder, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::NotFound`] when the folder does not exist.
    pub fn children(&self, folder_id: &str) -> Result<Vec<CmisObject>, DataPrepError> {
        require_value(folder_id, "folder id")?;
        let page_size = CHILDREN_PAGE_SIZE.to_string();
        let mut objects = Vec::new();
        let mut skip_count = 0_usize;
        loop {
            let mut url = match self.binding {
                Binding::Browser => {
                    let mut url = self.object_url(folder_id)?;
                    url.query_pairs_mut()
                        .append_pair("cmisselector", "children")
                        .append_pair("succinct", "true");
                    url
                }
                Binding::AtomPub => self.atom_url("children", folder_id)?,
            };
            url.query_pairs_mut()
                .append_pair("maxItems", &page_size)
                .append_pair("skipCount", &skip_count.to_string());
            let response =
                self.client.execute(&self.credentials, RestRequest::get("list children", url))?;
            if response.status() == 404 {
                return Err(DataPrepError::NotFound(format!("folder {folder_id}")));
            }
            let response = response.require_status(&[200])?;
            let (batch, has_more) = match self.binding {
                Binding::Browser => {
                    let page: ChildrenPage = response.json()?;
                    let has_more = page.has_more_items;
                    (page.into_objects(), has_more)
                }
                Binding::AtomPub => {
                    let feed = atom::parse_feed(response.body())?;
                    (feed.objects, feed.has_more_items)
                }
            };
            let fetched = batch.len();
            objects.extend(batch);
            if !has_more || fetched == 0 {
                break;
            }
            skip_count += fetched;
        }
        Ok(objects)
    }

    /// Creates a folder under the given parent.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the server rejects the creation.
    pub fn create_folder(&self, parent_id: &str, name: &str) -> Result<CmisObject, DataPrepError> {
        require_value(parent_id, "parent id")?;
        require_value(name, "folder name")?;
        let request = match self.binding {
            Binding::Browser => {
                RestRequest::post("create folder", self.object_url(parent_id)?).form([
                    ("cmisaction", "createFolder"),
                    ("propertyId[0]", "cmis:objectTypeId"),
                    ("propertyValue[0]", "cmis:folder"),
                    ("propertyId[1]", "cmis:name"),
                    ("propertyValue[1]", name),
                    ("succinct", "true"),
                ])
            }
            Binding::AtomPub => RestRequest::post("create folder", self.atom_url("children", parent_id)?)
                .raw(ATOM_ENTRY_CONTENT_TYPE, atom::folder_entry(name).into_bytes()),
        };
        let response = self.client.execute(&self.credentials, request)?.require_status(&[200, 201])?;
        self.decode_object(&response)
    }

    /// Creates a document with content under the given parent.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the server rejects the upload.
    pub fn create_document(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<CmisObject, DataPrepError> {
        require_value(parent_id, "parent id")?;
        require_value(name, "document name")?;
        require_value(mime_type, "mime type")?;
        let request = match self.binding {
            Binding::Browser => {
                let body = MultipartBody::new()
                    .text("cmisaction", "createDocument")
                    .text("propertyId[0]", "cmis:objectTypeId")
                    .text("propertyValue[0]", "cmis:document")
                    .text("propertyId[1]", "cmis:name")
                    .text("propertyValue[1]", name)
                    .text("succinct", "true")
                    .file("content", name, mime_type, content);
                RestRequest::post("create document", self.object_url(parent_id)?).multipart(body)
            }
            Binding::AtomPub => {
                let entry = atom::document_entry(name, mime_type, &content);
                RestRequest::post("create document", self.atom_url("children", parent_id)?)
                    .raw(ATOM_ENTRY_CONTENT_TYPE, entry.into_bytes())
            }
        };
        let response = self.client.execute(&self.credentials, request)?.require_status(&[200, 201])?;
        self.decode_object(&response)
    }

    /// Deletes a single object and all of its versions.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the server rejects the deletion.
    pub fn delete_object(&self, object_id: &str) -> Result<(), DataPrepError> {
        require_value(object_id, "object id")?;
        let request = match self.binding {
            Binding::Browser => RestRequest::post("delete object", self.object_url(object_id)?)
                .form([("cmisaction", "delete"), ("allVersions", "true")]),
            Binding::AtomPub => {
                let mut url = self.atom_url("entry", object_id)?;
                url.query_pairs_mut().append_pair("allVersions", "true");
                RestRequest::delete("delete object", url)
            }
        };
        self.client.execute(&self.credentials, request)?.require_status(&[200, 204])?;
        Ok(())
    }

    /// Deletes a folder and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the server rejects the deletion.
    pub fn delete_tree(&self, folder_id: &str) -> Result<(), DataPrepError> {
        require_value(folder_id, "folder id")?;
        let request = match self.binding {
            Binding::Browser => RestRequest::post("delete tree", self.object_url(folder_id)?).form([
                ("cmisaction", "deleteTree"),
                ("allVersions", "true"),
                ("continueOnFailure", "false"),
            ]),
            Binding::AtomPub => {
                let mut url = self.atom_url("descendants", folder_id)?;
                url.query_pairs_mut()
                    .append_pair("allVersions", "true")
                    .append_pair("continueOnFailure", "false");
                RestRequest::delete("delete tree", url)
            }
        };
        self.client.execute(&self.credentials, request)?.require_status(&[200, 204])?;
        Ok(())
    }

    /// Returns the browser-binding root URL addressed at one object id.
    fn object_url(&self, object_id: &str) -> Result<Url, DataPrepError> {
        let mut url = self.client.endpoint(CMIS_BROWSER_PATH, &["root"])?;
        url.query_pairs_mut().append_pair("objectId", object_id);
        Ok(url)
    }

    /// Returns an AtomPub resource URL (`entry`, `children`, ...) for one object id.
    fn atom_url(&self, resource: &str, object_id: &str) -> Result<Url, DataPrepError> {
        let mut url = self.client.endpoint(CMIS_ATOM_PATH, &[resource])?;
        url.query_pairs_mut().append_pair("id", object_id);
        Ok(url)
    }

    /// Decodes a single object in the session's wire format.
    fn decode_object(&self, response: &RestResponse) -> Result<CmisObject, DataPrepError> {
        match self.binding {
            Binding::Browser => Ok(response.json::<SuccinctObject>()?.into_object()),
            Binding::AtomPub => atom::parse_entry(response.body()),
        }
    }

    /// Fetches a single object, mapping 404 to `None`.
    fn fetch_object(&self, operation: &str, url: Url) -> Result<Option<CmisObject>, DataPrepError> {
        let response = self.client.execute(&self.credentials, RestRequest::get(operation, url))?;
        if response.status() == 404 {
            return Ok(None);
        }
        let response = response.require_status(&[200])?;
        self.decode_object(&response).map(Some)
    }
}

impl FolderTree for CmisSession {
    fn children(&self, folder_id: &str) -> Result<Vec<CmisObject>, DataPrepError> {
        Self::children(self, folder_id)
    }

    fn object_by_path(&self, path: &str) -> Result<Option<CmisObject>, DataPrepError> {
        Self::object_by_path(self, path)
    }
}
