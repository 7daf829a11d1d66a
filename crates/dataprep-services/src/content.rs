// crates/dataprep-services/src/content.rs
// ============================================================================
// Module: Content Fixtures
// Description: Folder and document fixtures in site libraries and repository paths.
// Purpose: Create, resolve, and delete content through CMIS sessions.
// Dependencies: dataprep-core, tracing
// ============================================================================

//! ## Overview
//! Every operation opens its own [`CmisSession`] and drops it on return.
//! Named parents and delete targets are resolved with a fresh
//! [`NodeResolver`] walk, so results always reflect the current tree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dataprep_core::Binding;
use dataprep_core::CmisSession;
use dataprep_core::Credentials;
use dataprep_core::DataPrepError;
use dataprep_core::NodeRef;
use dataprep_core::NodeResolver;
use dataprep_core::SessionFactory;
use dataprep_core::SiteId;
use dataprep_core::require_value;
use dataprep_core::site_library_path;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Document upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    /// Display name of the document.
    pub name: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Raw content bytes.
    pub content: Vec<u8>,
}

impl NewDocument {
    /// Creates a plain-text document.
    #[must_use]
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: "text/plain".to_string(),
            content: content.into().into_bytes(),
        }
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Content fixture operations.
#[derive(Debug, Clone)]
pub struct ContentService {
    /// Session source.
    sessions: SessionFactory,
    /// Binding used for every session.
    binding: Binding,
}

impl ContentService {
    /// Creates the service over a session factory.
    #[must_use]
    pub const fn new(sessions: SessionFactory, binding: Binding) -> Self {
        Self {
            sessions,
            binding,
        }
    }

    /// Creates a folder in a site's document library.
    ///
    /// With `parent` set, the folder is created inside the folder of that
    /// name found anywhere in the library.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::NotFound`] when the library or parent is
    /// missing and [`DataPrepError`] for request failures.
    pub fn create_folder(
        &self,
        credentials: &Credentials,
        site: &SiteId,
        name: &str,
        parent: Option<&str>,
    ) -> Result<NodeRef, DataPrepError> {
        require_value(name, "folder name")?;
        let session = self.session(credentials)?;
        let parent_id = library_target(&session, site, parent)?;
        let folder = session.create_folder(&parent_id, name)?;
        info!(site = %site, folder = name, "folder created");
        Ok(folder.node_ref())
    }

    /// Creates a folder under an absolute repository path.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::NotFound`] when the parent path is missing
    /// and [`DataPrepError`] for request failures.
    pub fn create_repository_folder(
        &self,
        credentials: &Credentials,
        parent_path: &str,
        name: &str,
    ) -> Result<NodeRef, DataPrepError> {
        require_value(parent_path, "parent path")?;
        require_value(name, "folder name")?;
        let session = self.session(credentials)?;
        let parent = session
            .object_by_path(parent_path)?
            .ok_or_else(|| DataPrepError::NotFound(format!("repository path {parent_path}")))?;
        if !parent.is_folder() {
            return Err(DataPrepError::InvalidArgument(format!("{parent_path} is not a folder")));
        }
        let folder = session.create_folder(&parent.id, name)?;
        info!(path = parent_path, folder = name, "repository folder created");
        Ok(folder.node_ref())
    }

    /// Uploads a document to a site's document library.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::NotFound`] when the library or parent is
    /// missing and [`DataPrepError`] for request failures.
    pub fn upload_document(
        &self,
        credentials: &Credentials,
        site: &SiteId,
        document: NewDocument,
        parent: Option<&str>,
    ) -> Result<NodeRef, DataPrepError> {
        require_value(&document.name, "document name")?;
        let session = self.session(credentials)?;
        let parent_id = library_target(&session, site, parent)?;
        let NewDocument {
            name,
            mime_type,
            content,
        } = document;
        let created = session.create_document(&parent_id, &name, &mime_type, content)?;
        info!(site = %site, document = %name, "document uploaded");
        Ok(created.node_ref())
    }

    /// Returns the node reference of `name` in a site, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the session or tree walk fails.
    pub fn node_ref(
        &self,
        credentials: &Credentials,
        site: &SiteId,
        name: &str,
    ) -> Result<String, DataPrepError> {
        let session = self.session(credentials)?;
        NodeResolver::new(&session).node_ref_in_site(site, name)
    }

    /// Returns the node reference of `name` below a repository path, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the session or tree walk fails.
    pub fn node_ref_in_path(
        &self,
        credentials: &Credentials,
        path: &str,
        name: &str,
    ) -> Result<String, DataPrepError> {
        let session = self.session(credentials)?;
        NodeResolver::new(&session).node_ref_in_path(path, name)
    }

    /// Finds the node reference of `name` in a site.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the session or tree walk fails.
    pub fn find_node(
        &self,
        credentials: &Credentials,
        site: &SiteId,
        name: &str,
    ) -> Result<Option<NodeRef>, DataPrepError> {
        let session = self.session(credentials)?;
        NodeResolver::new(&session).find_in_site(site, name)
    }

    /// Deletes the folder or document named `name` in a site.
    ///
    /// Folders are removed with everything below them. Returns `false` when
    /// nothing by that name exists.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the session, walk, or deletion fails.
    pub fn delete_content(
        &self,
        credentials: &Credentials,
        site: &SiteId,
        name: &str,
    ) -> Result<bool, DataPrepError> {
        let session = self.session(credentials)?;
        let Some(node) = NodeResolver::new(&session).locate_in_site(site, name)? else {
            warn!(site = %site, name, "content to delete not found");
            return Ok(false);
        };
        if node.is_folder {
            session.delete_tree(&node.object_id)?;
        } else {
            session.delete_object(&node.object_id)?;
        }
        info!(site = %site, name, node = %node.node_ref, "content deleted");
        Ok(true)
    }

    /// Opens a session for one operation.
    fn session(&self, credentials: &Credentials) -> Result<CmisSession, DataPrepError> {
        self.sessions.open(credentials, self.binding)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the object id of the library root or of the named folder inside it.
fn library_target(
    session: &CmisSession,
    site: &SiteId,
    parent: Option<&str>,
) -> Result<String, DataPrepError> {
    require_value(site.as_str(), "site id")?;
    match parent {
        None => {
            let path = site_library_path(site);
            let library = session
                .object_by_path(&path)?
                .ok_or_else(|| DataPrepError::NotFound(format!("document library of site {site}")))?;
            Ok(library.id)
        }
        Some(name) => {
            let node = NodeResolver::new(session)
                .locate_in_site(site, name)?
                .ok_or_else(|| DataPrepError::NotFound(format!("folder {name} in site {site}")))?;
            if !node.is_folder {
                return Err(DataPrepError::InvalidArgument(format!("{name} is not a folder")));
            }
            Ok(node.object_id)
        }
    }
}
