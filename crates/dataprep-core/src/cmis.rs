// crates/dataprep-core/src/cmis.rs
// ============================================================================
// Module: CMIS Object Model
// Description: CMIS bindings, repository info, and succinct object parsing.
// Purpose: Decode browser-binding JSON into typed repository objects.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The browser binding returns objects in "succinct" form: a flat map of
//! `cmis:*` property ids to values. This module decodes the three shapes the
//! session needs: the repository map, a single object, and a children page.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::DataPrepError;
use crate::identifiers::NodeRef;

// ============================================================================
// SECTION: Bindings
// ============================================================================

/// CMIS protocol binding used to open a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// JSON browser binding.
    #[default]
    Browser,
    /// XML AtomPub binding.
    #[serde(rename = "atompub")]
    AtomPub,
}

impl Binding {
    /// Returns the binding label used in config and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::AtomPub => "atompub",
        }
    }
}

// ============================================================================
// SECTION: Repository Objects
// ============================================================================

/// Base type of a repository object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    /// `cmis:folder`.
    Folder,
    /// `cmis:document`.
    Document,
    /// Any other base type (items, relationships, policies).
    Other,
}

impl BaseType {
    /// Maps a `cmis:baseTypeId` value onto a base type.
    #[must_use]
    pub fn from_type_id(type_id: &str) -> Self {
        match type_id {
            "cmis:folder" => Self::Folder,
            "cmis:document" => Self::Document,
            _ => Self::Other,
        }
    }
}

/// A folder, document, or other object returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmisObject {
    /// Raw CMIS object id (may carry store prefix and version).
    pub id: String,
    /// Display name (`cmis:name`).
    pub name: String,
    /// Base type.
    pub base_type: BaseType,
    /// Concrete object type id (`cmis:objectTypeId`).
    pub object_type_id: String,
}

impl CmisObject {
    /// Returns the normalized node reference for this object.
    #[must_use]
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::from_object_id(&self.id)
    }

    /// Returns true when the object is a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.base_type == BaseType::Folder
    }
}

/// Repository discovered when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Repository id.
    pub id: String,
    /// Object id of the repository root folder.
    pub root_folder_id: String,
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Succinct property map of an object.
#[derive(Debug, Deserialize)]
struct SuccinctProperties {
    /// `cmis:objectId`.
    #[serde(rename = "cmis:objectId")]
    object_id: String,
    /// `cmis:name`.
    #[serde(rename = "cmis:name", default)]
    name: String,
    /// `cmis:baseTypeId`.
    #[serde(rename = "cmis:baseTypeId", default)]
    base_type_id: String,
    /// `cmis:objectTypeId`.
    #[serde(rename = "cmis:objectTypeId", default)]
    object_type_id: String,
}

/// Object envelope carrying succinct properties.
#[derive(Debug, Deserialize)]
pub(crate) struct SuccinctObject {
    /// Property map.
    #[serde(rename = "succinctProperties")]
    properties: SuccinctProperties,
}

impl SuccinctObject {
    /// Converts the wire object into a [`CmisObject`].
    pub(crate) fn into_object(self) -> CmisObject {
        let properties = self.properties;
        CmisObject {
            base_type: BaseType::from_type_id(&properties.base_type_id),
            id: properties.object_id,
            name: properties.name,
            object_type_id: properties.object_type_id,
        }
    }
}

/// One entry of a children listing.
#[derive(Debug, Deserialize)]
struct ChildEntry {
    /// Child object.
    object: SuccinctObject,
}

/// Children listing page.
#[derive(Debug, Deserialize)]
pub(crate) struct ChildrenPage {
    /// Objects on this page.
    #[serde(default)]
    objects: Vec<ChildEntry>,
    /// True when another page follows.
    #[serde(rename = "hasMoreItems", default)]
    pub(crate) has_more_items: bool,
}

impl ChildrenPage {
    /// Consumes the page and returns its objects in server order.
    pub(crate) fn into_objects(self) -> Vec<CmisObject> {
        self.objects.into_iter().map(|entry| entry.object.into_object()).collect()
    }
}

/// Repository descriptor from the service document.
#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    /// Repository id.
    #[serde(rename = "repositoryId")]
    repository_id: String,
    /// Root folder object id.
    #[serde(rename = "rootFolderId")]
    root_folder_id: String,
}

/// Picks the first repository from a browser-binding service document.
///
/// # Errors
///
/// Returns [`DataPrepError::Protocol`] when the document lists no repository.
pub(crate) fn first_repository(body: &[u8]) -> Result<RepositoryInfo, DataPrepError> {
    let repositories: BTreeMap<String, RepositoryEntry> = serde_json::from_slice(body)
        .map_err(|err| DataPrepError::Protocol(format!("invalid repository info: {err}")))?;
    let entry = repositories
        .into_values()
        .next()
        .ok_or_else(|| DataPrepError::Protocol("server exposes no cmis repository".to_string()))?;
    Ok(RepositoryInfo {
        id: entry.repository_id,
        root_folder_id: entry.root_folder_id,
    })
}
