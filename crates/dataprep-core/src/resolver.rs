// crates/dataprep-core/src/resolver.rs
// ============================================================================
// Module: Node Resolver
// Description: Name-to-node resolution by walking a repository folder tree.
// Purpose: Turn display names under a site or path into node references.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! [`NodeResolver`] walks the subtree below a site's document library (or any
//! repository path), records every object in a [`ContentIndex`] keyed by its
//! case-folded display name, and answers lookups from that index.
//! Invariants:
//! - The index is a local value built per call; nothing is kept between calls.
//! - Entries for one name keep pre-order traversal order, so the first match
//!   is deterministic for a given tree.
//! - Folders are descended at most once even if the repository multi-files them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;
use tracing::warn;

use crate::cmis::CmisObject;
use crate::error::DataPrepError;
use crate::error::require_value;
use crate::identifiers::NodeRef;
use crate::identifiers::SiteId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the document library container inside a site.
pub const DOCUMENT_LIBRARY: &str = "documentLibrary";

/// Returns the repository path of a site's document library.
#[must_use]
pub fn site_library_path(site: &SiteId) -> String {
    format!("/Sites/{}/{DOCUMENT_LIBRARY}", site.as_str())
}

// ============================================================================
// SECTION: Folder Tree Seam
// ============================================================================

/// Read access to a repository folder tree.
pub trait FolderTree {
    /// Lists the direct children of a folder in server order.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the listing fails.
    fn children(&self, folder_id: &str) -> Result<Vec<CmisObject>, DataPrepError>;

    /// Looks up an object by repository path.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the lookup fails.
    fn object_by_path(&self, path: &str) -> Result<Option<CmisObject>, DataPrepError>;
}

// ============================================================================
// SECTION: Content Index
// ============================================================================

/// A node recorded during a tree walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedNode {
    /// Normalized node reference.
    pub node_ref: NodeRef,
    /// Raw CMIS object id; the form CMIS calls must be addressed with.
    pub object_id: String,
    /// Display name as reported by the repository.
    pub name: String,
    /// True when the node is a folder.
    pub is_folder: bool,
    /// Depth below the walk root (direct children are depth 1).
    pub depth: usize,
}

/// Case-insensitive name index built from one tree walk.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    /// Entries keyed by case-folded name, in traversal order.
    entries: BTreeMap<String, Vec<IndexedNode>>,
    /// Total number of recorded nodes.
    len: usize,
}

impl ContentIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node; earlier entries for the same name are kept.
    pub fn insert(&mut self, node: IndexedNode) {
        self.entries.entry(fold_name(&node.name)).or_default().push(node);
        self.len += 1;
    }

    /// Returns the first node recorded under `name` (case-insensitive).
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&IndexedNode> {
        self.matches(name).first()
    }

    /// Returns every node recorded under `name` in traversal order.
    #[must_use]
    pub fn matches(&self, name: &str) -> &[IndexedNode] {
        self.entries.get(&fold_name(name)).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns true when more than one node shares `name`.
    #[must_use]
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.matches(name).len() > 1
    }

    /// Returns the number of recorded nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no node was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Folds a display name for case-insensitive comparison.
///
/// Uses full Unicode lowercasing so `Über` and `über` fold to the same key.
#[must_use]
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

// ============================================================================
// SECTION: Tree Walk
// ============================================================================

/// Walks every object below `root_id` in pre-order and indexes it.
///
/// # Errors
///
/// Returns [`DataPrepError`] when any folder listing fails.
pub fn index_subtree<T: FolderTree + ?Sized>(
    tree: &T,
    root_id: &str,
) -> Result<ContentIndex, DataPrepError> {
    let mut index = ContentIndex::new();
    let mut visited = BTreeSet::new();
    visited.insert(root_id.to_string());
    let mut pending: Vec<(CmisObject, usize)> =
        tree.children(root_id)?.into_iter().rev().map(|child| (child, 1)).collect();
    while let Some((object, depth)) = pending.pop() {
        if object.is_folder() && visited.insert(object.id.clone()) {
            let children = tree.children(&object.id)?;
            pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
        index.insert(IndexedNode {
            node_ref: object.node_ref(),
            is_folder: object.is_folder(),
            object_id: object.id,
            name: object.name,
            depth,
        });
    }
    Ok(index)
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves display names to node references below a site or path.
#[derive(Debug)]
pub struct NodeResolver<'a, T: ?Sized> {
    /// Folder tree to walk.
    tree: &'a T,
}

impl<'a, T: FolderTree + ?Sized> NodeResolver<'a, T> {
    /// Creates a resolver over a folder tree (usually a [`crate::CmisSession`]).
    #[must_use]
    pub const fn new(tree: &'a T) -> Self {
        Self {
            tree,
        }
    }

    /// Indexes everything below a repository path.
    ///
    /// A missing path yields an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn index_path(&self, path: &str) -> Result<ContentIndex, DataPrepError> {
        require_value(path, "path")?;
        let Some(root) = self.tree.object_by_path(path)? else {
            debug!(path, "walk root not found");
            return Ok(ContentIndex::new());
        };
        if !root.is_folder() {
            return Err(DataPrepError::InvalidArgument(format!("{path} is not a folder")));
        }
        let index = index_subtree(self.tree, &root.id)?;
        debug!(path, nodes = index.len(), "content index built");
        Ok(index)
    }

    /// Indexes everything below a site's document library.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn index_site(&self, site: &SiteId) -> Result<ContentIndex, DataPrepError> {
        require_value(site.as_str(), "site id")?;
        self.index_path(&site_library_path(site))
    }

    /// Locates the indexed node for `name` anywhere below a path.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn locate_in_path(
        &self,
        path: &str,
        name: &str,
    ) -> Result<Option<IndexedNode>, DataPrepError> {
        require_value(name, "content name")?;
        let index = self.index_path(path)?;
        Ok(pick(&index, name))
    }

    /// Locates the indexed node for `name` anywhere below a site's document library.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn locate_in_site(
        &self,
        site: &SiteId,
        name: &str,
    ) -> Result<Option<IndexedNode>, DataPrepError> {
        require_value(name, "content name")?;
        let index = self.index_site(site)?;
        Ok(pick(&index, name))
    }

    /// Finds a node by display name anywhere below a path.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn find_in_path(&self, path: &str, name: &str) -> Result<Option<NodeRef>, DataPrepError> {
        Ok(self.locate_in_path(path, name)?.map(|node| node.node_ref))
    }

    /// Finds a node by display name anywhere below a site's document library.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn find_in_site(
        &self,
        site: &SiteId,
        name: &str,
    ) -> Result<Option<NodeRef>, DataPrepError> {
        Ok(self.locate_in_site(site, name)?.map(|node| node.node_ref))
    }

    /// Returns the node reference of `name` below a site, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn node_ref_in_site(&self, site: &SiteId, name: &str) -> Result<String, DataPrepError> {
        Ok(self.find_in_site(site, name)?.map(NodeRef::into_string).unwrap_or_default())
    }

    /// Returns the node reference of `name` below a path, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a lookup or listing fails.
    pub fn node_ref_in_path(&self, path: &str, name: &str) -> Result<String, DataPrepError> {
        Ok(self.find_in_path(path, name)?.map(NodeRef::into_string).unwrap_or_default())
    }

    /// Returns the node reference of the object at an exact path, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the lookup fails.
    pub fn node_ref_at_path(&self, path: &str) -> Result<String, DataPrepError> {
        require_value(path, "path")?;
        Ok(self
            .tree
            .object_by_path(path)?
            .map(|object| object.node_ref().into_string())
            .unwrap_or_default())
    }
}

/// Picks the first match for `name`, warning when the name is ambiguous.
fn pick(index: &ContentIndex, name: &str) -> Option<IndexedNode> {
    let matches = index.matches(name);
    if matches.len() > 1 {
        warn!(name, candidates = matches.len(), "content name is ambiguous; using first match");
    }
    matches.first().cloned()
}
