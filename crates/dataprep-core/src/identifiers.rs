// crates/dataprep-core/src/identifiers.rs
// ============================================================================
// Module: Dataprep Identifiers
// Description: Opaque identifiers and credentials passed to every operation.
// Purpose: Keep node references, site ids, and secrets strongly typed.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Node references are opaque repository identifiers. CMIS reports them as
//! store-qualified, versioned ids (`workspace://SpacesStore/<uuid>;1.0`); the
//! REST API addresses the same node by the bare `<uuid>`.
//! [`NodeRef::from_object_id`] performs that normalization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Node References
// ============================================================================

/// Repository-assigned identifier for a document, folder, or other node.
///
/// # Invariants
/// - Never carries a store prefix or a version suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(String);

impl NodeRef {
    /// Creates a node reference from an already-normalized identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Normalizes a CMIS object id into a REST node reference.
    ///
    /// Strips a `<protocol>://<store>/` prefix and a `;<version>` suffix.
    #[must_use]
    pub fn from_object_id(object_id: &str) -> Self {
        let trimmed = object_id.trim();
        let unqualified = match trimmed.split_once("://") {
            Some((_, rest)) => rest.rsplit_once('/').map_or(rest, |(_, id)| id),
            None => trimmed,
        };
        let unversioned = unqualified.split_once(';').map_or(unqualified, |(id, _)| id);
        Self(unversioned.to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the reference and returns the identifier.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Site Identifiers
// ============================================================================

/// Short name of a collaboration site.
///
/// # Invariants
/// - Opaque UTF-8 string; the server enforces its own naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Creates a new site identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Username and password sent with every request.
///
/// # Invariants
/// - `Debug` output never contains the password.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Account name.
    username: String,
    /// Account password.
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
