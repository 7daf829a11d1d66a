// crates/dataprep-core/src/lib.rs
// ============================================================================
// Module: Dataprep Core Library
// Description: Session management, node resolution, and HTTP plumbing.
// Purpose: Shared foundation for content-server fixture preparation.
// Dependencies: base64, quick-xml, reqwest, serde, serde_json, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! `dataprep-core` holds the pieces every fixture wrapper depends on:
//! - [`HttpClient`] executes one blocking, basic-authenticated request per call
//!   and classifies the status code.
//! - [`SessionFactory`] opens a fresh [`CmisSession`] per logical operation.
//! - [`NodeResolver`] walks a folder tree and maps display names to
//!   [`NodeRef`] values.
//!
//! Invariants:
//! - Sessions and name indexes are never cached between calls.
//! - HTTP 401 always surfaces as [`DataPrepError::Unauthorized`].
//! - Response bodies are bounded by [`HttpClientOptions::max_response_bytes`].

// ============================================================================
// SECTION: Modules
// ============================================================================

mod atom;
pub mod cmis;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod resolver;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cmis::BaseType;
pub use cmis::Binding;
pub use cmis::CmisObject;
pub use cmis::RepositoryInfo;
pub use error::DataPrepError;
pub use error::DataPrepResult;
pub use error::require_value;
pub use http::HttpClient;
pub use http::HttpClientOptions;
pub use http::MultipartBody;
pub use http::RestRequest;
pub use http::RestResponse;
pub use http::Scheme;
pub use http::ServerAddress;
pub use identifiers::Credentials;
pub use identifiers::NodeRef;
pub use identifiers::SiteId;
pub use resolver::ContentIndex;
pub use resolver::FolderTree;
pub use resolver::IndexedNode;
pub use resolver::fold_name;
pub use resolver::NodeResolver;
pub use resolver::site_library_path;
pub use session::CmisSession;
pub use session::SessionFactory;
