// crates/dataprep-services/src/lib.rs
// ============================================================================
// Module: Dataprep Services Library
// Description: Fixture wrappers for sites, users, content, social data, tasks, and dashboards.
// Purpose: Prepare content-server test data through thin typed calls.
// Dependencies: dataprep-core, serde, serde_json, time, tracing, urlencoding
// ============================================================================

//! ## Overview
//! Each service wraps one area of the content server and takes credentials
//! per call. [`DataPrep`] bundles them over a single [`HttpClient`].
//! Status conventions:
//! - Expected non-success statuses (conflict on create, not found on lookup or
//!   delete) return `Ok(false)` and log a warning.
//! - HTTP 401 returns [`dataprep_core::DataPrepError::Unauthorized`].
//! - Any other status returns [`dataprep_core::DataPrepError::UnexpectedStatus`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod content;
pub mod dashboard;
pub mod people;
pub mod sites;
pub mod social;
pub mod workflow;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use content::ContentService;
pub use content::NewDocument;
pub use dashboard::DashboardLayout;
pub use dashboard::DashboardService;
pub use dashboard::Dashlet;
pub use people::NewUser;
pub use people::PeopleService;
pub use sites::NewSite;
pub use sites::SiteRole;
pub use sites::SiteService;
pub use sites::SiteVisibility;
pub use social::Comment;
pub use social::SocialService;
pub use social::Tag;
pub use workflow::NewTask;
pub use workflow::TaskPriority;
pub use workflow::WorkflowService;
pub use workflow::parse_due_date;

use dataprep_core::Binding;
use dataprep_core::HttpClient;
use dataprep_core::SessionFactory;

// ============================================================================
// SECTION: Facade
// ============================================================================

/// All fixture services bound to one content server.
#[derive(Debug, Clone)]
pub struct DataPrep {
    /// HTTP executor shared by every service.
    client: HttpClient,
    /// CMIS binding used by content operations.
    binding: Binding,
}

impl DataPrep {
    /// Creates the facade over an HTTP client.
    #[must_use]
    pub const fn new(client: HttpClient, binding: Binding) -> Self {
        Self {
            client,
            binding,
        }
    }

    /// Returns the site service.
    #[must_use]
    pub fn sites(&self) -> SiteService {
        SiteService::new(self.client.clone())
    }

    /// Returns the user service.
    #[must_use]
    pub fn people(&self) -> PeopleService {
        PeopleService::new(self.client.clone())
    }

    /// Returns the content service.
    #[must_use]
    pub fn content(&self) -> ContentService {
        ContentService::new(SessionFactory::new(self.client.clone()), self.binding)
    }

    /// Returns the social metadata service.
    #[must_use]
    pub fn social(&self) -> SocialService {
        SocialService::new(self.client.clone())
    }

    /// Returns the workflow service.
    #[must_use]
    pub fn workflow(&self) -> WorkflowService {
        WorkflowService::new(self.client.clone())
    }

    /// Returns the dashboard service.
    #[must_use]
    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.client.clone())
    }
}
