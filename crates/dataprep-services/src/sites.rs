// crates/dataprep-services/src/sites.rs
// ============================================================================
// Module: Site Fixtures
// Description: Create, look up, delete, and populate collaboration sites.
// Purpose: Prepare site fixtures through the public REST API.
// Dependencies: dataprep-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`SiteService`] wraps the `sites` collection of the public REST API.
//! Creation and membership return `false` when the server reports a conflict;
//! existence checks and deletion return `false` when the site is absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dataprep_core::Credentials;
use dataprep_core::DataPrepError;
use dataprep_core::HttpClient;
use dataprep_core::RestRequest;
use dataprep_core::SiteId;
use dataprep_core::http::PUBLIC_API_PATH;
use dataprep_core::require_value;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Visibility of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteVisibility {
    /// Anyone may see and join the site.
    #[default]
    Public,
    /// Anyone may see the site; joining requires approval.
    Moderated,
    /// Only members may see the site.
    Private,
}

/// Role granted to a site member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SiteRole {
    /// Read-only access.
    #[default]
    SiteConsumer,
    /// May add content and edit their own.
    SiteContributor,
    /// May add and edit any content.
    SiteCollaborator,
    /// Full control of the site.
    SiteManager,
}

impl SiteRole {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SiteConsumer => "SiteConsumer",
            Self::SiteContributor => "SiteContributor",
            Self::SiteCollaborator => "SiteCollaborator",
            Self::SiteManager => "SiteManager",
        }
    }
}

/// Site creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSite {
    /// Short name used in URLs.
    pub id: SiteId,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Visibility.
    pub visibility: SiteVisibility,
}

impl NewSite {
    /// Creates a public site request whose title defaults to the id.
    #[must_use]
    pub fn new(id: SiteId) -> Self {
        Self {
            title: id.as_str().to_string(),
            description: String::new(),
            visibility: SiteVisibility::Public,
            id,
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub const fn visibility(mut self, visibility: SiteVisibility) -> Self {
        self.visibility = visibility;
        self
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Site fixture operations.
#[derive(Debug, Clone)]
pub struct SiteService {
    /// HTTP executor.
    client: HttpClient,
}

impl SiteService {
    /// Creates the service over an HTTP client.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self {
            client,
        }
    }

    /// Creates a site. Returns `false` when the site id is already taken.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn create_site(
        &self,
        credentials: &Credentials,
        site: &NewSite,
    ) -> Result<bool, DataPrepError> {
        require_value(site.id.as_str(), "site id")?;
        require_value(&site.title, "site title")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["sites"])?;
        let body = serde_json::to_value(site)
            .map_err(|err| DataPrepError::Protocol(format!("site request encoding: {err}")))?;
        let request = RestRequest::post("create site", url).json(body);
        self.client.execute(credentials, request)?.into_outcome(&[201], &[409])
    }

    /// Returns true when the site exists.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn site_exists(&self, credentials: &Credentials, site: &SiteId) -> Result<bool, DataPrepError> {
        require_value(site.as_str(), "site id")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["sites", site.as_str()])?;
        let response = self.client.execute(credentials, RestRequest::get("site exists", url))?;
        match response.status() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(response.into_error()),
        }
    }

    /// Deletes a site permanently. Returns `false` when the site does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn delete_site(&self, credentials: &Credentials, site: &SiteId) -> Result<bool, DataPrepError> {
        require_value(site.as_str(), "site id")?;
        let mut url = self.client.endpoint(PUBLIC_API_PATH, &["sites", site.as_str()])?;
        url.query_pairs_mut().append_pair("permanent", "true");
        self.client
            .execute(credentials, RestRequest::delete("delete site", url))?
            .into_outcome(&[204], &[404])
    }

    /// Adds a user to a site. Returns `false` when the user is already a member.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn add_member(
        &self,
        credentials: &Credentials,
        site: &SiteId,
        user_id: &str,
        role: SiteRole,
    ) -> Result<bool, DataPrepError> {
        require_value(site.as_str(), "site id")?;
        require_value(user_id, "user id")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["sites", site.as_str(), "members"])?;
        let request = RestRequest::post("add site member", url).json(json!({
            "id": user_id,
            "role": role.as_str(),
        }));
        self.client.execute(credentials, request)?.into_outcome(&[201], &[409])
    }
}
