// crates/dataprep-services/src/dashboard.rs
// ============================================================================
// Module: Dashboard Fixtures
// Description: Site and user dashboard customization through the web tier.
// Purpose: Apply a layout and dashlet set to a dashboard page.
// Dependencies: dataprep-core, serde_json, tracing, urlencoding
// ============================================================================

//! ## Overview
//! Dashboards are owned by the Share web tier, which does not accept basic
//! authentication. [`DashboardService`] logs in with a form post on a
//! cookie-carrying client, reads the CSRF token cookie, and posts the new
//! layout with that token echoed in a request header.
//! Invariants:
//! - Each customization uses its own login and cookie jar.
//! - A login redirect to the failure page surfaces as
//!   [`DataPrepError::Unauthorized`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use dataprep_core::Credentials;
use dataprep_core::DataPrepError;
use dataprep_core::HttpClient;
use dataprep_core::RestRequest;
use dataprep_core::RestResponse;
use dataprep_core::SiteId;
use dataprep_core::http::SHARE_PATH;
use dataprep_core::require_value;
use serde_json::Value;
use serde_json::json;
use tracing::debug;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cookie and header carrying the web-tier CSRF token.
pub const CSRF_TOKEN_NAME: &str = "Alfresco-CSRFToken";

/// Well-known dashlet component URLs.
pub mod dashlets {
    /// Site members.
    pub const SITE_MEMBERS: &str = "/components/dashlets/colleagues";
    /// Site content summary.
    pub const SITE_CONTENT: &str = "/components/dashlets/docsummary";
    /// Site activity feed.
    pub const SITE_ACTIVITIES: &str = "/components/dashlets/activityfeed";
    /// Site calendar.
    pub const SITE_CALENDAR: &str = "/components/dashlets/calendar";
    /// Site wiki.
    pub const SITE_WIKI: &str = "/components/dashlets/wiki";
    /// Site profile.
    pub const SITE_PROFILE: &str = "/components/dashlets/site-profile";
    /// User's sites.
    pub const MY_SITES: &str = "/components/dashlets/my-sites";
    /// User's tasks.
    pub const MY_TASKS: &str = "/components/dashlets/my-tasks";
    /// User's activities.
    pub const MY_ACTIVITIES: &str = "/components/dashlets/my-activities";
    /// User's documents.
    pub const MY_DOCUMENTS: &str = "/components/dashlets/my-documents";
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Column layout of a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardLayout {
    /// One column.
    OneColumn,
    /// Two columns, narrow left and wide right.
    #[default]
    TwoColumnsWideRight,
    /// Two columns, wide left and narrow right.
    TwoColumnsWideLeft,
    /// Three columns.
    ThreeColumns,
    /// Four columns.
    FourColumns,
}

impl DashboardLayout {
    /// Every layout, in column order.
    pub const ALL: [Self; 5] = [
        Self::OneColumn,
        Self::TwoColumnsWideRight,
        Self::TwoColumnsWideLeft,
        Self::ThreeColumns,
        Self::FourColumns,
    ];

    /// Returns the web-tier template id.
    #[must_use]
    pub const fn template_id(self) -> &'static str {
        match self {
            Self::OneColumn => "dashboard-1-column",
            Self::TwoColumnsWideRight => "dashboard-2-columns-wide-right",
            Self::TwoColumnsWideLeft => "dashboard-2-columns-wide-left",
            Self::ThreeColumns => "dashboard-3-columns",
            Self::FourColumns => "dashboard-4-columns",
        }
    }

    /// Returns the number of columns.
    #[must_use]
    pub const fn columns(self) -> u8 {
        match self {
            Self::OneColumn => 1,
            Self::TwoColumnsWideRight | Self::TwoColumnsWideLeft => 2,
            Self::ThreeColumns => 3,
            Self::FourColumns => 4,
        }
    }

    /// Looks a layout up by template id.
    #[must_use]
    pub fn from_template_id(template_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layout| layout.template_id() == template_id)
    }
}

/// A dashlet placed in a dashboard region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashlet {
    /// Component URL (see [`dashlets`]).
    pub url: String,
    /// One-based column.
    pub column: u8,
    /// One-based position inside the column.
    pub position: u8,
}

impl Dashlet {
    /// Places a dashlet at a column and position.
    #[must_use]
    pub fn new(url: impl Into<String>, column: u8, position: u8) -> Self {
        Self {
            url: url.into(),
            column,
            position,
        }
    }

    /// Returns the region id the web tier expects.
    #[must_use]
    pub fn region_id(&self) -> String {
        format!("component-{}-{}", self.column, self.position)
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Dashboard fixture operations.
#[derive(Debug, Clone)]
pub struct DashboardService {
    /// HTTP executor; cloned into a cookie-carrying client per customization.
    client: HttpClient,
}

impl DashboardService {
    /// Creates the service over an HTTP client.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self {
            client,
        }
    }

    /// Customizes a site dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::Unauthorized`] when the login fails and
    /// [`DataPrepError`] for invalid dashlets or request failures.
    pub fn customize_site_dashboard(
        &self,
        credentials: &Credentials,
        site: &SiteId,
        layout: DashboardLayout,
        dashlets: &[Dashlet],
    ) -> Result<bool, DataPrepError> {
        require_value(site.as_str(), "site id")?;
        let page = format!("site/{}/dashboard", site.as_str());
        self.customize(credentials, &page, layout, dashlets)
    }

    /// Customizes the calling user's dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError::Unauthorized`] when the login fails and
    /// [`DataPrepError`] for invalid dashlets or request failures.
    pub fn customize_user_dashboard(
        &self,
        credentials: &Credentials,
        layout: DashboardLayout,
        dashlets: &[Dashlet],
    ) -> Result<bool, DataPrepError> {
        require_value(credentials.username(), "username")?;
        let page = format!("user/{}/dashboard", credentials.username());
        self.customize(credentials, &page, layout, dashlets)
    }

    /// Logs in and posts the dashboard definition for `page`.
    fn customize(
        &self,
        credentials: &Credentials,
        page: &str,
        layout: DashboardLayout,
        dashlets: &[Dashlet],
    ) -> Result<bool, DataPrepError> {
        let body = dashboard_body(page, layout, dashlets)?;
        let share = ShareSession::login(&self.client, credentials)?;
        let token = share.csrf_token(page)?;
        let url = share.client.endpoint(
            SHARE_PATH,
            &["service", "components", "dashboard", "customise-dashboard"],
        )?;
        let request = RestRequest::post("customize dashboard", url)
            .without_basic_auth()
            .header(CSRF_TOKEN_NAME, token)
            .json(body);
        let response = share.client.execute(credentials, request)?.require_status(&[200])?;
        if !reported_success(&response) {
            warn!(page, "dashboard customization reported failure");
            return Ok(false);
        }
        info!(page, layout = layout.template_id(), dashlets = dashlets.len(), "dashboard customized");
        Ok(true)
    }
}

// ============================================================================
// SECTION: Web-Tier Session
// ============================================================================

/// Logged-in web-tier session backed by a private cookie jar.
struct ShareSession<'a> {
    /// Cookie-carrying client.
    client: HttpClient,
    /// Credentials used at login.
    credentials: &'a Credentials,
    /// Token captured from the login response, if any.
    login_token: Option<String>,
}

impl<'a> ShareSession<'a> {
    /// Posts the login form and checks where the server redirects.
    fn login(base: &HttpClient, credentials: &'a Credentials) -> Result<Self, DataPrepError> {
        require_value(credentials.username(), "username")?;
        let client = base.with_cookie_store()?;
        let url = client.endpoint(SHARE_PATH, &["page", "dologin"])?;
        let request = RestRequest::post("web-tier login", url).without_basic_auth().form([
            ("username", credentials.username()),
            ("password", credentials.password()),
            ("success", "/share/page/"),
            ("failure", "/share/page/?error=true"),
        ]);
        let response = client.execute(credentials, request)?.require_status(&[200, 302, 303])?;
        if response.header("location").is_some_and(|location| location.contains("error")) {
            warn!(user = credentials.username(), "web-tier login rejected");
            return Err(DataPrepError::Unauthorized {
                username: credentials.username().to_string(),
            });
        }
        debug!(user = credentials.username(), "web-tier login accepted");
        Ok(Self {
            login_token: csrf_cookie(&response),
            client,
            credentials,
        })
    }

    /// Returns the CSRF token, loading `page` when login did not issue one.
    fn csrf_token(&self, page: &str) -> Result<String, DataPrepError> {
        if let Some(token) = &self.login_token {
            return Ok(token.clone());
        }
        let mut segments = vec!["page"];
        segments.extend(page.split('/'));
        let url = self.client.endpoint(SHARE_PATH, &segments)?;
        let response = self
            .client
            .execute(self.credentials, RestRequest::get("load dashboard page", url).without_basic_auth())?
            .require_status(&[200])?;
        csrf_cookie(&response)
            .ok_or_else(|| DataPrepError::Protocol("web tier issued no csrf token".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts and decodes the CSRF token from `Set-Cookie` headers.
fn csrf_cookie(response: &RestResponse) -> Option<String> {
    response.header_values("set-cookie").into_iter().find_map(|cookie| {
        let pair = cookie.split(';').next()?;
        let (name, value) = pair.split_once('=')?;
        if name.trim() != CSRF_TOKEN_NAME {
            return None;
        }
        urlencoding::decode(value.trim()).ok().map(|token| token.into_owned())
    })
}

/// Builds the customization body after validating dashlet placement.
fn dashboard_body(
    page: &str,
    layout: DashboardLayout,
    dashlets: &[Dashlet],
) -> Result<Value, DataPrepError> {
    let mut entries = Vec::with_capacity(dashlets.len());
    for dashlet in dashlets {
        require_value(&dashlet.url, "dashlet url")?;
        if dashlet.column == 0 || dashlet.column > layout.columns() || dashlet.position == 0 {
            return Err(DataPrepError::InvalidArgument(format!(
                "dashlet {} cannot be placed at {} in layout {}",
                dashlet.url,
                dashlet.region_id(),
                layout.template_id()
            )));
        }
        entries.push(json!({
            "url": dashlet.url,
            "regionId": dashlet.region_id(),
        }));
    }
    Ok(json!({
        "dashboardPage": page,
        "templateId": layout.template_id(),
        "dashlets": entries,
    }))
}

/// Reads the optional `success` flag of a customization response.
fn reported_success(response: &RestResponse) -> bool {
    serde_json::from_slice::<Value>(response.body())
        .ok()
        .and_then(|body| body.get("success").and_then(Value::as_bool))
        .unwrap_or(true)
}
