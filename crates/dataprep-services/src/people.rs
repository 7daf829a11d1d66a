// crates/dataprep-services/src/people.rs
// ============================================================================
// Module: User Fixtures
// Description: Create, look up, and delete user accounts.
// Purpose: Prepare user fixtures through the public and service APIs.
// Dependencies: dataprep-core, serde
// ============================================================================

//! ## Overview
//! Accounts are created and looked up through the public `people` collection.
//! Deletion goes through the legacy service API, which the public API lacks.

use std::fmt;

use dataprep_core::Credentials;
use dataprep_core::DataPrepError;
use dataprep_core::HttpClient;
use dataprep_core::RestRequest;
use dataprep_core::http::PUBLIC_API_PATH;
use dataprep_core::http::SERVICE_API_PATH;
use dataprep_core::require_value;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Account creation request.
///
/// # Invariants
/// - `Debug` output never contains the password.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Account name.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact address.
    pub email: String,
    /// Initial password.
    pub password: String,
}

impl NewUser {
    /// Creates a request with generated name and email fields.
    #[must_use]
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            first_name: id.clone(),
            last_name: id.clone(),
            email: format!("{id}@example.com"),
            password: password.into(),
            id,
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// User fixture operations.
#[derive(Debug, Clone)]
pub struct PeopleService {
    /// HTTP executor.
    client: HttpClient,
}

impl PeopleService {
    /// Creates the service over an HTTP client.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self {
            client,
        }
    }

    /// Creates an account. Returns `false` when the account already exists.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn create_user(&self, credentials: &Credentials, user: &NewUser) -> Result<bool, DataPrepError> {
        require_value(&user.id, "user id")?;
        require_value(&user.password, "user password")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["people"])?;
        let body = serde_json::to_value(user)
            .map_err(|err| DataPrepError::Protocol(format!("user request encoding: {err}")))?;
        self.client
            .execute(credentials, RestRequest::post("create user", url).json(body))?
            .into_outcome(&[201], &[409])
    }

    /// Returns true when the account exists.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn user_exists(&self, credentials: &Credentials, user_id: &str) -> Result<bool, DataPrepError> {
        require_value(user_id, "user id")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["people", user_id])?;
        let response = self.client.execute(credentials, RestRequest::get("user exists", url))?;
        match response.status() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(response.into_error()),
        }
    }

    /// Deletes an account. Returns `false` when the account does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn delete_user(&self, credentials: &Credentials, user_id: &str) -> Result<bool, DataPrepError> {
        require_value(user_id, "user id")?;
        let url = self.client.endpoint(SERVICE_API_PATH, &["people", user_id])?;
        self.client
            .execute(credentials, RestRequest::delete("delete user", url))?
            .into_outcome(&[200], &[404])
    }
}
