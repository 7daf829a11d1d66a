// crates/dataprep-config/src/config.rs
// ============================================================================
// Module: Dataprep Configuration
// Description: Configuration loading and validation for fixture preparation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: dataprep-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to a local development server
//! (`http://localhost:8080`, `admin`/`admin`). Invalid values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use dataprep_core::Binding;
use dataprep_core::Credentials;
use dataprep_core::HttpClientOptions;
use dataprep_core::Scheme;
use dataprep_core::ServerAddress;
use dataprep_core::http::DEFAULT_MAX_RESPONSE_BYTES;
use dataprep_core::http::DEFAULT_TIMEOUT_MS;
use dataprep_core::http::DEFAULT_USER_AGENT;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "dataprep.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DATAPREP_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a host name.
pub(crate) const MAX_HOST_LENGTH: usize = 253;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Minimum response size limit in bytes.
pub(crate) const MIN_RESPONSE_BYTES: usize = 1024;
/// Maximum response size limit in bytes.
pub(crate) const MAX_RESPONSE_BYTES: usize = 256 * 1024 * 1024;
/// Maximum user agent length.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Fixture preparation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DataPrepConfig {
    /// Content server coordinates.
    #[serde(default)]
    pub server: ServerConfig,
    /// Administrator account used when no user is given.
    #[serde(default)]
    pub admin: AdminConfig,
    /// HTTP client tunables.
    #[serde(default)]
    pub http: HttpConfig,
    /// CMIS session settings.
    #[serde(default)]
    pub cmis: CmisConfig,
}

impl DataPrepConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// An explicit path wins, then [`CONFIG_ENV_VAR`], then `dataprep.toml`
    /// in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Loads configuration, using defaults when no path is named and no
    /// `dataprep.toml` exists in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a named or present file fails to load.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_none()
            && env::var_os(CONFIG_ENV_VAR).is_none()
            && !Path::new(DEFAULT_CONFIG_NAME).exists()
        {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.admin.validate()?;
        self.http.validate()?;
        Ok(())
    }

    /// Returns the content server address.
    #[must_use]
    pub fn server_address(&self) -> ServerAddress {
        ServerAddress::new(self.server.scheme, self.server.host.trim(), self.server.port)
    }

    /// Returns the HTTP client options.
    #[must_use]
    pub fn http_options(&self) -> HttpClientOptions {
        HttpClientOptions {
            timeout_ms: self.http.timeout_ms,
            max_response_bytes: self.http.max_response_bytes,
            user_agent: self.http.user_agent.clone(),
        }
    }

    /// Returns the administrator credentials.
    #[must_use]
    pub fn admin_credentials(&self) -> Credentials {
        Credentials::new(self.admin.username.clone(), self.admin.password.clone())
    }

    /// Returns the CMIS binding.
    #[must_use]
    pub const fn binding(&self) -> Binding {
        self.cmis.binding
    }
}

/// Content server coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// URL scheme.
    #[serde(default)]
    pub scheme: Scheme,
    /// Host name or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Validates server coordinates.
    fn validate(&self) -> Result<(), ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }
        if host.len() > MAX_HOST_LENGTH {
            return Err(ConfigError::Invalid("server.host exceeds max length".to_string()));
        }
        if host.contains("://") || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "server.host must be a bare host name without scheme or path".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Administrator account.
///
/// # Invariants
/// - `Debug` output never contains the password.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AdminConfig {
    /// Account name.
    #[serde(default = "default_admin")]
    pub username: String,
    /// Account password.
    #[serde(default = "default_admin")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin(),
            password: default_admin(),
        }
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminConfig {
    /// Validates the administrator account.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("admin.username must not be empty".to_string()));
        }
        Ok(())
    }
}

/// HTTP client tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response body accepted, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Validates HTTP tunables against hard limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if !(MIN_RESPONSE_BYTES..=MAX_RESPONSE_BYTES).contains(&self.max_response_bytes) {
            return Err(ConfigError::Invalid(format!(
                "http.max_response_bytes must be between {MIN_RESPONSE_BYTES} and {MAX_RESPONSE_BYTES}"
            )));
        }
        let agent = self.user_agent.trim();
        if agent.is_empty() {
            return Err(ConfigError::Invalid("http.user_agent must not be empty".to_string()));
        }
        if agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid("http.user_agent exceeds max length".to_string()));
        }
        Ok(())
    }
}

/// CMIS session settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CmisConfig {
    /// Binding used to open sessions.
    #[serde(default)]
    pub binding: Binding,
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default server host.
fn default_host() -> String {
    "localhost".to_string()
}

/// Default server port.
const fn default_port() -> u16 {
    8080
}

/// Default administrator name and password.
fn default_admin() -> String {
    "admin".to_string()
}

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default response size limit.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default user agent.
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
