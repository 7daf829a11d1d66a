// crates/dataprep-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section defaults.
// Purpose: Ensure config input handling is strict and fail-closed.
// Dependencies: dataprep-config, dataprep-core, tempfile
// ============================================================================
//! ## Overview
//! Loads configuration files from temporary paths and checks limits,
//! defaults, and value validation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;
use std::path::Path;

use dataprep_config::ConfigError;
use dataprep_config::DataPrepConfig;
use dataprep_core::Binding;
use dataprep_core::Scheme;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<DataPrepConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

// ============================================================================
// SECTION: Path and File Guards
// ============================================================================

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(DataPrepConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(DataPrepConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(DataPrepConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(DataPrepConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_reports_missing_file_as_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let missing = dir.path().join("absent.toml");
    match DataPrepConfig::load(Some(&missing)) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config("[server\nhost = ")?;
    assert_invalid(DataPrepConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

// ============================================================================
// SECTION: Values
// ============================================================================

#[test]
fn empty_file_yields_local_defaults() -> TestResult {
    let file = write_config("")?;
    let config = DataPrepConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != DataPrepConfig::default() {
        return Err(format!("unexpected defaults: {config:?}"));
    }
    let address = config.server_address();
    if address.scheme != Scheme::Http || address.host != "localhost" || address.port != 8080 {
        return Err(format!("unexpected address: {address:?}"));
    }
    if config.admin_credentials().username() != "admin" || config.binding() != Binding::Browser {
        return Err("unexpected admin or binding defaults".to_string());
    }
    Ok(())
}

#[test]
fn full_file_is_applied() -> TestResult {
    let file = write_config(
        r#"
[server]
scheme = "https"
host = "content.internal"
port = 8443

[admin]
username = "ops"
password = "s3cret"

[http]
timeout_ms = 5000
max_response_bytes = 65536
user_agent = "fixtures/2"

[cmis]
binding = "atompub"
"#,
    )?;
    let config = DataPrepConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let address = config.server_address();
    if address.scheme != Scheme::Https || address.host != "content.internal" || address.port != 8443 {
        return Err(format!("unexpected address: {address:?}"));
    }
    let credentials = config.admin_credentials();
    if credentials.username() != "ops" || credentials.password() != "s3cret" {
        return Err("unexpected credentials".to_string());
    }
    let options = config.http_options();
    if options.timeout_ms != 5000 || options.max_response_bytes != 65536 || options.user_agent != "fixtures/2" {
        return Err(format!("unexpected http options: {options:?}"));
    }
    if config.binding() != Binding::AtomPub {
        return Err("unexpected binding".to_string());
    }
    if format!("{config:?}").contains("s3cret") {
        return Err("debug output leaked the password".to_string());
    }
    Ok(())
}

#[test]
fn invalid_values_fail_closed() -> TestResult {
    let cases = [
        ("[server]\nhost = \"\"", "server.host must not be empty"),
        ("[server]\nhost = \"http://content\"", "bare host name"),
        ("[server]\nport = 0", "server.port must be non-zero"),
        ("[admin]\nusername = \" \"", "admin.username must not be empty"),
        ("[http]\ntimeout_ms = 5", "http.timeout_ms must be between"),
        ("[http]\nmax_response_bytes = 10", "http.max_response_bytes must be between"),
        ("[http]\nuser_agent = \"\"", "http.user_agent must not be empty"),
    ];
    for (content, needle) in cases {
        assert_invalid(DataPrepConfig::parse(content), needle)?;
    }
    Ok(())
}

#[test]
fn unknown_binding_is_a_parse_error() -> TestResult {
    assert_invalid(DataPrepConfig::parse("[cmis]\nbinding = \"soap\""), "config parse error")?;
    Ok(())
}

#[test]
fn load_or_default_still_requires_a_named_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let missing = dir.path().join("named.toml");
    match DataPrepConfig::load_or_default(Some(&missing)) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn load_or_default_reads_a_named_file() -> TestResult {
    let file = write_config("[server]\nport = 9090")?;
    let config =
        DataPrepConfig::load_or_default(Some(file.path())).map_err(|err| err.to_string())?;
    if config.server.port != 9090 {
        return Err(format!("unexpected port {}", config.server.port));
    }
    Ok(())
}
