// crates/dataprep-config/src/lib.rs
// ============================================================================
// Module: Dataprep Config Library
// Description: Configuration model and validation for fixture preparation.
// Purpose: Single source of truth for dataprep.toml semantics.
// Dependencies: dataprep-core, serde, toml
// ============================================================================

//! ## Overview
//! `dataprep-config` loads the server coordinates, administrator credentials,
//! HTTP tunables, and CMIS binding from a TOML file and validates them before
//! any client is built.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
