//! Configuration structures for sipkit.
//!
//! The configuration file is a sectioned key/value document (TOML):
//!
//! ```toml
//! [organization]
//! name = "Archive X"
//! contract = "urn:uuid:474418c5-79a6-4e86-bfc8-5aed0a3337d7"
//! sign_key = "keys/sign.key"
//!
//! [script]
//! adaptor = "csv-feed"
//! meta_ending = "___metadata.xml"
//! csv_ending = "___metadata.csv"
//! used_checksum = "MD5"
//! desc_root_remove = true
//! ```
//!
//! Configuration is always loaded explicitly by the caller; the core crate
//! never reads environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{SipError, SipResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub organization: OrganizationConfig,
    pub script: ScriptConfig,
}

/// Contract-level identity recorded into the compiled manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationConfig {
    pub name: String,
    pub contract: String,
    /// Path to the key used for the detached package signature.
    pub sign_key: PathBuf,
}

/// Adaptor selection and feed naming conventions.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    /// Name of the source adaptor to use.
    pub adaptor: String,
    /// Filename ending of descriptive metadata files.
    pub meta_ending: String,
    /// Filename ending of the tabular metadata feed.
    pub csv_ending: String,
    /// Digest algorithm accepted for objects (case-insensitive match).
    pub used_checksum: String,
    /// Whether the root element of imported descriptive metadata is stripped.
    #[serde(default)]
    pub desc_root_remove: bool,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> SipResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            SipError::config(format!("cannot read configuration {}: {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&raw).map_err(|e| {
            SipError::config(format!("cannot parse configuration {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate basic quality constraints before any I/O happens.
    pub fn validate(&self) -> SipResult<()> {
        if self.organization.name.trim().is_empty() {
            return Err(SipError::config("organization.name must not be empty"));
        }
        if self.organization.contract.trim().is_empty() {
            return Err(SipError::config("organization.contract must not be empty"));
        }
        if self.script.adaptor.trim().is_empty() {
            return Err(SipError::config("script.adaptor must not be empty"));
        }
        if self.script.used_checksum.trim().is_empty() {
            return Err(SipError::config("script.used_checksum must not be empty"));
        }
        if self.script.csv_ending.trim().is_empty() || self.script.meta_ending.trim().is_empty() {
            return Err(SipError::config(
                "script.csv_ending and script.meta_ending must not be empty",
            ));
        }
        Ok(())
    }
}

/// Default configuration path under the user configuration directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sipkit").join("config.toml"))
}
