#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Durable user preference flags.
//!
//! The only client-side state that survives a reload: two booleans
//! under fixed keys (`location_enabled`, `notifications_enabled`),
//! stored as a small TOML file. A missing file or missing key means
//! `false` — the first-run default. Everything else in the application
//! is transient view state.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors reading or writing the preference file.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    /// File read/write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not valid TOML.
    #[error("preference file is malformed: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialization failed (should not happen for this shape).
    #[error("preference serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The two persisted preference flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Whether the user enabled location access.
    pub location_enabled: bool,
    /// Whether the user enabled notifications.
    pub notifications_enabled: bool,
}

impl Preferences {
    /// Loads preferences from `path`.
    ///
    /// A missing file yields the defaults (both flags `false`); keys
    /// absent from an existing file default individually.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        if !path.exists() {
            log::debug!("No preference file at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Writes preferences to `path`, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError`] if the directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
