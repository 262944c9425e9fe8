//! Engine settings.
//!
//! Settings are plain serde structures with defaults for every field, so an
//! empty TOML document is a valid configuration:
//!
//! ```toml
//! [limits]
//! time_budget_ms = 4000
//! min_predicate_len = 5
//! deadline_check_interval = 256
//!
//! [orthogonal]
//! catalogue = "designs.json"
//! verify_catalogue = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest settings file accepted by [`GeneratorConfig::load`].
const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;

/// Top-level settings for all engines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Limit value analysis settings.
    pub limits: LimitsConfig,
    /// Orthogonal array settings.
    pub orthogonal: OrthogonalConfig,
}

/// Settings of the limit value analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Wall-clock budget of the boundary search of one parameter.
    pub time_budget_ms: u64,
    /// Shortest accepted predicate, in characters.
    pub min_predicate_len: usize,
    /// Number of search iterations between two clock reads.
    pub deadline_check_interval: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 4000,
            // Shortest bound that can be written, `a<x<b`.
            min_predicate_len: 5,
            deadline_check_interval: 256,
        }
    }
}

impl LimitsConfig {
    /// The search budget as a [`Duration`].
    #[must_use]
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] if any value is zero.
    pub fn validate(&self) -> Result<()> {
        if self.time_budget_ms == 0 {
            return Err(Error::settings("limits.time_budget_ms must be positive"));
        }
        if self.min_predicate_len == 0 {
            return Err(Error::settings("limits.min_predicate_len must be at least 1"));
        }
        if self.deadline_check_interval == 0 {
            return Err(Error::settings(
                "limits.deadline_check_interval must be positive",
            ));
        }
        Ok(())
    }
}

/// Settings of the orthogonal array engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrthogonalConfig {
    /// External design catalogue; the embedded standard catalogue is used when unset.
    pub catalogue: Option<PathBuf>,
    /// Reject external designs that are not strength-2 orthogonal.
    pub verify_catalogue: bool,
}

impl Default for OrthogonalConfig {
    fn default() -> Self {
        Self {
            catalogue: None,
            verify_catalogue: true,
        }
    }
}

impl GeneratorConfig {
    /// Parse settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] if the document does not parse or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|err| Error::settings(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a TOML file.
    ///
    /// A relative `orthogonal.catalogue` path is resolved against the
    /// directory of the settings file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] if the file cannot be read, is too large,
    /// does not parse, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|err| Error::settings(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(Error::settings("settings file exceeds size limit"));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| Error::settings("settings file must be utf-8"))?;
        let mut config = Self::from_toml_str(content)?;

        if let (Some(catalogue), Some(dir)) = (&config.orthogonal.catalogue, path.parent()) {
            if catalogue.is_relative() {
                config.orthogonal.catalogue = Some(dir.join(catalogue));
            }
        }
        Ok(config)
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] describing the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()
    }
}
