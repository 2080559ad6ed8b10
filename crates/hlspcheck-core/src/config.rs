//! Check options, loadable from YAML.
//!
//! ```yaml
//! hdu_view: every
//! default_counts_as_pass: false
//! enforce: [hlsp_status]
//! fail_on_recommended: false
//! ```
//!
//! Unknown keys cause deserialization to fail (deny_unknown_fields).

use crate::dictionary::Axis;
use crate::report::{AggregateOptions, HduView};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    pub hdu_view: HduView,
    pub default_counts_as_pass: bool,
    /// Axes whose missing-required keywords fail a file.
    pub enforce: Vec<Axis>,
    /// Also fail on missing recommended keywords of enforced axes.
    pub fail_on_recommended: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            hdu_view: HduView::Any,
            default_counts_as_pass: true,
            enforce: Axis::ALL.to_vec(),
            fail_on_recommended: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },
}

impl CheckOptions {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let options = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), ?options, "loaded check options");
        Ok(options)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            hdu_view: self.hdu_view,
            default_counts_as_pass: self.default_counts_as_pass,
        }
    }

    pub fn is_enforced(&self, axis: Axis) -> bool {
        self.enforce.contains(&axis)
    }
}
