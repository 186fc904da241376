//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is
//! a valid configuration. Override fields with the builder methods:
//!
//! ```ignore
//! let config = EngineConfig::default()
//!     .with_legacy_color_names(true)
//!     .with_seed(42);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tag used by [`clear_config`](crate::host::clear_config) when none is given.
pub const DEFAULT_PLUGIN_TAG: &str = "promptloom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name COLOR choices `"{key} {postfix}"` instead of
    /// `"{Postfix} - {key}"`.
    pub legacy_color_names: bool,
    /// Skip blocks and lines tagged `--x 1`. Default: `true`.
    pub skip_tagged_blocks: bool,
    /// Turn duplicate fragment names into a hard error.
    pub strict: bool,
    /// Upper bound of a dropdown randomize draw. Default: 5.
    pub max_random_choices: usize,
    /// Seed for randomize; entropy-seeded when `None`.
    pub seed: Option<u64>,
    /// Key tag removed from host config files by the clear-config action.
    pub plugin_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            legacy_color_names: false,
            skip_tagged_blocks: true,
            strict: false,
            max_random_choices: 5,
            seed: None,
            plugin_tag: DEFAULT_PLUGIN_TAG.to_string(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_legacy_color_names(mut self, legacy: bool) -> Self {
        self.legacy_color_names = legacy;
        self
    }

    pub fn with_skip_tagged_blocks(mut self, skip: bool) -> Self {
        self.skip_tagged_blocks = skip;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_max_random_choices(mut self, max: usize) -> Self {
        self.max_random_choices = max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_plugin_tag(mut self, tag: impl Into<String>) -> Self {
        self.plugin_tag = tag.into();
        self
    }
}
