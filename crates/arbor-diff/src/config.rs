use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Attribute carrying explicit diff keys unless configured otherwise.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "o-diff-key";

/// Plain-data options of a diff run.
///
/// Behavioural strategies (scope boundaries, candidate keys, the new-node
/// hook) are closures and live on [`Differ`](crate::Differ) instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Attribute whose value is a node's explicit identity.
    pub key_attribute: String,
    /// Attributes never compared and never reported as changed.
    pub ignored_attributes: BTreeSet<String>,
    /// Attach the target's original attributes to every directive.
    pub with_location_metadata: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            key_attribute: DEFAULT_KEY_ATTRIBUTE.to_string(),
            ignored_attributes: BTreeSet::new(),
            with_location_metadata: false,
        }
    }
}

impl DiffConfig {
    pub fn with_key_attribute(mut self, name: impl Into<String>) -> Self {
        self.key_attribute = name.into();
        self
    }

    /// Add an attribute to the ignore list.
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored_attributes.insert(name.into());
        self
    }

    pub fn with_location_metadata(mut self, enabled: bool) -> Self {
        self.with_location_metadata = enabled;
        self
    }

    /// Read a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> DiffResult<Self> {
        serde_json::from_str(text).map_err(|e| DiffError::Config(e.to_string()))
    }

    /// Read a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml(text: &str) -> DiffResult<Self> {
        toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))
    }
}
