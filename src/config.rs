//! Settings for names the graph synthesizes

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Naming settings for exports created during relocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Joins group, local name, and attribute in a synthesized export name
    pub export_separator: String,
    /// Appended to the output id of a synthesized export
    pub output_suffix: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            export_separator: "-".to_string(),
            output_suffix: "Output".to_string(),
        }
    }
}

impl GraphConfig {
    /// Load settings from a YAML file; missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Export name for `attribute` of `target` (or the whole node):
    /// `group-name` or `group-name-attr`, attribute dots replaced by the separator
    pub fn export_name(&self, target: &NodeId, attribute: Option<&str>) -> String {
        let sep = &self.export_separator;
        let mut name = format!("{}{}{}", target.group, sep, target.name);
        if let Some(attribute) = attribute {
            name.push_str(sep);
            name.push_str(&attribute.replace('.', sep));
        }
        name
    }

    /// Output id for an export: alphanumeric characters only
    pub fn output_id(&self, name: &str, attribute: Option<&str>) -> String {
        let mut id: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if let Some(attribute) = attribute {
            id.extend(attribute.chars().filter(|c| c.is_ascii_alphanumeric()));
        }
        id.push_str(&self.output_suffix);
        id
    }
}
