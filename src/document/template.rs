//! Serde model of an infrastructure template and its concrete syntaxes

use super::{DocumentError, DocumentResult};
use crate::graph::{Properties, PropertyValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const FORMAT_VERSION: &str = "2010-09-09";

/// A template document: one group's resources and outputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(
        rename = "AWSTemplateFormatVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub format_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub resources: IndexMap<String, Resource>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, Output>,
}

/// One declared resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,
    /// Side-channel attributes: Metadata, DeletionPolicy, Condition, ...
    #[serde(flatten)]
    pub attributes: Properties,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: None,
            depends_on: None,
            attributes: Properties::new(),
        }
    }
}

/// Explicit predecessors: a single name or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    One(String),
    Many(Vec<String>),
}

impl DependsOn {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Single value for exactly one name, a list otherwise, nothing for none
    pub fn from_names(mut names: Vec<String>) -> Option<Self> {
        match names.len() {
            0 => None,
            1 => names.pop().map(Self::One),
            _ => Some(Self::Many(names)),
        }
    }
}

/// One declared output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: PropertyValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<OutputExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputExport {
    pub name: PropertyValue,
}

/// Concrete syntax of a template file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> DocumentResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(DocumentError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parse template text
pub fn parse_template(text: &str, format: Format) -> DocumentResult<Template> {
    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        Format::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
            let json = yaml_to_json(yaml)?;
            Ok(serde_json::from_value(json)?)
        }
    }
}

/// Serialize a template; YAML output always uses long-form functions
pub fn render_template(template: &Template, format: Format) -> DocumentResult<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(template)?),
        Format::Yaml => Ok(serde_yaml::to_string(template)?),
    }
}

pub fn read_template(path: impl AsRef<Path>) -> DocumentResult<Template> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    parse_template(&text, format)
}

pub fn write_template(path: impl AsRef<Path>, template: &Template) -> DocumentResult<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    std::fs::write(path, render_template(template, format)?)?;
    Ok(())
}

/// Convert YAML to JSON, expanding short-form function tags
///
/// `!Ref X` becomes `{"Ref": "X"}`, `!GetAtt A.b` becomes
/// `{"Fn::GetAtt": ["A", "b"]}`, any other `!Name v` becomes `{"Fn::Name": v}`.
fn yaml_to_json(value: serde_yaml::Value) -> DocumentResult<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<DocumentResult<_>>()?,
        ),
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => {
                        return Err(DocumentError::InvalidTemplate(format!(
                            "unsupported mapping key: {:?}",
                            other
                        )))
                    }
                };
                object.insert(key, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            let arg = yaml_to_json(tagged.value)?;
            let (function, arg) = match name {
                "Ref" | "Condition" => (name.to_string(), arg),
                "GetAtt" => {
                    let arg = match arg {
                        Value::String(path) => match path.split_once('.') {
                            Some((resource, attribute)) => {
                                Value::Array(vec![resource.into(), attribute.into()])
                            }
                            None => Value::String(path),
                        },
                        other => other,
                    };
                    ("Fn::GetAtt".to_string(), arg)
                }
                other => (format!("Fn::{}", other), arg),
            };
            let mut object = serde_json::Map::new();
            object.insert(function, arg);
            Value::Object(object)
        }
    })
}
