//! File format dispatch: parse and serialize config trees by extension.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::error::ConfigError;
use crate::tree::{Mapping, Node, mapping_to_value};

/// Supported configuration file formats, selected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Json5,
    Yaml,
}

impl FileFormat {
    /// Pick a format from a path's extension; unknown extensions are fatal.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(FileFormat::Json),
            "json5" => Ok(FileFormat::Json5),
            "yml" | "yaml" => Ok(FileFormat::Yaml),
            _ => Err(ConfigError::UnknownFormat(ext)),
        }
    }

    /// Parse file text into a tree.
    pub fn parse(&self, path: &Path, text: &str) -> Result<Node, ConfigError> {
        let parsed: Result<Value, String> = match self {
            FileFormat::Json => serde_json::from_str(text).map_err(|err| err.to_string()),
            FileFormat::Json5 => json5::from_str(text).map_err(|err| err.to_string()),
            FileFormat::Yaml => serde_yaml::from_str(text).map_err(|err| err.to_string()),
        };
        parsed.map(Node::from).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Serialize a root mapping to a writer.
    pub fn write(
        &self,
        root: &Mapping,
        out: &mut dyn Write,
        pretty: bool,
        sort_keys: bool,
    ) -> Result<(), ConfigError> {
        let mut value = mapping_to_value(root);
        if sort_keys {
            value = sorted(&value);
        }
        match self {
            FileFormat::Json => {
                if pretty {
                    serde_json::to_writer_pretty(&mut *out, &value)
                } else {
                    serde_json::to_writer(&mut *out, &value)
                }
                .map_err(std::io::Error::other)?;
            }
            FileFormat::Json5 => {
                let text = json5::to_string(&value).map_err(std::io::Error::other)?;
                out.write_all(text.as_bytes())?;
            }
            FileFormat::Yaml => {
                serde_yaml::to_writer(&mut *out, &value).map_err(std::io::Error::other)?;
            }
        }
        Ok(())
    }
}

/// Recursively sort mapping keys for stable output.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        Value::Object(map) => {
            let by_key: BTreeMap<&String, &Value> = map.iter().collect();
            Value::Object(
                by_key
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted(value)))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}
