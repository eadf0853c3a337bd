//! Theme descriptor (`about.json`) parsing

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Fixed path of the descriptor inside a theme repository
pub const DESCRIPTOR_FILE: &str = "about.json";

/// Metadata a theme repository declares about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDescriptor {
    pub name: String,
    pub about_url: Option<String>,
    pub license_url: Option<String>,
}

impl ThemeDescriptor {
    /// Parse descriptor bytes
    ///
    /// Fails with `Import` if the bytes are not a JSON object with a
    /// non-empty string `name`. Unknown attributes are ignored, as are
    /// optional attributes that are not strings.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| Error::Import(format!("Malformed {}: {}", DESCRIPTOR_FILE, e)))?;

        let name = match object.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            Some(_) => {
                return Err(Error::Import(format!(
                    "{} has an empty name",
                    DESCRIPTOR_FILE
                )))
            }
            None => {
                return Err(Error::Import(format!(
                    "{} has no string name attribute",
                    DESCRIPTOR_FILE
                )))
            }
        };

        Ok(Self {
            name,
            about_url: optional_string(&object, "about_url"),
            license_url: optional_string(&object, "license_url"),
        })
    }
}

fn optional_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::debug!(key, value = %other, "Ignoring non-string descriptor attribute");
            None
        }
    }
}
