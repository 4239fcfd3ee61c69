use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DomainError;

pub const DEFAULT_GREETING: &str = "Hello world!";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeterOptions {
    /// Sent to the greeting sink when the meter opens.
    pub greeting: String,
}

impl Default for MeterOptions {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InvertOptions {
    /// Whether inversion starts enabled.
    pub active: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryOptions {
    /// Output chroma tag such as `"I420"`; the input chroma when unset or unknown.
    pub chroma: Option<String>,
    /// Output width; zero selects a quarter of the input width.
    pub width: u32,
    /// Output height; zero selects a quarter of the input height.
    pub height: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub meter: MeterOptions,
    pub invert: InvertOptions,
    pub summary: SummaryOptions,
}

impl FilterConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(input).map_err(|err| DomainError::Serialization(err.to_string()))
    }

    pub fn from_json_str(input: &str) -> Result<Self, DomainError> {
        serde_json::from_str(input).map_err(|err| DomainError::Serialization(err.to_string()))
    }

    /// Reads a JSON file when the extension is `.json`, YAML otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        debug!(path = ?path, "loading filter config");
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }
}
