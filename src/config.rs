//! Engine configuration.
//!
//! Loaded from JSON by the CLI; library users usually start from
//! [`EngineConfig::default`].

use std::{collections::HashMap, fs, io, path::Path};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::{path::is_identifier, value::TypeTag};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid root parameter name '{0}'")]
    InvalidRootName(String),

    #[error("invalid connector keyword '{0}'")]
    InvalidConnector(String),

    #[error("invalid LIKE escape character '{0}'")]
    InvalidEscape(char),

    #[error("connector pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Settings shared by every render.
///
/// ```json
/// {
///   "root_name": "pmb",
///   "connectors": ["AND", "OR"],
///   "like_escape": "|",
///   "declared_types": { "birthdate": "string" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name templates use for the root parameter object
    pub root_name: String,

    /// Keywords stripped from the first fragment of a BEGIN block
    pub connectors: Vec<String>,

    /// Escape character for LIKE search options
    pub like_escape: char,

    /// Declared types for root-relative paths whose values may be null
    pub declared_types: HashMap<String, TypeTag>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            root_name: "pmb".to_string(),
            connectors: vec!["AND".to_string(), "OR".to_string()],
            like_escape: '|',
            declared_types: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.root_name) {
            return Err(ConfigError::InvalidRootName(self.root_name.clone()));
        }
        if let Some(bad) = self.connectors.iter().find(|c| !is_identifier(c)) {
            return Err(ConfigError::InvalidConnector(bad.clone()));
        }
        if matches!(self.like_escape, '%' | '_' | '\'' | '?') || self.like_escape.is_whitespace() {
            return Err(ConfigError::InvalidEscape(self.like_escape));
        }
        Ok(())
    }

    /// Case-insensitive pattern for one leading connector keyword,
    /// keeping the whitespace before it in group 1.
    pub fn connector_regex(&self) -> Result<Regex, ConfigError> {
        let alternatives = self
            .connectors
            .iter()
            .map(|c| regex::escape(c))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = if alternatives.is_empty() {
            // matches nothing
            r"\b\B".to_string()
        } else {
            format!(r"(?i)^(\s*)(?:{})\b\s*", alternatives)
        };
        Ok(Regex::new(&pattern)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "root_name": "param" }"#).unwrap();
        assert_eq!(config.root_name, "param");
        assert_eq!(config.connectors, vec!["AND", "OR"]);
        assert_eq!(config.like_escape, '|');
    }

    #[test]
    fn test_declared_types() {
        let config =
            EngineConfig::from_json(r#"{ "declared_types": { "birthdate": "string" } }"#).unwrap();
        assert_eq!(config.declared_types.get("birthdate"), Some(&TypeTag::String));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "root_name": "1pmb" }"#),
            Err(ConfigError::InvalidRootName(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "connectors": ["AND OR"] }"#),
            Err(ConfigError::InvalidConnector(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "like_escape": "%" }"#),
            Err(ConfigError::InvalidEscape('%'))
        ));
    }

    #[test]
    fn test_connector_regex() {
        let re = EngineConfig::default().connector_regex().unwrap();
        assert!(re.is_match("  and T.ID = ?"));
        assert!(re.is_match("OR\nT.ID = ?"));
        assert!(!re.is_match("ORDER BY ID"));
        assert!(!re.is_match("WHERE ID = ?"));
    }
}
