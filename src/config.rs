//! Dispatcher configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! [query]
//! repeated_keys = "last"
//! plus_as_space = true
//!
//! [routing]
//! head_falls_back_to_get = true
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Which occurrence of a repeated scalar query key is bound.
///
/// List-typed fields always collect every occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatedKeys {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub repeated_keys: RepeatedKeys,
    /// Decode `+` as a space before percent-decoding (form encoding).
    pub plus_as_space: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { repeated_keys: RepeatedKeys::Last, plus_as_space: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Serve `HEAD` from `GET` routes when no `HEAD` route matches.
    pub head_falls_back_to_get: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { head_falls_back_to_get: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub query: QueryConfig,
    pub routing: RoutingConfig,
}

impl DispatchConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DispatchConfig::from_toml_str("").unwrap(), DispatchConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = DispatchConfig::from_toml_str("[query]\nrepeated_keys = \"first\"\n").unwrap();
        assert_eq!(cfg.query.repeated_keys, RepeatedKeys::First);
        assert!(cfg.query.plus_as_space);
        assert!(cfg.routing.head_falls_back_to_get);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = DispatchConfig::from_toml_str("[query]\nrepeated_keys = \"all\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DispatchConfig::load("/nonexistent/tollgate.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
