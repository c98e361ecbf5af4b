//! Configuration file parsing.
//!
//! Parses individual `.sift.toml` files into intermediate `RawConfig` structures
//! that preserve the optional nature of all fields before merging.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
/// This mirrors the TOML schema exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Parser settings section.
    pub parser: Option<RawParserSettings>,
    /// Field table: field name -> bit position.
    pub fields: Option<BTreeMap<String, u8>>,
}

/// Raw parser settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawParserSettings {
    /// Maximum parse stack depth.
    pub max_depth: Option<usize>,
    /// Reject queries naming unknown fields.
    pub strict_fields: Option<bool>,
}

/// Parses a configuration file from disk.
///
/// Returns a `RawConfig` with all fields as optionals, ready for merging.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> RawConfig {
        parse_config_str(toml, Path::new("test.toml")).unwrap()
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse("");
        assert!(config.root.is_none());
        assert!(config.parser.is_none());
        assert!(config.fields.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
root = true

[parser]
max_depth = 250
strict_fields = true

[fields]
title = 0
body = 1
"#,
        );
        assert_eq!(config.root, Some(true));
        let parser = config.parser.unwrap();
        assert_eq!(parser.max_depth, Some(250));
        assert_eq!(parser.strict_fields, Some(true));
        let fields = config.fields.unwrap();
        assert_eq!(fields.get("title"), Some(&0));
        assert_eq!(fields.get("body"), Some(&1));
    }

    #[test]
    fn test_parse_partial_parser_section() {
        let parser = parse("[parser]\nstrict_fields = true\n").parser.unwrap();
        assert!(parser.max_depth.is_none());
        assert_eq!(parser.strict_fields, Some(true));
    }

    #[test]
    fn test_parse_quoted_field_names() {
        let fields = parse("[fields]\n\"release-notes\" = 4\n").fields.unwrap();
        assert_eq!(fields.get("release-notes"), Some(&4));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = parse_config_str("[parser\nmax_depth = 1", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_parse_bit_that_does_not_fit_u8() {
        let err = parse_config_str("[fields]\ntitle = 300\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn test_parse_wrong_type() {
        let err =
            parse_config_str("[parser]\nmax_depth = \"deep\"\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_config_file(Path::new("/nonexistent/.sift.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
