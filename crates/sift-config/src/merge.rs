//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    path::{Path, PathBuf},
};

use crate::{
    Config, ConfigError, ParserSettings,
    parse::{RawConfig, RawParserSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

impl ParsedConfig {
    /// True when the file sets `root = true`.
    pub fn is_root(&self) -> bool {
        self.config.root == Some(true)
    }
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Parser settings: first defined value wins (highest precedence)
/// - Fields: merged by name, first definition of each name wins
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    let parser = merge_parser_settings(configs)?;
    let fields = merge_fields(configs);
    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(Path::to_path_buf);
    let sources = configs.iter().map(|c| c.path.clone()).collect();

    Ok(Config {
        parser,
        fields,
        config_root,
        sources,
    })
}

/// Merges parser settings, taking first defined value for each field.
fn merge_parser_settings(configs: &[ParsedConfig]) -> Result<ParserSettings, ConfigError> {
    let mut result = ParserSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref parser) = parsed.config.parser {
            apply_raw_parser(&mut result, parser, &parsed.path)?;
        }
    }

    Ok(result)
}

/// Applies raw parser settings to result, overwriting any present values.
fn apply_raw_parser(
    result: &mut ParserSettings,
    raw: &RawParserSettings,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(v) = raw.max_depth {
        if v == 0 {
            return Err(ConfigError::InvalidSetting {
                path: path.to_path_buf(),
                key: "parser.max_depth",
                message: "must be at least 1",
            });
        }
        result.max_depth = v;
    }
    if let Some(v) = raw.strict_fields {
        result.strict_fields = v;
    }
    Ok(())
}

/// Merges field tables. The first definition of each field name wins.
fn merge_fields(configs: &[ParsedConfig]) -> BTreeMap<String, u8> {
    let mut result = BTreeMap::new();

    // Iterate in precedence order (highest first) - first definition wins
    for parsed in configs {
        let Some(ref fields) = parsed.config.fields else {
            continue;
        };
        for (name, bit) in fields {
            if let Entry::Vacant(slot) = result.entry(name.clone()) {
                slot.insert(*bit);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse::parse_config_str, test_support::TestDir};

    fn parsed(path: PathBuf, toml: &str) -> ParsedConfig {
        ParsedConfig {
            config: parse_config_str(toml, &path).unwrap(),
            path,
        }
    }

    #[test]
    fn test_merge_empty_configs() {
        let result = merge_configs(&[]).unwrap();
        assert_eq!(result.parser, ParserSettings::default());
        assert!(result.fields.is_empty());
        assert!(result.config_root.is_none());
    }

    #[test]
    fn test_merge_single_config() {
        let test_dir = TestDir::new();
        let config = parsed(
            test_dir.path().join(".sift.toml"),
            r#"
[parser]
max_depth = 40

[fields]
title = 0
"#,
        );

        let result = merge_configs(&[config]).unwrap();
        assert_eq!(result.parser.max_depth, 40);
        assert!(!result.parser.strict_fields);
        assert_eq!(result.fields.get("title"), Some(&0));
        assert_eq!(result.config_root.as_deref(), Some(test_dir.path()));
        assert_eq!(result.sources, [test_dir.path().join(".sift.toml")]);
    }

    #[test]
    fn test_merge_scalar_override() {
        let test_dir = TestDir::new();

        let high_prec = parsed(
            test_dir.path().join("project/.sift.toml"),
            "[parser]\nmax_depth = 20\n",
        );
        let low_prec = parsed(
            test_dir.path().join(".sift.toml"),
            "[parser]\nmax_depth = 50\nstrict_fields = true\n",
        );

        let result = merge_configs(&[high_prec, low_prec]).unwrap();
        // Higher precedence value wins
        assert_eq!(result.parser.max_depth, 20);
        // Unset in the closer file, inherited from the farther one
        assert!(result.parser.strict_fields);
        assert_eq!(
            result.config_root.as_deref(),
            Some(test_dir.path().join("project").as_path())
        );
    }

    #[test]
    fn test_merge_fields_first_definition_wins() {
        let test_dir = TestDir::new();

        let high_prec = parsed(
            test_dir.path().join("project/.sift.toml"),
            "[fields]\ntitle = 3\n",
        );
        let low_prec = parsed(
            test_dir.path().join(".sift.toml"),
            "[fields]\ntitle = 0\nbody = 1\n",
        );

        let result = merge_configs(&[high_prec, low_prec]).unwrap();
        assert_eq!(result.fields.len(), 2);
        assert_eq!(result.fields.get("title"), Some(&3));
        assert_eq!(result.fields.get("body"), Some(&1));
    }

    #[test]
    fn test_merge_rejects_zero_depth() {
        let test_dir = TestDir::new();
        let config = parsed(test_dir.path().join(".sift.toml"), "[parser]\nmax_depth = 0\n");

        let err = merge_configs(&[config]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                key: "parser.max_depth",
                ..
            }
        ));
    }

    #[test]
    fn test_merge_zero_depth_overridden_is_still_rejected() {
        let test_dir = TestDir::new();
        let high_prec = parsed(
            test_dir.path().join("a/.sift.toml"),
            "[parser]\nmax_depth = 10\n",
        );
        let low_prec = parsed(test_dir.path().join(".sift.toml"), "[parser]\nmax_depth = 0\n");

        assert!(merge_configs(&[high_prec, low_prec]).is_err());
    }
}
