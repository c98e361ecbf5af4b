//! Configuration system for sift.
//!
//! sift uses TOML configuration files named `.sift.toml`. Configuration is resolved by walking
//! up the directory tree from the current working directory, collecting any `.sift.toml` files
//! found, then loading `~/.sift.toml` as the global config with lowest precedence.
//!
//! A configuration supplies the field table that query modifiers such as `@title:` resolve
//! against, and the parser settings.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use discovery::{
    CONFIG_FILENAME, discover_config_files, discover_configs, global_config_path,
    is_global_config, require_global_config_path,
};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{RawConfig, RawParserSettings, parse_config_file, parse_config_str};
use serde::{Deserialize, Serialize};
use sift_query::{ParserOptions, Schema, UnknownFieldPolicy};
pub use templates::local_template;
pub use validate::ConfigWarning;
use validate::validate_config;

/// Top-level merged configuration for sift.
///
/// This represents the fully resolved configuration after merging all discovered `.sift.toml`
/// files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parser settings.
    pub parser: ParserSettings,
    /// Field table: field name to bit position.
    pub fields: BTreeMap<String, u8>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
    /// Config files that contributed, highest precedence first.
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.sift.toml` files.
    ///
    /// This is the main entry point for loading configuration. Files are found and parsed by
    /// [`discover_configs`], then merged with the file closest to `cwd` winning.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        merge_configs(&discover_configs(cwd)?)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    ///
    /// Returns `Ok(Config::default())` if the list is empty.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        if files.is_empty() {
            return Ok(Self::default());
        }

        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// Builds the query schema from the field table.
    ///
    /// Fields are added in bit order, ties broken by name. Fails if a bit is out of range or
    /// shared by two fields; [`Self::validate`] reports the same problems as warnings.
    pub fn schema(&self) -> Result<Schema, ConfigError> {
        let mut fields: Vec<(&String, u8)> = self.fields.iter().map(|(n, b)| (n, *b)).collect();
        fields.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        let mut schema = Schema::new();
        for (name, bit) in fields {
            schema.add_field_at(name.as_str(), bit)?;
        }
        Ok(schema)
    }

    /// Builds parser options from the parser settings.
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            max_depth: self.parser.max_depth,
            unknown_fields: if self.parser.strict_fields {
                UnknownFieldPolicy::Reject
            } else {
                UnknownFieldPolicy::Ignore
            },
        }
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// This checks for:
    /// - Field bits that do not fit in a field mask
    /// - Bits shared by more than one field
    /// - Empty field table
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML format.
    ///
    /// This outputs the merged configuration in the same format as a `.sift.toml` file,
    /// making it easy to see the effective configuration.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableSettings {
            parser: &self.parser,
            fields: &self.fields,
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Maximum parse stack depth.
    pub max_depth: usize,
    /// Reject queries naming unknown fields.
    pub strict_fields: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_depth: sift_query::DEFAULT_MAX_DEPTH,
            strict_fields: false,
        }
    }
}

/// Internal struct for TOML serialization of settings.
#[derive(Serialize)]
struct SerializableSettings<'a> {
    /// Parser settings.
    parser: &'a ParserSettings,
    /// Field table, sorted by name.
    fields: &'a BTreeMap<String, u8>,
}
