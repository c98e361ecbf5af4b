//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for potential issues.

use std::{collections::BTreeMap, fmt};

use sift_query::FieldMask;

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A field's bit does not fit in a field mask.
    BitOutOfRange {
        /// Name of the field.
        field: String,
        /// The configured bit.
        bit: u8,
    },
    /// More than one field uses the same bit.
    DuplicateBit {
        /// The shared bit.
        bit: u8,
        /// Fields using it, sorted by name.
        fields: Vec<String>,
    },
    /// No fields are defined, so every field modifier is ignored.
    NoFieldsDefined,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BitOutOfRange { field, bit } => write!(
                f,
                "field '{field}' uses bit {bit}, but bits must be below {}",
                FieldMask::CAPACITY
            ),
            Self::DuplicateBit { bit, fields } => {
                write!(f, "bit {bit} is shared by fields '{}'", fields.join("', '"))
            }
            Self::NoFieldsDefined => {
                write!(f, "no fields are defined in configuration")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.fields.is_empty() {
        warnings.push(ConfigWarning::NoFieldsDefined);
        return warnings;
    }

    let mut by_bit: BTreeMap<u8, Vec<String>> = BTreeMap::new();
    for (name, &bit) in &config.fields {
        if bit >= FieldMask::CAPACITY {
            warnings.push(ConfigWarning::BitOutOfRange {
                field: name.clone(),
                bit,
            });
            continue;
        }
        by_bit.entry(bit).or_default().push(name.clone());
    }

    warnings.extend(
        by_bit
            .into_iter()
            .filter(|(_, fields)| fields.len() > 1)
            .map(|(bit, fields)| ConfigWarning::DuplicateBit { bit, fields }),
    );

    warnings
}
