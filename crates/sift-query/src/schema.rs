//! Field name resolution.
//!
//! Field modifiers (`@title:`) name index fields; the parser turns those names into bit
//! positions through a [`FieldResolver`]. [`Schema`] is the stock implementation: an ordered
//! table of field names and their bits.

use thiserror::Error;

use crate::ast::FieldMask;

/// Maps field names to bit positions in a [`FieldMask`].
///
/// Resolvers are only ever read by the parser, so a single resolver can serve any number of
/// concurrent parses.
pub trait FieldResolver {
    /// Returns the bit position for `name`, or `None` if the field is unknown.
    fn resolve(&self, name: &str) -> Option<u8>;
}

impl<T: FieldResolver + ?Sized> FieldResolver for &T {
    fn resolve(&self, name: &str) -> Option<u8> {
        (**self).resolve(name)
    }
}

/// Errors from building a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The field name is already defined.
    #[error("field '{0}' is defined twice")]
    DuplicateField(String),
    /// Another field already owns this bit.
    #[error("bit {bit} for field '{field}' is already used by '{owner}'")]
    BitInUse {
        /// Field being added.
        field: String,
        /// Requested bit.
        bit: u8,
        /// Field that already has the bit.
        owner: String,
    },
    /// The bit does not fit in a field mask.
    #[error("bit {bit} for field '{field}' is out of range (maximum {max})")]
    BitOutOfRange {
        /// Field being added.
        field: String,
        /// Requested bit.
        bit: u8,
        /// Largest valid bit.
        max: u8,
    },
    /// Every bit is taken.
    #[error("cannot add field '{0}': all field bits are in use")]
    TooManyFields(String),
}

/// A field table mapping names to mask bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Fields in definition order.
    fields: Vec<(String, u8)>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schema assigning consecutive bits, starting at 0, to `names`.
    pub fn from_fields<I, S>(names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self::new();
        for name in names {
            schema.add_field(name)?;
        }
        Ok(schema)
    }

    /// Returns the schema with `name` added at the lowest free bit.
    pub fn with_field(mut self, name: impl Into<String>) -> Result<Self, SchemaError> {
        self.add_field(name)?;
        Ok(self)
    }

    /// Returns the schema with `name` added at `bit`.
    pub fn with_field_at(mut self, name: impl Into<String>, bit: u8) -> Result<Self, SchemaError> {
        self.add_field_at(name, bit)?;
        Ok(self)
    }

    /// Adds `name` at the lowest free bit and returns that bit.
    pub fn add_field(&mut self, name: impl Into<String>) -> Result<u8, SchemaError> {
        let name = name.into();
        let Some(bit) = (0..FieldMask::CAPACITY).find(|&b| self.name_of(b).is_none()) else {
            return Err(SchemaError::TooManyFields(name));
        };
        self.add_field_at(name, bit)?;
        Ok(bit)
    }

    /// Adds `name` at an explicit bit.
    pub fn add_field_at(&mut self, name: impl Into<String>, bit: u8) -> Result<(), SchemaError> {
        let name = name.into();
        if bit >= FieldMask::CAPACITY {
            return Err(SchemaError::BitOutOfRange {
                field: name,
                bit,
                max: FieldMask::CAPACITY - 1,
            });
        }
        if self.resolve(&name).is_some() {
            return Err(SchemaError::DuplicateField(name));
        }
        if let Some(owner) = self.name_of(bit) {
            return Err(SchemaError::BitInUse {
                owner: owner.to_string(),
                field: name,
                bit,
            });
        }
        self.fields.push((name, bit));
        Ok(())
    }

    /// Returns the name of the field at `bit`.
    pub fn name_of(&self, bit: u8) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, b)| *b == bit)
            .map(|(name, _)| name.as_str())
    }

    /// Iterates `(name, bit)` pairs in definition order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, u8)> {
        self.fields.iter().map(|(name, bit)| (name.as_str(), *bit))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are defined.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldResolver for Schema {
    fn resolve(&self, name: &str) -> Option<u8> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, bit)| *bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_bits() {
        let schema = Schema::from_fields(["title", "body", "tags"]).unwrap();
        assert_eq!(schema.resolve("title"), Some(0));
        assert_eq!(schema.resolve("body"), Some(1));
        assert_eq!(schema.resolve("tags"), Some(2));
        assert_eq!(schema.resolve("missing"), None);
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn explicit_bits() {
        let schema = Schema::new()
            .with_field_at("title", 2)
            .unwrap()
            .with_field_at("body", 5)
            .unwrap();
        assert_eq!(schema.resolve("title"), Some(2));
        assert_eq!(schema.resolve("body"), Some(5));
        assert_eq!(schema.name_of(5), Some("body"));
        assert_eq!(schema.name_of(0), None);
    }

    #[test]
    fn auto_bits_skip_taken_positions() {
        let schema = Schema::new()
            .with_field_at("title", 0)
            .unwrap()
            .with_field("body")
            .unwrap();
        assert_eq!(schema.resolve("body"), Some(1));
    }

    #[test]
    fn names_are_case_sensitive() {
        let schema = Schema::from_fields(["title"]).unwrap();
        assert_eq!(schema.resolve("Title"), None);
    }

    #[test]
    fn duplicate_field() {
        let err = Schema::from_fields(["a", "a"]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("a".into()));
    }

    #[test]
    fn bit_in_use() {
        let err = Schema::new()
            .with_field_at("a", 3)
            .unwrap()
            .with_field_at("b", 3)
            .unwrap_err();
        assert!(matches!(err, SchemaError::BitInUse { bit: 3, .. }));
        assert!(err.to_string().contains("already used by 'a'"));
    }

    #[test]
    fn bit_out_of_range() {
        let err = Schema::new().with_field_at("a", 64).unwrap_err();
        assert!(matches!(err, SchemaError::BitOutOfRange { bit: 64, max: 63, .. }));
    }

    #[test]
    fn too_many_fields() {
        let names: Vec<String> = (0..64).map(|i| format!("f{i}")).collect();
        let mut schema = Schema::from_fields(names).unwrap();
        assert_eq!(
            schema.add_field("overflow"),
            Err(SchemaError::TooManyFields("overflow".into()))
        );
    }

    #[test]
    fn resolver_through_reference() {
        fn lookup<R: FieldResolver>(resolver: R, name: &str) -> Option<u8> {
            resolver.resolve(name)
        }
        let schema = Schema::from_fields(["title"]).unwrap();
        assert_eq!(lookup(&schema, "title"), Some(0));
    }
}
