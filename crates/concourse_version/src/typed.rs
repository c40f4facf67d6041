//! Versions whose fields are encoded through a [`CodecRegistry`].
//!
//! `#[derive(TypedVersion)]` attaches an explicit field list to the type at
//! definition time. Each field is flattened through the type's registry and
//! decoded according to its declared type, so a version can hold booleans,
//! timestamps, enums or any other [`Flat`] value.
//!
//! ```
//! use concourse_version::{FlatEnum, TypedVersion, Version};
//!
//! #[derive(Debug, Clone, FlatEnum)]
//! enum Channel {
//!     Stable,
//!     Beta,
//! }
//!
//! #[derive(Debug, Clone, TypedVersion)]
//! struct Release {
//!     number: u32,
//!     channel: Channel,
//!     draft: bool,
//! }
//!
//! let release = Release { number: 12, channel: Channel::Beta, draft: false };
//! let flat = release.to_flat_dict();
//! assert_eq!(flat["number"], "12");
//! assert_eq!(flat["channel"], "Beta");
//! assert_eq!(flat["draft"], "False");
//! assert_eq!(Release::from_flat_dict(&flat).unwrap(), release);
//! ```

use crate::version::{Version, VersionConfig};
use concourse_flat::{CodecRegistry, Flat, FlatError, TypeKey};

/// A [`Version`] with a declared field schema and a codec registry.
pub trait TypedVersion: Version {
    /// The fields declared on the type, in declaration order.
    fn schema() -> VersionSchema;

    /// The registry used to encode and decode fields.
    ///
    /// Defaults to [`CodecRegistry::standard`]; override with
    /// `#[version(codecs = path::to::fn)]`.
    fn codecs() -> &'static CodecRegistry {
        CodecRegistry::standard()
    }
}

/// One declared field of a version type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name, used as the flat key.
    pub name: &'static str,
    /// Declared type of the field.
    pub type_key: TypeKey,
    /// Private fields start with `_` and are not part of the identity.
    pub private: bool,
}

/// The field list of a version type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSchema {
    /// Fully qualified name of the version type.
    pub type_name: &'static str,
    /// Every declared field, private ones included.
    pub fields: Vec<FieldSchema>,
}

impl VersionSchema {
    /// Iterates the fields that take part in flattening.
    pub fn public_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|field| !field.private)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Support for generated code
// ─────────────────────────────────────────────────────────────────────

/// Decodes field `name` of version type `V` through `codecs`.
pub fn take_field<V: 'static, T: Flat>(
    codecs: &CodecRegistry,
    config: &VersionConfig,
    name: &str,
) -> Result<T, FlatError> {
    let flat = config
        .get(name)
        .ok_or_else(|| FlatError::missing_field::<V>(name))?;
    codecs.unflatten::<T>(flat)
}

/// Decodes field `name` of version type `V` with the default codec of `T`.
pub fn take_default_field<V: 'static, T: Flat>(
    config: &VersionConfig,
    name: &str,
) -> Result<T, FlatError> {
    let flat = config
        .get(name)
        .ok_or_else(|| FlatError::missing_field::<V>(name))?;
    T::unflatten_default(flat)
}

/// Fails on the first key of `config` that is not in `known`.
pub fn reject_unexpected<V: 'static>(
    config: &VersionConfig,
    known: &[&str],
) -> Result<(), FlatError> {
    match config.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(FlatError::unexpected_field::<V>(key.as_str())),
        None => Ok(()),
    }
}
