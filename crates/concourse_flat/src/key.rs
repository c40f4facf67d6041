//! Runtime type identifiers used to key codec lookups.
//!
//! Rust has no class hierarchy to walk, so every [`Flat`](crate::Flat) type
//! declares its own ancestor chain explicitly. A chain is an ordered list of
//! [`TypeKey`]s, most specific first, always ending in [`TypeKey::object`].
//! Family keys such as [`TypeKey::enumeration`] stand in for abstract base
//! types that many concrete types share.

use core::any::TypeId;
use core::hash::{Hash, Hasher};

/// Identifies a type (or a family of types) in a [`CodecRegistry`](crate::CodecRegistry).
///
/// Equality and hashing use only the underlying [`TypeId`]; the name is kept
/// for error messages and debugging.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// The wildcard family every chain ends in.
    ///
    /// A codec registered under this key acts as a default for every type
    /// that has no more specific entry.
    #[must_use]
    pub fn object() -> Self {
        Self::of::<ObjectFamily>()
    }

    /// The family shared by every fieldless enum deriving `FlatEnum`.
    #[must_use]
    pub fn enumeration() -> Self {
        Self::of::<EnumFamily>()
    }

    /// Returns the underlying [`TypeId`].
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl core::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name)
    }
}

/// Marker for [`TypeKey::object`].
enum ObjectFamily {}

/// Marker for [`TypeKey::enumeration`].
enum EnumFamily {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<bool>());
        assert_ne!(TypeKey::object(), TypeKey::enumeration());
    }

    #[test]
    fn key_keeps_type_name() {
        assert_eq!(TypeKey::of::<bool>().name(), "bool");
        assert_eq!(TypeKey::of::<u32>().to_string(), "u32");
    }
}
