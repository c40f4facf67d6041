//! The [`Flat`] trait and its type-erased companions.
//!
//! A [`Flat`] type knows how to turn itself into a string and back without
//! any registry: these are the *default* codecs, the equivalent of calling
//! `to_string()` and `parse()`. A [`CodecRegistry`](crate::CodecRegistry)
//! consults the type's ancestor chain first and only falls back to the
//! defaults when nothing is registered.

use crate::error::FlatError;
use crate::key::TypeKey;
use chrono::{DateTime, Utc};
use core::any::Any;
use std::path::PathBuf;

/// A value that can be flattened to a string and rebuilt from one.
///
/// # Example
///
/// ```
/// use concourse_flat::{Flat, FlatError};
///
/// #[derive(Debug, PartialEq)]
/// struct Sha(String);
///
/// impl Flat for Sha {
///     fn flatten_default(&self) -> String {
///         self.0.clone()
///     }
///
///     fn unflatten_default(flat: &str) -> Result<Self, FlatError> {
///         if flat.len() == 40 {
///             Ok(Sha(flat.to_owned()))
///         } else {
///             Err(FlatError::invalid_value::<Sha>(flat))
///         }
///     }
/// }
/// ```
pub trait Flat: Any + Sized {
    /// Families this type belongs to, most specific first.
    ///
    /// [`TypeKey::object`] is appended automatically and must not be listed.
    fn ancestors() -> Vec<TypeKey> {
        Vec::new()
    }

    /// Encodes the value when no codec is registered for its chain.
    fn flatten_default(&self) -> String;

    /// Decodes a value when no codec is registered for its chain.
    fn unflatten_default(flat: &str) -> Result<Self, FlatError>;

    /// The member name, for fieldless enums.
    fn member_name(&self) -> Option<&'static str> {
        None
    }

    /// Looks up an enum member by name.
    fn from_member_name(_name: &str) -> Option<Self> {
        None
    }
}

/// Returns the full lookup chain for `T`: itself, its ancestors, then
/// [`TypeKey::object`].
#[must_use]
pub fn type_chain<T: Flat>() -> Vec<TypeKey> {
    let mut chain = vec![TypeKey::of::<T>()];
    chain.extend(T::ancestors());
    chain.push(TypeKey::object());
    chain
}

// ─────────────────────────────────────────────────────────────────────
// Type-erased views
// ─────────────────────────────────────────────────────────────────────

/// A type-erased [`Flat`] value, as seen by registered flatten functions.
pub trait FlatObject: Any {
    /// Upcasts to [`Any`] for downcasting to a concrete type.
    fn as_any(&self) -> &dyn Any;

    /// The key of the value's concrete type.
    fn key(&self) -> TypeKey;

    /// The member name, for fieldless enums.
    fn member(&self) -> Option<&'static str>;

    /// The value's default encoding.
    fn default_flat(&self) -> String;
}

impl<T: Flat> FlatObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn member(&self) -> Option<&'static str> {
        self.member_name()
    }

    fn default_flat(&self) -> String {
        self.flatten_default()
    }
}

/// The destination type of an un-flatten call.
///
/// Registered un-flatten functions receive the target alongside the flat
/// string, so a single function registered for a family can still build the
/// concrete member type it was asked for.
#[derive(Clone, Copy)]
pub struct Target {
    key: TypeKey,
    from_member_name: fn(&str) -> Option<Box<dyn Any>>,
}

impl Target {
    /// Returns the target for `T`.
    #[must_use]
    pub fn of<T: Flat>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            from_member_name: erased_member::<T>,
        }
    }

    /// The key of the destination type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The fully qualified name of the destination type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    /// Builds the destination enum member called `name`.
    pub fn member(&self, name: &str) -> Result<Box<dyn Any>, FlatError> {
        (self.from_member_name)(name).ok_or_else(|| FlatError::UnknownMember {
            type_name: self.name(),
            name: name.to_owned(),
        })
    }
}

impl core::fmt::Debug for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Target").field("key", &self.key).finish()
    }
}

fn erased_member<T: Flat>(name: &str) -> Option<Box<dyn Any>> {
    T::from_member_name(name).map(|value| Box::new(value) as Box<dyn Any>)
}

// ─────────────────────────────────────────────────────────────────────
// Default implementations
// ─────────────────────────────────────────────────────────────────────

/// Implements [`Flat`] through `Display` and `FromStr`.
macro_rules! impl_flat_via_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Flat for $ty {
                fn flatten_default(&self) -> String {
                    self.to_string()
                }

                fn unflatten_default(flat: &str) -> Result<Self, FlatError> {
                    flat.parse::<$ty>().map_err(|err| FlatError::parse::<$ty>(flat, err))
                }
            }
        )*
    };
}

impl_flat_via_str!(
    String, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl Flat for bool {
    fn flatten_default(&self) -> String {
        let flat = if *self { "True" } else { "False" };
        flat.to_owned()
    }

    // Exact match: any other non-empty string would otherwise read as true.
    fn unflatten_default(flat: &str) -> Result<Self, FlatError> {
        match flat {
            "True" => Ok(true),
            "False" => Ok(false),
            other => Err(FlatError::invalid_value::<bool>(other)),
        }
    }
}

impl Flat for DateTime<Utc> {
    fn flatten_default(&self) -> String {
        self.to_rfc3339()
    }

    fn unflatten_default(flat: &str) -> Result<Self, FlatError> {
        DateTime::parse_from_rfc3339(flat)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|err| FlatError::parse::<Self>(flat, err))
    }
}

impl Flat for PathBuf {
    fn flatten_default(&self) -> String {
        self.display().to_string()
    }

    fn unflatten_default(flat: &str) -> Result<Self, FlatError> {
        Ok(PathBuf::from(flat))
    }
}
