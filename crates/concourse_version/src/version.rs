//! The [`Version`] trait and the identity rules every version follows.
//!
//! A version is one immutable state of an external resource. On the wire it
//! is a flat JSON object of strings ([`VersionConfig`]); in Rust it is any type
//! that can convert to and from that mapping.
//!
//! # Identity
//!
//! Two versions are equal exactly when their flattened forms are equal, and
//! the hash is computed from the sorted flattened pairs plus the concrete
//! type. The derive macros generate `PartialEq`, `Eq` and `Hash` this way;
//! hand-written versions use [`impl_version_identity!`](crate::impl_version_identity).

use concourse_flat::FlatError;
use core::any::TypeId;
use core::hash::{Hash, Hasher};
use indexmap::IndexMap;
use std::hash::DefaultHasher;

/// A version as Concourse sees it: string keys mapped to string values.
///
/// Comparison ignores key order.
pub type VersionConfig = IndexMap<String, String>;

/// The identity of one state of a resource.
///
/// # Example
///
/// ```
/// use concourse_version::{FlatError, Version, VersionConfig, impl_version_identity};
///
/// #[derive(Debug)]
/// struct GitCommit {
///     commit_hash: String,
/// }
///
/// impl Version for GitCommit {
///     fn to_flat_dict(&self) -> VersionConfig {
///         VersionConfig::from([("commit_hash".to_owned(), self.commit_hash.clone())])
///     }
///
///     fn from_flat_dict(config: &VersionConfig) -> Result<Self, FlatError> {
///         let commit_hash = config
///             .get("commit_hash")
///             .ok_or_else(|| FlatError::missing_field::<Self>("commit_hash"))?;
///         Ok(Self { commit_hash: commit_hash.clone() })
///     }
/// }
///
/// impl_version_identity!(GitCommit);
///
/// let version = GitCommit { commit_hash: "abcdef".into() };
/// assert_eq!(GitCommit::from_flat_dict(&version.to_flat_dict()).unwrap(), version);
/// ```
pub trait Version: core::fmt::Debug + Eq + Hash + Sized + 'static {
    /// Converts the version to its flat wire form.
    fn to_flat_dict(&self) -> VersionConfig;

    /// Rebuilds a version from its flat wire form.
    fn from_flat_dict(config: &VersionConfig) -> Result<Self, FlatError>;
}

/// Equality in terms of the flattened form.
#[must_use]
pub fn flat_eq<V: Version>(left: &V, right: &V) -> bool {
    left.to_flat_dict() == right.to_flat_dict()
}

/// Hashes the concrete type and the sorted flattened pairs.
pub fn flat_hash<V: Version, H: Hasher>(version: &V, state: &mut H) {
    TypeId::of::<V>().hash(state);
    sorted_pairs(version).hash(state);
}

/// Returns the flattened pairs of `version` in key order.
#[must_use]
pub fn sorted_pairs<V: Version>(version: &V) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = version.to_flat_dict().into_iter().collect();
    pairs.sort_unstable();
    pairs
}

/// Computes the identity hash of `version` with the standard hasher.
#[must_use]
pub fn version_hash<V: Version>(version: &V) -> u64 {
    let mut hasher = DefaultHasher::new();
    flat_hash(version, &mut hasher);
    hasher.finish()
}

/// Compares versions that may be of different types.
///
/// Versions of different concrete types are never the same, even when
/// their flattened forms match.
#[must_use]
pub fn same_version<A: Version, B: Version>(left: &A, right: &B) -> bool {
    TypeId::of::<A>() == TypeId::of::<B>() && left.to_flat_dict() == right.to_flat_dict()
}

/// Implements `PartialEq`, `Eq` and `Hash` for a hand-written [`Version`]
/// in terms of its flattened form.
#[macro_export]
macro_rules! impl_version_identity {
    ($ty:ty) => {
        impl ::core::cmp::PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::flat_eq(self, other)
            }
        }

        impl ::core::cmp::Eq for $ty {}

        impl ::core::hash::Hash for $ty {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                $crate::flat_hash(self, state);
            }
        }
    };
}
