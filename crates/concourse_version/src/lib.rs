//! Versions for Concourse resource types.
//!
//! A version identifies one immutable state of an external resource. This
//! crate defines what a version is and how it travels:
//!
//! - [`Version`] - conversion to and from the flat string mapping Concourse
//!   exchanges, with identity (`Eq`, `Hash`) defined by that mapping
//! - [`TypedVersion`] - versions with a declared field schema whose fields
//!   are encoded through a [`CodecRegistry`]
//! - [`SortableVersion`] - an opt-in ordering, with fallible sorting
//! - [`MultiVersion`] - a set of sub-versions tracked as one version
//! - [`DatetimeVersion`] - an opaque timestamp version
//!
//! # Derives
//!
//! - `#[derive(Version)]` flattens every public field with its default
//!   codec.
//! - `#[derive(TypedVersion)]` flattens through the type's registry and
//!   records the field schema.
//! - `#[derive(FlatEnum)]` makes a fieldless enum encodable by member name.
//!
//! Fields whose name starts with `_` are private: they are not flattened
//! and are rebuilt with `Default::default()`. Both version derives also
//! generate `PartialEq`, `Eq` and `Hash` from the flattened form.
//!
//! ```
//! use concourse_version::{Version, same_version};
//!
//! #[derive(Debug, Clone, Version)]
//! struct Commit {
//!     sha: String,
//! }
//!
//! #[derive(Debug, Clone, Version)]
//! struct Tag {
//!     sha: String,
//! }
//!
//! let commit = Commit { sha: "7154fe".into() };
//! let tag = Tag { sha: "7154fe".into() };
//! assert_eq!(commit.to_flat_dict(), tag.to_flat_dict());
//! assert!(!same_version(&commit, &tag));
//! ```
//!
//! A version without a public field carries no identity and is rejected:
//!
//! ```compile_fail
//! use concourse_version::TypedVersion;
//!
//! #[derive(Debug, Clone, TypedVersion)]
//! struct Empty {
//!     _cache: String,
//! }
//! ```

extern crate self as concourse_version;

pub mod datetime;
pub mod multi;
pub mod sortable;
pub mod typed;
pub mod version;

pub use concourse_flat::{
    CodecRegistry, Flat, FlatError, FlatObject, Target, TypeKey, json, type_chain,
};
pub use concourse_version_macros::{FlatEnum, TypedVersion, Version};
pub use datetime::DatetimeVersion;
pub use multi::{DefaultKey, MultiVersion, VersionKey};
pub use sortable::{ComparisonError, SortableVersion, newest_version, sort_versions};
pub use typed::{FieldSchema, TypedVersion, VersionSchema};
pub use version::{
    Version, VersionConfig, flat_eq, flat_hash, same_version, sorted_pairs, version_hash,
};
