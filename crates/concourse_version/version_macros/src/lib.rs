//! Procedural macros for `concourse_version`.
//!
//! - `#[derive(Version)]` flattens every public field with its default codec.
//! - `#[derive(TypedVersion)]` flattens through a codec registry and records
//!   the field schema.
//! - `#[derive(FlatEnum)]` encodes a fieldless enum by member name.

mod flat_enum;
mod version;

use proc_macro::TokenStream;

/// Derive macro for the `Version` trait.
///
/// Every named field is flattened with `Flat::flatten_default` and rebuilt
/// with `Flat::unflatten_default`. Fields whose name starts with `_` are
/// skipped and rebuilt with `Default::default()`. `PartialEq`, `Eq` and
/// `Hash` are generated from the flattened form.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Version)]
/// struct Commit {
///     sha: String,
///     _cached_message: Option<String>,
/// }
/// ```
#[proc_macro_derive(Version, attributes(version))]
pub fn derive_version(input: TokenStream) -> TokenStream {
    version::derive_version(input, version::Mode::Plain)
}

/// Derive macro for the `TypedVersion` trait.
///
/// Like `#[derive(Version)]`, but fields go through the type's codec
/// registry, looked up along the declared type's ancestor chain.
///
/// # Attributes
///
/// - `codecs` (optional): path to a `fn() -> &'static CodecRegistry`.
///   Defaults to `CodecRegistry::standard`.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, TypedVersion)]
/// #[version(codecs = release_codecs)]
/// struct Release {
///     number: u32,
///     draft: bool,
/// }
/// ```
#[proc_macro_derive(TypedVersion, attributes(version))]
pub fn derive_typed_version(input: TokenStream) -> TokenStream {
    version::derive_version(input, version::Mode::Typed)
}

/// Derive macro for the `Flat` trait on fieldless enums.
///
/// Members encode as their name. The enum joins the enumeration family, so
/// codecs registered for that family apply to it.
///
/// # Attributes
///
/// - `#[flat(rename = "...")]` on a variant overrides its member name.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, FlatEnum)]
/// enum Channel {
///     #[flat(rename = "STABLE")]
///     Stable,
///     Beta,
/// }
/// ```
#[proc_macro_derive(FlatEnum, attributes(flat))]
pub fn derive_flat_enum(input: TokenStream) -> TokenStream {
    flat_enum::derive_flat_enum(input)
}
