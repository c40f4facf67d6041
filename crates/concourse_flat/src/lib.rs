//! Flat encoding for Concourse versions.
//!
//! Concourse only understands versions as JSON objects whose keys and values
//! are all strings. This crate converts typed values to and from those
//! strings.
//!
//! # Architecture
//!
//! - [`Flat`] - a type with default string codecs (`to_string` / `parse`)
//! - [`TypeKey`] - runtime identifier for a type or a family of types
//! - [`CodecRegistry`] - per-type flatten/un-flatten functions, looked up
//!   along an explicit ancestor chain before falling back to the defaults
//! - [`FlatError`] - decoding failures
//! - [`json`] - deterministic JSON text for values embedded in versions
//!
//! # Example
//!
//! ```
//! use concourse_flat::CodecRegistry;
//!
//! let codecs = CodecRegistry::standard();
//! assert_eq!(codecs.flatten(&false), "False");
//! assert_eq!(codecs.unflatten::<bool>("False").unwrap(), false);
//! assert_eq!(codecs.unflatten::<u16>("8080").unwrap(), 8080);
//! ```

mod builtins;
pub mod error;
pub mod flat;
pub mod json;
pub mod key;
pub mod registry;

pub use error::FlatError;
pub use flat::{Flat, FlatObject, Target, type_chain};
pub use key::TypeKey;
pub use registry::{CodecRegistry, FlattenFn, UnflattenFn};
