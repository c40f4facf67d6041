//! The Concourse resource lifecycle.
//!
//! Concourse talks to a resource type through three scripts, `check`, `in`
//! and `out`, each reading a JSON payload on stdin and writing a JSON
//! result on stdout. This crate lets a resource be written as a plain Rust
//! type and takes care of the protocol.
//!
//! # Architecture
//!
//! - [`Resource`]: the three lifecycle operations
//! - [`ResourceType`] / [`ResourceClass`]: building resources from the
//!   pipeline's `source` configuration
//! - [`dispatch`]: payload parsing, stdout protection and the script entry
//!   points
//! - [`wire`]: the JSON payload shapes
//! - [`BuildMetadata`]: the environment of the running build
//! - [`patterns`]: reusable shapes of resource
//! - [`logging`]: stderr logging for scripts
//! - `testing`: helpers for resource tests (feature `test-utils`)
//!
//! # Example
//!
//! ```
//! use concourse_resource::dispatch::Dispatcher;
//! use concourse_resource::patterns::{TriggerOnChange, TriggerOnChangeResource};
//! use concourse_resource::{BuildMetadata, Metadata, NoParams, ResourceClass, ResourceError};
//! use concourse_version::Version;
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Clone, Version)]
//! struct Image {
//!     digest: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Registry {
//!     repository: String,
//! }
//!
//! impl TriggerOnChangeResource for Registry {
//!     type Version = Image;
//!     type DownloadParams = NoParams;
//!     type PublishParams = NoParams;
//!
//!     fn fetch_latest_version(&self) -> Result<Image, ResourceError> {
//!         Ok(Image { digest: format!("sha256:{}", self.repository.len()) })
//!     }
//!
//!     fn download_version(
//!         &self,
//!         version: Image,
//!         _destination_dir: &Path,
//!         _build_metadata: &BuildMetadata,
//!         _params: NoParams,
//!     ) -> Result<(Image, Metadata), ResourceError> {
//!         Ok((version, Metadata::new()))
//!     }
//!
//!     fn publish_new_version(
//!         &self,
//!         _sources_dir: &Path,
//!         _build_metadata: &BuildMetadata,
//!         _params: NoParams,
//!     ) -> Result<(Image, Metadata), ResourceError> {
//!         Err(ResourceError::PublishNotPermitted)
//!     }
//! }
//!
//! let resource_type = ResourceClass::<TriggerOnChange<Registry>>::new();
//! let output = Dispatcher::with_env([("BUILD_ID", "1")])
//!     .check(&resource_type, r#"{"source": {"repository": "alpine"}}"#)
//!     .unwrap();
//! assert_eq!(output, r#"[{"digest": "sha256:6"}]"#);
//! ```

pub mod dispatch;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod patterns;
pub mod redirect;
pub mod resource;
mod template;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod wire;

// Re-export core types at crate root.
pub use dispatch::{Dispatcher, Operation, check_main, in_main, out_main};
pub use error::{ConfigError, DispatchError, MetadataError, ParseError, ResourceError};
pub use metadata::BuildMetadata;
pub use resource::{
    CERTS_DIR, DynResource, NoParams, Resource, ResourceClass, ResourceType, VersionOf,
};
pub use wire::{Metadata, MetadataPair, Params, ResourceConfig};
