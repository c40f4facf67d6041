//! Error types for the resource lifecycle.
//!
//! Errors are split by where they arise, so callers and tests can assert on
//! the exact failure mode:
//!
//! - [`ParseError`] - the wire payload is malformed or incomplete
//! - [`ConfigError`] - the resource could not be built from its source
//! - [`MetadataError`] - the build environment is incomplete
//! - [`ResourceError`] - raised by resource code during an operation
//! - [`DispatchError`] - everything that can stop a `check`/`in`/`out` run

use concourse_version::{ComparisonError, FlatError};
use thiserror::Error;

/// A wire payload could not be parsed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload has no `source` key.
    #[error("could not extract source from payload")]
    MissingSource,

    /// The payload has no `version` key where one is required.
    #[error("could not extract version from payload")]
    MissingVersion,

    /// A section of the payload has the wrong JSON type.
    #[error("expected {section} to be a JSON object, found {found}")]
    NotAnObject {
        /// The payload section, such as `"source"` or `"params"`.
        section: &'static str,
        /// The JSON type that was found instead.
        found: &'static str,
    },
}

/// A resource could not be built from its source configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A combined resource type was configured without its selector key.
    #[error("missing flag: {key:?}")]
    MissingFlag {
        /// The selector key that was expected in the source.
        key: String,
    },

    /// A combined resource type was asked for a resource it does not know.
    #[error("couldn't find resource matching {requested:?}: possible options: {available:?}")]
    UnknownResource {
        /// The requested resource name.
        requested: String,
        /// The names that are registered.
        available: Vec<String>,
    },

    /// The source configuration does not fit the resource.
    #[error("invalid source configuration for {resource}: {source}")]
    InvalidSource {
        /// The resource type being built.
        resource: &'static str,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// The build environment does not provide what was asked for.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A required environment variable is absent.
    #[error("missing required build variable {0}")]
    MissingVariable(&'static str),

    /// `BUILD_CREATED_BY` was requested but the pipeline does not expose it.
    #[error(
        "the 'BUILD_CREATED_BY' variable has not been made available; enable it with \
         'expose_build_created_by' in the resource schema: \
         https://concourse-ci.org/resources.html#schema.resource.expose_build_created_by"
    )]
    NotExposed,

    /// A template references a variable that is not available.
    #[error("template variable ${0} is not available")]
    UnknownTemplateVariable(String),

    /// A template contains a `$` that does not start a placeholder.
    #[error("invalid placeholder in template at offset {offset}")]
    InvalidTemplate {
        /// Byte offset of the stray `$`.
        offset: usize,
    },

    /// `BUILD_PIPELINE_INSTANCE_VARS` is not a JSON object.
    #[error("pipeline instance vars are not a JSON object: {0}")]
    InvalidInstanceVars(String),
}

/// An error raised by resource code.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The requested version no longer exists upstream.
    #[error("version not found: {0}")]
    VersionNotFound(String),

    /// Versions that should be ordered could not be compared.
    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    /// The resource does not support publishing.
    #[error("publishing new versions of this resource is not permitted")]
    PublishNotPermitted,

    /// Step params did not match the resource's parameter type.
    #[error("invalid step params: {0}")]
    InvalidParams(#[source] serde_json::Error),

    /// A version could not be encoded or decoded.
    #[error(transparent)]
    Flat(#[from] FlatError),

    /// A filesystem operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Any other failure in resource code.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ResourceError {
    /// Creates a [`VersionNotFound`](Self::VersionNotFound).
    pub fn version_not_found(description: impl Into<String>) -> Self {
        Self::VersionNotFound(description.into())
    }

    /// Wraps an arbitrary error as [`Other`](Self::Other).
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }
}

/// Everything that can stop a `check`, `in` or `out` run.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The command line is wrong.
    #[error("usage: {0}")]
    Usage(String),

    /// The payload could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The resource could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The build environment is incomplete.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The incoming version could not be decoded.
    #[error(transparent)]
    Version(#[from] FlatError),

    /// Step params did not match the resource's parameter type.
    #[error("invalid step params: {0}")]
    Params(#[source] serde_json::Error),

    /// The resource failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Reading the payload or writing the result failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
