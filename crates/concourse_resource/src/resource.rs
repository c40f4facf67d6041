//! The resource lifecycle contract.
//!
//! A resource answers three questions for Concourse:
//!
//! | Script | Method | Answers |
//! |--------|--------|---------|
//! | `check` | [`Resource::fetch_new_versions`] | which versions exist? |
//! | `in` | [`Resource::download_version`] | what does this version contain? |
//! | `out` | [`Resource::publish_new_version`] | here is something new |
//!
//! Every run is a fresh process, so a resource holds no state between
//! operations beyond what it is built from: the `source` configuration of
//! the pipeline, deserialized by a [`ResourceType`].

use crate::error::{ConfigError, ResourceError};
use crate::metadata::BuildMetadata;
use crate::wire::{Metadata, Params, ResourceConfig};
use concourse_version::Version;
use core::marker::PhantomData;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// Where Concourse workers mount their CA certificates.
///
/// The directory may be absent, depending on how the worker is configured.
pub const CERTS_DIR: &str = "/etc/ssl/certs";

/// An external input or output of a pipeline.
///
/// # Example
///
/// ```
/// use concourse_resource::{BuildMetadata, Metadata, NoParams, Resource, ResourceError};
/// use concourse_version::Version;
/// use serde::Deserialize;
/// use std::path::Path;
///
/// #[derive(Debug, Clone, Version)]
/// struct Commit {
///     sha: String,
/// }
///
/// #[derive(Deserialize)]
/// struct Repository {
///     uri: String,
/// }
///
/// impl Resource for Repository {
///     type Version = Commit;
///     type DownloadParams = NoParams;
///     type PublishParams = NoParams;
///
///     fn fetch_new_versions(
///         &self,
///         previous: Option<Commit>,
///     ) -> Result<Vec<Commit>, ResourceError> {
///         Ok(previous.into_iter().collect())
///     }
///
///     fn download_version(
///         &self,
///         version: Commit,
///         _destination_dir: &Path,
///         _build_metadata: &BuildMetadata,
///         _params: NoParams,
///     ) -> Result<(Commit, Metadata), ResourceError> {
///         let metadata = Metadata::from([("uri".to_owned(), self.uri.clone())]);
///         Ok((version, metadata))
///     }
///
///     fn publish_new_version(
///         &self,
///         _sources_dir: &Path,
///         _build_metadata: &BuildMetadata,
///         _params: NoParams,
///     ) -> Result<(Commit, Metadata), ResourceError> {
///         Err(ResourceError::PublishNotPermitted)
///     }
/// }
/// ```
pub trait Resource {
    /// The version type every payload is parsed with.
    type Version: Version;
    /// Step params accepted by `get` steps.
    type DownloadParams: DeserializeOwned;
    /// Step params accepted by `put` steps.
    type PublishParams: DeserializeOwned;

    /// The worker's certificate directory.
    fn certs_dir(&self) -> &Path {
        Path::new(CERTS_DIR)
    }

    /// Fetches versions newer than `previous`, oldest first.
    ///
    /// The list should include `previous` if it is still valid, so when
    /// nothing has changed the answer is `[previous]`. Without a previous
    /// version, return only the latest version rather than the full history.
    fn fetch_new_versions(
        &self,
        previous: Option<Self::Version>,
    ) -> Result<Vec<Self::Version>, ResourceError>;

    /// Downloads `version` into `destination_dir`.
    ///
    /// Returns the version, normally unchanged, and metadata to display.
    /// Fails with [`ResourceError::VersionNotFound`] when the version no
    /// longer exists upstream.
    fn download_version(
        &self,
        version: Self::Version,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Self::DownloadParams,
    ) -> Result<(Self::Version, Metadata), ResourceError>;

    /// Publishes a new version.
    ///
    /// `sources_dir` holds every input of the build, not only this
    /// resource's files.
    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Self::PublishParams,
    ) -> Result<(Self::Version, Metadata), ResourceError>;
}

/// Step params for operations that take none.
///
/// Any supplied param is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

// ─────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────

/// Builds resources from their `source` configuration.
pub trait ResourceType {
    /// The resource this type builds.
    type Resource: Resource;

    /// Builds a resource from the `source` section of a payload.
    fn from_resource_config(&self, config: ResourceConfig) -> Result<Self::Resource, ConfigError>;
}

/// The version type of the resources built by `T`.
pub type VersionOf<T> = <<T as ResourceType>::Resource as Resource>::Version;

/// A [`ResourceType`] that deserializes the source into `R` with serde.
///
/// Source keys map to fields. Missing keys fail unless the field has a
/// serde default, and unknown keys fail when `R` opts into
/// `#[serde(deny_unknown_fields)]`.
pub struct ResourceClass<R>(PhantomData<fn() -> R>);

impl<R> ResourceClass<R> {
    /// Creates the resource type.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for ResourceClass<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ResourceClass<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ResourceClass<R> {}

impl<R> core::fmt::Debug for ResourceClass<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ResourceClass")
            .field(&core::any::type_name::<R>())
            .finish()
    }
}

impl<R: Resource + DeserializeOwned> ResourceType for ResourceClass<R> {
    type Resource = R;

    fn from_resource_config(&self, config: ResourceConfig) -> Result<R, ConfigError> {
        serde_json::from_value(Value::Object(config)).map_err(|source| ConfigError::InvalidSource {
            resource: core::any::type_name::<R>(),
            source,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────
// Type erasure
// ─────────────────────────────────────────────────────────────────────

/// A [`Resource`] with its params erased to JSON, so resources of
/// different types that share a version type can sit behind one pointer.
pub trait DynResource<V> {
    /// See [`Resource::certs_dir`].
    fn certs_dir(&self) -> &Path;

    /// See [`Resource::fetch_new_versions`].
    fn fetch_new_versions(&self, previous: Option<V>) -> Result<Vec<V>, ResourceError>;

    /// See [`Resource::download_version`].
    fn download_version(
        &self,
        version: V,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Params,
    ) -> Result<(V, Metadata), ResourceError>;

    /// See [`Resource::publish_new_version`].
    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Params,
    ) -> Result<(V, Metadata), ResourceError>;
}

fn decode_params<P: DeserializeOwned>(params: Params) -> Result<P, ResourceError> {
    serde_json::from_value(Value::Object(params)).map_err(ResourceError::InvalidParams)
}

impl<R: Resource> DynResource<R::Version> for R {
    fn certs_dir(&self) -> &Path {
        Resource::certs_dir(self)
    }

    fn fetch_new_versions(
        &self,
        previous: Option<R::Version>,
    ) -> Result<Vec<R::Version>, ResourceError> {
        Resource::fetch_new_versions(self, previous)
    }

    fn download_version(
        &self,
        version: R::Version,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Params,
    ) -> Result<(R::Version, Metadata), ResourceError> {
        let params = decode_params(params)?;
        Resource::download_version(self, version, destination_dir, build_metadata, params)
    }

    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Params,
    ) -> Result<(R::Version, Metadata), ResourceError> {
        let params = decode_params(params)?;
        Resource::publish_new_version(self, sources_dir, build_metadata, params)
    }
}

impl<V: Version> Resource for Box<dyn DynResource<V>> {
    type Version = V;
    type DownloadParams = Params;
    type PublishParams = Params;

    fn certs_dir(&self) -> &Path {
        (**self).certs_dir()
    }

    fn fetch_new_versions(&self, previous: Option<V>) -> Result<Vec<V>, ResourceError> {
        (**self).fetch_new_versions(previous)
    }

    fn download_version(
        &self,
        version: V,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Params,
    ) -> Result<(V, Metadata), ResourceError> {
        (**self).download_version(version, destination_dir, build_metadata, params)
    }

    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Params,
    ) -> Result<(V, Metadata), ResourceError> {
        (**self).publish_new_version(sources_dir, build_metadata, params)
    }
}
