//! Resources that only publish.

use crate::error::ResourceError;
use crate::metadata::BuildMetadata;
use crate::resource::{NoParams, Resource};
use crate::wire::Metadata;
use concourse_version::Version;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// The publishing half of a resource, such as a notification sender.
pub trait OutOnlyResource {
    /// The version produced by publishing.
    type Version: Version;
    /// Step params accepted by `put` steps.
    type PublishParams: DeserializeOwned;

    /// See [`Resource::publish_new_version`].
    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Self::PublishParams,
    ) -> Result<(Self::Version, Metadata), ResourceError>;
}

/// Implements [`Resource`] for an [`OutOnlyResource`].
///
/// `check` never finds versions, and the implicit `get` after a `put`
/// returns the version unchanged without touching the filesystem.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct OutOnly<R>(pub R);

impl<R: OutOnlyResource> Resource for OutOnly<R> {
    type Version = R::Version;
    type DownloadParams = NoParams;
    type PublishParams = R::PublishParams;

    fn fetch_new_versions(
        &self,
        _previous: Option<R::Version>,
    ) -> Result<Vec<R::Version>, ResourceError> {
        Ok(Vec::new())
    }

    fn download_version(
        &self,
        version: R::Version,
        _destination_dir: &Path,
        _build_metadata: &BuildMetadata,
        _params: NoParams,
    ) -> Result<(R::Version, Metadata), ResourceError> {
        Ok((version, Metadata::new()))
    }

    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: R::PublishParams,
    ) -> Result<(R::Version, Metadata), ResourceError> {
        self.0.publish_new_version(sources_dir, build_metadata, params)
    }
}
