//! Resources that trigger whenever their latest version changes.

use crate::error::ResourceError;
use crate::metadata::BuildMetadata;
use crate::resource::Resource;
use crate::wire::Metadata;
use concourse_version::Version;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Decides the `check` result from the previous and the latest version.
///
/// The first check yields the latest version and no change yields the
/// previous one. A change yields `[previous, latest]`, so at most one new
/// version surfaces per check.
pub fn trigger_on_change<V: Version>(previous: Option<V>, latest: V) -> Vec<V> {
    match previous {
        None => vec![latest],
        Some(previous) if previous == latest => vec![previous],
        Some(previous) => vec![previous, latest],
    }
}

/// A resource that can only tell its current state.
///
/// Versions between two checks cannot be reconstructed, so every change
/// triggers exactly one new version.
pub trait TriggerOnChangeResource {
    /// The version type.
    type Version: Version;
    /// Step params accepted by `get` steps.
    type DownloadParams: DeserializeOwned;
    /// Step params accepted by `put` steps.
    type PublishParams: DeserializeOwned;

    /// Fetches the latest version.
    fn fetch_latest_version(&self) -> Result<Self::Version, ResourceError>;

    /// See [`Resource::download_version`].
    fn download_version(
        &self,
        version: Self::Version,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Self::DownloadParams,
    ) -> Result<(Self::Version, Metadata), ResourceError>;

    /// See [`Resource::publish_new_version`].
    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Self::PublishParams,
    ) -> Result<(Self::Version, Metadata), ResourceError>;
}

/// Implements [`Resource`] for a [`TriggerOnChangeResource`].
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct TriggerOnChange<R>(pub R);

impl<R: TriggerOnChangeResource> Resource for TriggerOnChange<R> {
    type Version = R::Version;
    type DownloadParams = R::DownloadParams;
    type PublishParams = R::PublishParams;

    fn fetch_new_versions(
        &self,
        previous: Option<R::Version>,
    ) -> Result<Vec<R::Version>, ResourceError> {
        let latest = self.0.fetch_latest_version()?;
        Ok(trigger_on_change(previous, latest))
    }

    fn download_version(
        &self,
        version: R::Version,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: R::DownloadParams,
    ) -> Result<(R::Version, Metadata), ResourceError> {
        self.0
            .download_version(version, destination_dir, build_metadata, params)
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
