//! Resources that can list every version and order them.

use crate::error::ResourceError;
use crate::metadata::BuildMetadata;
use crate::resource::Resource;
use crate::wire::Metadata;
use concourse_version::{ComparisonError, SortableVersion, sort_versions};
use core::cmp::Ordering;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;

/// Decides the `check` result from the previous version and every version
/// that currently exists.
///
/// - No versions at all yields nothing.
/// - The first check yields only the newest version.
/// - Otherwise every version newer than `previous` is yielded oldest
///   first, or just `previous` if nothing is newer.
///
/// Any pair of versions that cannot be ordered is an error.
pub fn organise<V: SortableVersion>(
    previous: Option<V>,
    all_versions: impl IntoIterator<Item = V>,
) -> Result<Vec<V>, ComparisonError> {
    let mut sorted = sort_versions(all_versions)?;
    let Some(previous) = previous else {
        return Ok(sorted.pop().into_iter().collect());
    };
    if sorted.is_empty() {
        return Ok(Vec::new());
    }

    let mut newer = Vec::new();
    for version in sorted {
        match previous.partial_cmp(&version) {
            Some(Ordering::Less) => newer.push(version),
            Some(_) => {}
            None => {
                return Err(ComparisonError {
                    type_name: core::any::type_name::<V>(),
                    left: format!("{previous:?}"),
                    right: format!("{version:?}"),
                });
            }
        }
    }

    if newer.is_empty() {
        Ok(vec![previous])
    } else {
        Ok(newer)
    }
}

/// A resource that lists all of its versions and relies on their ordering.
pub trait SelfOrganisingResource {
    /// The version type; it must be ordered.
    type Version: SortableVersion;
    /// Step params accepted by `get` steps.
    type DownloadParams: DeserializeOwned;
    /// Step params accepted by `put` steps.
    type PublishParams: DeserializeOwned;

    /// Fetches every version that currently exists.
    fn fetch_all_versions(&self) -> Result<HashSet<Self::Version>, ResourceError>;

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

/// Implements [`Resource`] for a [`SelfOrganisingResource`].
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct SelfOrganising<R>(pub R);

impl<R: SelfOrganisingResource> Resource for SelfOrganising<R> {
    type Version = R::Version;
    type DownloadParams = R::DownloadParams;
    type PublishParams = R::PublishParams;

    fn fetch_new_versions(
        &self,
        previous: Option<R::Version>,
    ) -> Result<Vec<R::Version>, ResourceError> {
        let all_versions = self.0.fetch_all_versions()?;
        Ok(organise(previous, all_versions)?)
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
