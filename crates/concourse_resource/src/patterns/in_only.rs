//! Resources that only download.

use crate::error::ResourceError;
use crate::metadata::BuildMetadata;
use crate::resource::{NoParams, Resource};
use crate::wire::Metadata;
use concourse_version::DatetimeVersion;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// The downloading half of a resource, fetched on demand.
///
/// The resource is versioned by the time it was requested: a pipeline
/// triggers it with a `put`, then the implicit `get` calls
/// [`download_data`](Self::download_data).
pub trait InOnlyResource {
    /// Step params accepted by `get` steps.
    type DownloadParams: DeserializeOwned;

    /// Downloads the data into `destination_dir`, returning metadata.
    fn download_data(
        &self,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: Self::DownloadParams,
    ) -> Result<Metadata, ResourceError>;
}

/// Implements [`Resource`] for an [`InOnlyResource`].
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct InOnly<R>(pub R);

impl<R: InOnlyResource> Resource for InOnly<R> {
    type Version = DatetimeVersion;
    type DownloadParams = R::DownloadParams;
    type PublishParams = NoParams;

    fn fetch_new_versions(
        &self,
        _previous: Option<DatetimeVersion>,
    ) -> Result<Vec<DatetimeVersion>, ResourceError> {
        Ok(Vec::new())
    }

    fn download_version(
        &self,
        version: DatetimeVersion,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: R::DownloadParams,
    ) -> Result<(DatetimeVersion, Metadata), ResourceError> {
        let metadata = self.0.download_data(destination_dir, build_metadata, params)?;
        Ok((version, metadata))
    }

    fn publish_new_version(
        &self,
        _sources_dir: &Path,
        _build_metadata: &BuildMetadata,
        _params: NoParams,
    ) -> Result<(DatetimeVersion, Metadata), ResourceError> {
        let version = DatetimeVersion::now();
        debug!(execution_date = %version.execution_date, "stamped new version");
        Ok((version, Metadata::new()))
    }
}
