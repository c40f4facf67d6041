//! Resources that track a set of sub-versions as one version.

use crate::error::ResourceError;
use crate::metadata::BuildMetadata;
use crate::patterns::trigger::trigger_on_change;
use crate::resource::Resource;
use crate::wire::{Metadata, Params};
use concourse_version::{MultiVersion, SortableVersion, VersionKey, json};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A resource whose state is a set of items, such as the files in a
/// bucket or the open pull requests of a repository.
///
/// The whole set is one version: any addition or removal triggers, and
/// `in` writes the set to a JSON file for the build to read.
pub trait MultiVersionResource {
    /// The version of one item.
    type SubVersion: SortableVersion + Ord;
    /// The key the set is stored under in the flat version.
    type Key: VersionKey;

    /// Fetches the current set of items.
    fn fetch_latest_sub_versions(&self) -> Result<HashSet<Self::SubVersion>, ResourceError>;

    /// Runs `in` for a set of items.
    ///
    /// Writes the set with [`write_sub_versions`] and returns the version
    /// unchanged. Override it to fetch the items themselves, calling
    /// [`write_sub_versions`] to keep the default file.
    fn download_sub_versions(
        &self,
        version: MultiVersion<Self::SubVersion, Self::Key>,
        destination_dir: &Path,
        _build_metadata: &BuildMetadata,
        params: MultiVersionDownloadParams,
    ) -> Result<(MultiVersion<Self::SubVersion, Self::Key>, Metadata), ResourceError> {
        write_sub_versions(&version, destination_dir, &params)?;
        Ok((version, Metadata::new()))
    }
}

/// Step params for downloading a multi-version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiVersionDownloadParams {
    /// Name of the file to write, without the `.json` extension. Defaults
    /// to the version key.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Indentation of the written JSON. Compact when absent.
    #[serde(default)]
    pub indent: Option<usize>,
}

/// Writes the sub-versions of `version` to `{file_name}.json` in
/// `destination_dir`, returning the path written.
///
/// The file name falls back to the version key when absent or empty. The
/// list is sorted the same way the version is flattened.
pub fn write_sub_versions<V, K>(
    version: &MultiVersion<V, K>,
    destination_dir: &Path,
    params: &MultiVersionDownloadParams,
) -> Result<PathBuf, ResourceError>
where
    V: SortableVersion + Ord,
    K: VersionKey,
{
    let file_name = params
        .file_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(K::KEY);
    let path = destination_dir.join(format!("{file_name}.json"));

    let data = Value::Array(
        version
            .sub_version_data()
            .into_iter()
            .map(|config| {
                Value::Object(
                    config
                        .into_iter()
                        .map(|(key, value)| (key, Value::String(value)))
                        .collect(),
                )
            })
            .collect(),
    );
    let contents = match params.indent {
        Some(indent) => json::encode_indented(&data, indent),
        None => json::encode(&data),
    };

    fs::write(&path, contents)?;
    debug!(path = %path.display(), items = version.len(), "wrote sub-versions");
    Ok(path)
}

/// Implements [`Resource`] for a [`MultiVersionResource`].
///
/// `check` behaves like [`TriggerOnChange`](super::TriggerOnChange) over
/// the whole set. Publishing is not permitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct MultiVersioned<R>(pub R);

impl<R: MultiVersionResource> Resource for MultiVersioned<R> {
    type Version = MultiVersion<R::SubVersion, R::Key>;
    type DownloadParams = MultiVersionDownloadParams;
    type PublishParams = Params;

    fn fetch_new_versions(
        &self,
        previous: Option<Self::Version>,
    ) -> Result<Vec<Self::Version>, ResourceError> {
        let latest = MultiVersion::new(self.0.fetch_latest_sub_versions()?);
        Ok(trigger_on_change(previous, latest))
    }

    fn download_version(
        &self,
        version: Self::Version,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: MultiVersionDownloadParams,
    ) -> Result<(Self::Version, Metadata), ResourceError> {
        self.0.download_sub_versions(version, destination_dir, build_metadata, params)
    }

    fn publish_new_version(
        &self,
        _sources_dir: &Path,
        _build_metadata: &BuildMetadata,
        _params: Params,
    ) -> Result<(Self::Version, Metadata), ResourceError> {
        Err(ResourceError::PublishNotPermitted)
    }
}
