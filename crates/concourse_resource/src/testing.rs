//! Test helpers for resource authors.
//!
//! Enabled by the `test-utils` feature.
//!
//! - [`create_env_vars`] and [`BuildMetadata::for_testing`] fake the build
//!   environment.
//! - [`DirectoryState`] runs code against a temporary directory seeded from
//!   a [`FolderState`], capturing what it looks like afterwards.
//! - The wrappers drive a resource at three levels of fidelity:
//!
//! | Wrapper | Calls | Inputs and outputs |
//! |---------|-------|--------------------|
//! | [`SimpleTestResourceWrapper`] | the resource directly | typed |
//! | [`JsonTestResourceWrapper`] | the full JSON dispatch | JSON |
//! | [`ConversionTestResourceWrapper`] | the full JSON dispatch | typed |
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "test-utils")]
//! # {
//! use concourse_resource::testing::{DirectoryEntry, SimpleTestResourceWrapper};
//! # use concourse_resource::{BuildMetadata, Metadata, NoParams, Resource, ResourceError};
//! # use std::path::Path;
//! # #[derive(Debug, Clone, concourse_version::Version)]
//! # struct Commit { sha: String }
//! # struct Readme;
//! # impl Resource for Readme {
//! #     type Version = Commit;
//! #     type DownloadParams = NoParams;
//! #     type PublishParams = NoParams;
//! #     fn fetch_new_versions(&self, _: Option<Commit>) -> Result<Vec<Commit>, ResourceError> { Ok(vec![]) }
//! #     fn download_version(&self, v: Commit, dir: &Path, _: &BuildMetadata, _: NoParams) -> Result<(Commit, Metadata), ResourceError> {
//! #         std::fs::write(dir.join("README.txt"), format!("README for {}\n", v.sha))?;
//! #         Ok((v, Metadata::new()))
//! #     }
//! #     fn publish_new_version(&self, _: &Path, _: &BuildMetadata, _: NoParams) -> Result<(Commit, Metadata), ResourceError> { Err(ResourceError::PublishNotPermitted) }
//! # }
//!
//! let mut wrapper = SimpleTestResourceWrapper::new(Readme);
//! let version = Commit { sha: "61cbef".into() };
//! wrapper.download_version(version, NoParams {}).unwrap();
//!
//! let state = wrapper.final_state().unwrap();
//! assert_eq!(state["README.txt"], DirectoryEntry::file("README for 61cbef\n"));
//! # }
//! ```

use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, ParseError, ResourceError};
use crate::metadata::BuildMetadata;
use crate::resource::{Resource, ResourceType, VersionOf};
use crate::wire::{self, Metadata, MetadataPair, Params, ResourceConfig};
use concourse_version::{Version, VersionConfig};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────────────
// Build environment
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the environment Concourse gives `in` and `out`.
///
/// Pipeline builds get a job and pipeline name, and instance vars when
/// given. One-off builds get neither. `extra` is applied last and
/// overrides any default.
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use concourse_resource::testing::create_env_vars;
///
/// let env = create_env_vars(true, None, [("BUILD_CREATED_BY", "admin")]);
/// assert_eq!(
///     env.keys().collect::<Vec<_>>(),
///     ["BUILD_ID", "BUILD_NAME", "BUILD_TEAM_NAME", "ATC_EXTERNAL_URL", "BUILD_CREATED_BY"]
/// );
/// # }
/// ```
pub fn create_env_vars<K, V>(
    one_off_build: bool,
    instance_vars: Option<&Map<String, Value>>,
    extra: impl IntoIterator<Item = (K, V)>,
) -> IndexMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
{
    let mut env: IndexMap<String, String> = [
        ("BUILD_ID", "12345678"),
        ("BUILD_NAME", "42"),
        ("BUILD_TEAM_NAME", "my-team"),
        ("ATC_EXTERNAL_URL", "https://ci.myconcourse.com"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect();

    if !one_off_build {
        env.insert("BUILD_JOB_NAME".to_owned(), "my-job".to_owned());
        env.insert("BUILD_PIPELINE_NAME".to_owned(), "my-pipeline".to_owned());
        if let Some(vars) = instance_vars {
            env.insert(
                "BUILD_PIPELINE_INSTANCE_VARS".to_owned(),
                wire::encode(&Value::Object(vars.clone())),
            );
        }
    }

    env.extend(extra.into_iter().map(|(key, value)| (key.into(), value.into())));
    env
}

impl BuildMetadata {
    /// Metadata built from [`create_env_vars`] without extras.
    #[must_use]
    pub fn for_testing(one_off_build: bool, instance_vars: Option<&Map<String, Value>>) -> Self {
        let env = create_env_vars(one_off_build, instance_vars, None::<(String, String)>);
        // Every required variable is set above.
        Self::from_lookup(|key| env.get(key).cloned())
            .unwrap_or_else(|_| Self::new("12345678", "my-team", "https://ci.myconcourse.com"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory state
// ─────────────────────────────────────────────────────────────────────────────

/// The contents of a folder, by entry name.
pub type FolderState = BTreeMap<String, DirectoryEntry>;

/// One entry of a [`FolderState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEntry {
    /// A text file and its contents.
    File(String),
    /// A file that is not UTF-8, represented by its first bytes.
    Binary(Vec<u8>),
    /// A folder and its contents.
    Folder(FolderState),
    /// A folder beyond the depth limit, not descended into.
    Unexplored,
}

impl DirectoryEntry {
    /// A text file.
    pub fn file(contents: impl Into<String>) -> Self {
        Self::File(contents.into())
    }

    /// A folder.
    pub fn folder<K: Into<String>>(entries: impl IntoIterator<Item = (K, DirectoryEntry)>) -> Self {
        Self::Folder(
            entries
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        )
    }
}

/// Bytes kept from a file that is not UTF-8.
const BINARY_HEAD: usize = 16;

/// A temporary directory seeded with known contents.
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use concourse_resource::testing::{DirectoryEntry, DirectoryState, FolderState};
///
/// let mut state = DirectoryState::new(FolderState::from([
///     ("notes.txt".to_owned(), DirectoryEntry::file("hello")),
/// ]));
/// let contents = state
///     .run(|dir| std::fs::read_to_string(dir.join("notes.txt")))
///     .unwrap()
///     .unwrap();
/// assert_eq!(contents, "hello");
/// assert!(state.final_state().is_some());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryState {
    starting_state: FolderState,
    max_depth: usize,
    final_state: Option<FolderState>,
}

impl DirectoryState {
    /// Creates a directory state with a depth limit of 2.
    #[must_use]
    pub fn new(starting_state: FolderState) -> Self {
        Self {
            starting_state,
            max_depth: 2,
            final_state: None,
        }
    }

    /// Sets how deep the final state is captured. A limit of 1 does not
    /// enter any folder.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The contents the directory starts with.
    #[must_use]
    pub fn starting_state(&self) -> &FolderState {
        &self.starting_state
    }

    /// Replaces the contents the directory starts with.
    pub fn set_starting_state(&mut self, starting_state: FolderState) {
        self.starting_state = starting_state;
    }

    /// The contents captured at the end of the last [`run`](Self::run).
    #[must_use]
    pub fn final_state(&self) -> Option<&FolderState> {
        self.final_state.as_ref()
    }

    /// Creates the directory, runs `code` in it and captures the result.
    ///
    /// The directory is deleted afterwards.
    pub fn run<T>(&mut self, code: impl FnOnce(&Path) -> T) -> io::Result<T> {
        self.final_state = None;
        let directory = tempfile::tempdir()?;
        write_folder(directory.path(), &self.starting_state)?;
        let output = code(directory.path());
        self.final_state = Some(read_folder(directory.path(), self.max_depth)?);
        Ok(output)
    }
}

fn write_folder(path: &Path, state: &FolderState) -> io::Result<()> {
    for (name, entry) in state {
        let entry_path = path.join(name);
        match entry {
            DirectoryEntry::File(contents) => fs::write(&entry_path, contents)?,
            DirectoryEntry::Binary(contents) => fs::write(&entry_path, contents)?,
            DirectoryEntry::Folder(nested) => {
                fs::create_dir(&entry_path)?;
                write_folder(&entry_path, nested)?;
            }
            DirectoryEntry::Unexplored => fs::create_dir(&entry_path)?,
        }
    }
    Ok(())
}

fn read_folder(path: &Path, max_depth: usize) -> io::Result<FolderState> {
    let mut state = FolderState::new();
    for item in fs::read_dir(path)? {
        let item = item?;
        let name = item.file_name().to_string_lossy().into_owned();
        let file_type = item.file_type()?;
        let entry = if file_type.is_dir() {
            if max_depth <= 1 {
                DirectoryEntry::Unexplored
            } else {
                DirectoryEntry::Folder(read_folder(&item.path(), max_depth - 1)?)
            }
        } else {
            let bytes = fs::read(item.path())?;
            match String::from_utf8(bytes) {
                Ok(text) => DirectoryEntry::File(text),
                Err(err) => {
                    let mut bytes = err.into_bytes();
                    bytes.truncate(BINARY_HEAD);
                    DirectoryEntry::Binary(bytes)
                }
            }
        };
        state.insert(name, entry);
    }
    Ok(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Simple wrapper
// ─────────────────────────────────────────────────────────────────────────────

/// Calls a resource directly, faking the build metadata and the directory.
pub struct SimpleTestResourceWrapper<R> {
    resource: R,
    build_metadata: BuildMetadata,
    directory: DirectoryState,
}

impl<R: Resource> SimpleTestResourceWrapper<R> {
    /// Wraps `resource` for a pipeline build with an empty directory.
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            build_metadata: BuildMetadata::for_testing(false, None),
            directory: DirectoryState::new(FolderState::new()),
        }
    }

    /// Seeds the directory passed to `in` and `out`.
    #[must_use]
    pub fn with_directory(mut self, starting_state: FolderState) -> Self {
        self.directory.set_starting_state(starting_state);
        self
    }

    /// Replaces the build metadata.
    #[must_use]
    pub fn with_build_metadata(mut self, build_metadata: BuildMetadata) -> Self {
        self.build_metadata = build_metadata;
        self
    }

    /// The wrapped resource.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// The directory contents after the last `in` or `out`.
    pub fn final_state(&self) -> Option<&FolderState> {
        self.directory.final_state()
    }

    /// Calls [`Resource::fetch_new_versions`].
    pub fn fetch_new_versions(
        &self,
        previous: Option<R::Version>,
    ) -> Result<Vec<R::Version>, ResourceError> {
        self.resource.fetch_new_versions(previous)
    }

    /// Calls [`Resource::download_version`] in a fresh directory.
    pub fn download_version(
        &mut self,
        version: R::Version,
        params: R::DownloadParams,
    ) -> Result<(R::Version, Metadata), ResourceError> {
        let Self {
            resource,
            build_metadata,
            directory,
        } = self;
        directory.run(|path| resource.download_version(version, path, build_metadata, params))?
    }

    /// Calls [`Resource::publish_new_version`] in a fresh directory.
    pub fn publish_new_version(
        &mut self,
        params: R::PublishParams,
    ) -> Result<(R::Version, Metadata), ResourceError> {
        let Self {
            resource,
            build_metadata,
            directory,
        } = self;
        directory.run(|path| resource.publish_new_version(path, build_metadata, params))?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON wrapper
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct InOutOutput {
    version: VersionConfig,
    #[serde(default)]
    metadata: Option<Vec<MetadataPair>>,
}

/// Drives a resource type through the same JSON dispatch Concourse uses.
///
/// `check` runs with an empty environment; `in` and `out` run with the
/// environment from [`create_env_vars`].
pub struct JsonTestResourceWrapper<T> {
    resource_type: T,
    config: ResourceConfig,
    environment: IndexMap<String, String>,
    directory: DirectoryState,
}

impl<T: ResourceType> JsonTestResourceWrapper<T> {
    /// Wraps `resource_type`, built from `config` on every call.
    pub fn new(resource_type: T, config: ResourceConfig) -> Self {
        Self {
            resource_type,
            config,
            environment: create_env_vars(false, None, None::<(String, String)>),
            directory: DirectoryState::new(FolderState::new()),
        }
    }

    /// Replaces the environment of `in` and `out`.
    #[must_use]
    pub fn with_environment(mut self, environment: IndexMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Seeds the directory passed to `in` and `out`.
    #[must_use]
    pub fn with_directory(mut self, starting_state: FolderState) -> Self {
        self.directory.set_starting_state(starting_state);
        self
    }

    /// The directory contents after the last `in` or `out`.
    pub fn final_state(&self) -> Option<&FolderState> {
        self.directory.final_state()
    }

    /// Runs `check`, returning the raw stdout document.
    pub fn check_output(&self, previous: Option<&VersionConfig>) -> Result<String, DispatchError> {
        let payload = wire::format_check_input(&self.config, previous);
        Dispatcher::with_env(None::<(String, String)>).check(&self.resource_type, &payload)
    }

    /// Runs `check`.
    pub fn fetch_new_versions(
        &self,
        previous: Option<&VersionConfig>,
    ) -> Result<Vec<VersionConfig>, DispatchError> {
        let output = self.check_output(previous)?;
        Ok(serde_json::from_str(&output).map_err(ParseError::from)?)
    }

    /// Runs `in`.
    pub fn download_version(
        &mut self,
        version: &VersionConfig,
        params: Option<&Params>,
    ) -> Result<(VersionConfig, Vec<MetadataPair>), DispatchError> {
        let payload = wire::format_in_input(&self.config, version, params);
        let dispatcher = Dispatcher::with_env(self.environment.clone());
        let resource_type = &self.resource_type;
        let output = self
            .directory
            .run(|path| dispatcher.download(resource_type, &payload, Some(path)))??;
        parse_in_out_output(&output)
    }

    /// Runs `out`.
    pub fn publish_new_version(
        &mut self,
        params: Option<&Params>,
    ) -> Result<(VersionConfig, Vec<MetadataPair>), DispatchError> {
        let payload = wire::format_out_input(&self.config, params);
        let dispatcher = Dispatcher::with_env(self.environment.clone());
        let resource_type = &self.resource_type;
        let output = self
            .directory
            .run(|path| dispatcher.publish(resource_type, &payload, Some(path)))??;
        parse_in_out_output(&output)
    }
}

fn parse_in_out_output(output: &str) -> Result<(VersionConfig, Vec<MetadataPair>), DispatchError> {
    let output: InOutOutput = serde_json::from_str(output).map_err(ParseError::from)?;
    Ok((output.version, output.metadata.unwrap_or_default()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion wrapper
// ─────────────────────────────────────────────────────────────────────────────

/// A [`JsonTestResourceWrapper`] with typed versions and metadata.
pub struct ConversionTestResourceWrapper<T> {
    inner: JsonTestResourceWrapper<T>,
}

impl<T: ResourceType> ConversionTestResourceWrapper<T> {
    /// Wraps `resource_type`, built from `config` on every call.
    pub fn new(resource_type: T, config: ResourceConfig) -> Self {
        Self {
            inner: JsonTestResourceWrapper::new(resource_type, config),
        }
    }

    /// Replaces the environment of `in` and `out`.
    #[must_use]
    pub fn with_environment(mut self, environment: IndexMap<String, String>) -> Self {
        self.inner = self.inner.with_environment(environment);
        self
    }

    /// Seeds the directory passed to `in` and `out`.
    #[must_use]
    pub fn with_directory(mut self, starting_state: FolderState) -> Self {
        self.inner = self.inner.with_directory(starting_state);
        self
    }

    /// The directory contents after the last `in` or `out`.
    pub fn final_state(&self) -> Option<&FolderState> {
        self.inner.final_state()
    }

    /// Runs `check`.
    pub fn fetch_new_versions(
        &self,
        previous: Option<&VersionOf<T>>,
    ) -> Result<Vec<VersionOf<T>>, DispatchError> {
        let previous = previous.map(Version::to_flat_dict);
        self.inner
            .fetch_new_versions(previous.as_ref())?
            .iter()
            .map(|config| <VersionOf<T>>::from_flat_dict(config).map_err(DispatchError::from))
            .collect()
    }

    /// Runs `in`.
    pub fn download_version(
        &mut self,
        version: &VersionOf<T>,
        params: Option<&Params>,
    ) -> Result<(VersionOf<T>, Metadata), DispatchError> {
        let (version, metadata) = self
            .inner
            .download_version(&version.to_flat_dict(), params)?;
        Ok((<VersionOf<T>>::from_flat_dict(&version)?, wire::parse_metadata(&metadata)))
    }

    /// Runs `out`.
    pub fn publish_new_version(
        &mut self,
        params: Option<&Params>,
    ) -> Result<(VersionOf<T>, Metadata), DispatchError> {
        let (version, metadata) = self.inner.publish_new_version(params)?;
        Ok((<VersionOf<T>>::from_flat_dict(&version)?, wire::parse_metadata(&metadata)))
    }
}
