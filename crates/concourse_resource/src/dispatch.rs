//! Running `check`, `in` and `out` against a resource type.
//!
//! A [`Dispatcher`] turns a raw payload into calls on a [`Resource`] and the
//! result back into the JSON Concourse expects. The `*_main` functions wrap
//! it into complete script entry points that read stdin, write stdout and
//! log failures to stderr.
//!
//! ```no_run
//! use concourse_resource::{ResourceClass, dispatch};
//! # use concourse_resource::{BuildMetadata, Metadata, NoParams, Resource, ResourceError};
//! # use std::path::Path;
//! # #[derive(Debug, Clone, concourse_version::Version)]
//! # struct Commit { sha: String }
//! # #[derive(serde::Deserialize)]
//! # struct Repository {}
//! # impl Resource for Repository {
//! #     type Version = Commit;
//! #     type DownloadParams = NoParams;
//! #     type PublishParams = NoParams;
//! #     fn fetch_new_versions(&self, _: Option<Commit>) -> Result<Vec<Commit>, ResourceError> { Ok(vec![]) }
//! #     fn download_version(&self, v: Commit, _: &Path, _: &BuildMetadata, _: NoParams) -> Result<(Commit, Metadata), ResourceError> { Ok((v, Metadata::new())) }
//! #     fn publish_new_version(&self, _: &Path, _: &BuildMetadata, _: NoParams) -> Result<(Commit, Metadata), ResourceError> { Err(ResourceError::PublishNotPermitted) }
//! # }
//!
//! fn main() -> std::process::ExitCode {
//!     // Installed as /opt/resource/check, /opt/resource/in and /opt/resource/out.
//!     dispatch::main(&ResourceClass::<Repository>::new())
//! }
//! ```

use crate::error::{DispatchError, MetadataError};
use crate::logging::TracingConfig;
use crate::metadata::BuildMetadata;
use crate::redirect::StdoutRedirect;
use crate::resource::{Resource, ResourceType, VersionOf};
use crate::wire;
use concourse_version::Version;
use serde_json::Value;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, info_span};

// ─────────────────────────────────────────────────────────────────────────────
// Operation
// ─────────────────────────────────────────────────────────────────────────────

/// One of the three resource scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `check`: discover versions.
    Check,
    /// `in`: download a version.
    In,
    /// `out`: publish a version.
    Out,
}

impl Operation {
    /// The script name Concourse invokes.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::In => "in",
            Self::Out => "out",
        }
    }

    /// Determines the operation from the path a program was invoked by.
    ///
    /// Only the final path component counts, so `/opt/resource/in` is
    /// [`Operation::In`].
    #[must_use]
    pub fn from_program(program: &OsStr) -> Option<Self> {
        match Path::new(program).file_name()?.to_str()? {
            "check" => Some(Self::Check),
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            _ => None,
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Runs resource operations on raw payloads.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    environment: Option<HashMap<String, String>>,
    redirect_stdout: bool,
}

impl Dispatcher {
    /// A dispatcher for a real script run.
    ///
    /// Build metadata is read from the process environment, and stdout is
    /// redirected to stderr while resource code runs.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            environment: None,
            redirect_stdout: true,
        }
    }

    /// A dispatcher that reads build metadata from `environment` and leaves
    /// stdout alone.
    #[must_use]
    pub fn with_env<K, V>(environment: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            environment: Some(
                environment
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
            redirect_stdout: false,
        }
    }

    /// Sets whether stdout is redirected to stderr while resource code runs.
    #[must_use]
    pub fn with_redirect_stdout(mut self, redirect: bool) -> Self {
        self.redirect_stdout = redirect;
        self
    }

    fn build_metadata(&self) -> Result<BuildMetadata, MetadataError> {
        match &self.environment {
            Some(environment) => BuildMetadata::from_lookup(|key| environment.get(key).cloned()),
            None => BuildMetadata::from_env(),
        }
    }

    fn run_resource_code<T>(&self, code: impl FnOnce() -> T) -> io::Result<T> {
        if self.redirect_stdout {
            let _redirect = StdoutRedirect::to_stderr()?;
            Ok(code())
        } else {
            Ok(code())
        }
    }

    /// Runs `operation` on `payload`.
    ///
    /// `argument` is the directory passed on the command line, required by
    /// `in` and `out` and ignored by `check`.
    pub fn dispatch<T: ResourceType>(
        &self,
        resource_type: &T,
        operation: Operation,
        payload: &str,
        argument: Option<&Path>,
    ) -> Result<String, DispatchError> {
        match operation {
            Operation::Check => self.check(resource_type, payload),
            Operation::In => self.download(resource_type, payload, argument),
            Operation::Out => self.publish(resource_type, payload, argument),
        }
    }

    /// Runs `check`: returns the new versions as a JSON list.
    pub fn check<T: ResourceType>(
        &self,
        resource_type: &T,
        payload: &str,
    ) -> Result<String, DispatchError> {
        let _span = info_span!("check").entered();
        let (source, previous) = wire::parse_check_payload(payload)?;
        debug!(
            source_keys = ?source.keys().collect::<Vec<_>>(),
            first_check = previous.is_none(),
            "parsed check payload"
        );

        let resource = resource_type.from_resource_config(source)?;
        let previous = previous
            .as_ref()
            .map(<VersionOf<T>>::from_flat_dict)
            .transpose()?;

        let versions = self.run_resource_code(|| resource.fetch_new_versions(previous))??;
        info!(count = versions.len(), "fetched new versions");

        let versions: Vec<_> = versions.iter().map(Version::to_flat_dict).collect();
        Ok(wire::format_check_output(&versions))
    }

    /// Runs `in`: downloads the requested version into `destination`.
    pub fn download<T: ResourceType>(
        &self,
        resource_type: &T,
        payload: &str,
        destination: Option<&Path>,
    ) -> Result<String, DispatchError> {
        let _span = info_span!("in").entered();
        let destination = destination.ok_or_else(|| {
            DispatchError::Usage(
                "the path to the destination directory must be passed on the command line".into(),
            )
        })?;
        let (source, version, params) = wire::parse_in_payload(payload)?;
        debug!(
            source_keys = ?source.keys().collect::<Vec<_>>(),
            param_keys = ?params.keys().collect::<Vec<_>>(),
            destination = %destination.display(),
            "parsed in payload"
        );

        let resource = resource_type.from_resource_config(source)?;
        let version = <VersionOf<T>>::from_flat_dict(&version)?;
        let params = serde_json::from_value(Value::Object(params)).map_err(DispatchError::Params)?;
        let build_metadata = self.build_metadata()?;

        let (version, metadata) = self.run_resource_code(|| {
            resource.download_version(version, destination, &build_metadata, params)
        })??;
        info!(metadata = metadata.len(), "downloaded version");

        Ok(wire::format_in_out_output(&version.to_flat_dict(), &metadata))
    }

    /// Runs `out`: publishes a new version from `sources`.
    pub fn publish<T: ResourceType>(
        &self,
        resource_type: &T,
        payload: &str,
        sources: Option<&Path>,
    ) -> Result<String, DispatchError> {
        let _span = info_span!("out").entered();
        let sources = sources.ok_or_else(|| {
            DispatchError::Usage(
                "the path to the build's sources directory must be passed on the command line"
                    .into(),
            )
        })?;
        let (source, params) = wire::parse_out_payload(payload)?;
        debug!(
            source_keys = ?source.keys().collect::<Vec<_>>(),
            param_keys = ?params.keys().collect::<Vec<_>>(),
            sources = %sources.display(),
            "parsed out payload"
        );

        let resource = resource_type.from_resource_config(source)?;
        let params = serde_json::from_value(Value::Object(params)).map_err(DispatchError::Params)?;
        let build_metadata = self.build_metadata()?;

        let (version, metadata) = self.run_resource_code(|| {
            resource.publish_new_version(sources, &build_metadata, params)
        })??;
        info!(metadata = metadata.len(), "published new version");

        Ok(wire::format_in_out_output(&version.to_flat_dict(), &metadata))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Entry point for a `check` script.
pub fn check_main<T: ResourceType>(resource_type: &T) -> ExitCode {
    run(resource_type, Operation::Check)
}

/// Entry point for an `in` script.
pub fn in_main<T: ResourceType>(resource_type: &T) -> ExitCode {
    run(resource_type, Operation::In)
}

/// Entry point for an `out` script.
pub fn out_main<T: ResourceType>(resource_type: &T) -> ExitCode {
    run(resource_type, Operation::Out)
}

/// Entry point for a single binary installed under all three script names.
///
/// The operation is chosen by the name the program was invoked by.
pub fn main<T: ResourceType>(resource_type: &T) -> ExitCode {
    let program = std::env::args_os().next();
    match program.as_deref().and_then(Operation::from_program) {
        Some(operation) => run(resource_type, operation),
        None => {
            TracingConfig::from_env().init();
            error!(
                program = ?program,
                "cannot tell which operation to run: invoke this program as 'check', 'in' or 'out'"
            );
            ExitCode::FAILURE
        }
    }
}

fn run<T: ResourceType>(resource_type: &T, operation: Operation) -> ExitCode {
    TracingConfig::from_env().init();
    match execute(resource_type, operation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%operation, "{err}");
            ExitCode::FAILURE
        }
    }
}

fn execute<T: ResourceType>(resource_type: &T, operation: Operation) -> Result<(), DispatchError> {
    let mut payload = String::new();
    io::stdin().read_to_string(&mut payload)?;
    let argument = std::env::args_os().nth(1).map(PathBuf::from);

    let output = Dispatcher::from_process().dispatch(
        resource_type,
        operation,
        &payload,
        argument.as_deref(),
    )?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}
