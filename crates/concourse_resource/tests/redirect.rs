//! Stdout redirection while resource code runs.
//!
//! Redirection swaps process-wide file descriptors, so everything lives in
//! a single test in its own binary.

#![cfg(unix)]

use concourse_resource::redirect::StdoutRedirect;
use concourse_resource::{
    BuildMetadata, Dispatcher, Metadata, NoParams, Resource, ResourceClass, ResourceError,
};
use concourse_version::Version;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;
use std::path::Path;

#[derive(Debug, Clone, Version)]
struct Tick {
    n: u32,
}

#[derive(Deserialize)]
struct Chatty {}

impl Resource for Chatty {
    type Version = Tick;
    type DownloadParams = NoParams;
    type PublishParams = NoParams;

    fn fetch_new_versions(&self, previous: Option<Tick>) -> Result<Vec<Tick>, ResourceError> {
        if previous.is_some() {
            io::stdout().write_all(b"failing check\n")?;
            return Err(ResourceError::other("upstream is down"));
        }
        io::stdout().write_all(b"debugging from check\n")?;
        Ok(vec![Tick { n: 1 }])
    }

    fn download_version(
        &self,
        version: Tick,
        _destination_dir: &Path,
        _build_metadata: &BuildMetadata,
        _params: NoParams,
    ) -> Result<(Tick, Metadata), ResourceError> {
        Ok((version, Metadata::new()))
    }

    fn publish_new_version(
        &self,
        _sources_dir: &Path,
        _build_metadata: &BuildMetadata,
        _params: NoParams,
    ) -> Result<(Tick, Metadata), ResourceError> {
        Err(ResourceError::PublishNotPermitted)
    }
}

/// Points descriptors 1 and 2 at files for the lifetime of the guard.
struct Captured {
    stdout: File,
    stderr: File,
    saved_stdout: libc::c_int,
    saved_stderr: libc::c_int,
}

impl Captured {
    fn start() -> Self {
        let stdout = tempfile::tempfile().unwrap();
        let stderr = tempfile::tempfile().unwrap();
        io::stdout().flush().unwrap();
        // SAFETY: descriptors 1 and 2 and both temporary files are open for
        // the duration of these calls.
        let (saved_stdout, saved_stderr) = unsafe {
            let saved = (libc::dup(1), libc::dup(2));
            libc::dup2(stdout.as_raw_fd(), 1);
            libc::dup2(stderr.as_raw_fd(), 2);
            saved
        };
        Self {
            stdout,
            stderr,
            saved_stdout,
            saved_stderr,
        }
    }

    fn finish(mut self) -> (String, String) {
        io::stdout().flush().unwrap();
        // SAFETY: the saved descriptors were duplicated in `start` and are
        // closed exactly once here.
        unsafe {
            libc::dup2(self.saved_stdout, 1);
            libc::dup2(self.saved_stderr, 2);
            libc::close(self.saved_stdout);
            libc::close(self.saved_stderr);
        }
        (read_all(&mut self.stdout), read_all(&mut self.stderr))
    }
}

fn read_all(file: &mut File) -> String {
    file.seek(SeekFrom::Start(0)).unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    contents
}

#[test]
fn resource_output_never_reaches_stdout() {
    let captured = Captured::start();

    let redirect = StdoutRedirect::to_stderr().unwrap();
    io::stdout().write_all(b"hidden\n").unwrap();
    drop(redirect);
    io::stdout().write_all(b"visible\n").unwrap();

    let output = Dispatcher::from_process()
        .check(&ResourceClass::<Chatty>::new(), r#"{"source": {}}"#)
        .unwrap();
    io::stdout().write_all(output.as_bytes()).unwrap();

    let failed = Dispatcher::from_process().check(
        &ResourceClass::<Chatty>::new(),
        r#"{"source": {}, "version": {"n": "1"}}"#,
    );
    io::stdout().write_all(b"\nafter failure\n").unwrap();

    let (stdout, stderr) = captured.finish();
    assert!(failed.is_err());
    assert_eq!(stdout, "visible\n[{\"n\": \"1\"}]\nafter failure\n");
    assert_eq!(stderr, "hidden\ndebugging from check\nfailing check\n");
}
