//! Temporary redirection of stdout to stderr.
//!
//! The result of a resource script is the only thing Concourse reads from
//! stdout. While resource code runs, anything it writes to stdout, from
//! `println!` or from a child process inheriting the descriptor, is sent to
//! stderr instead so it cannot corrupt the result.
//!
//! Redirection works on file descriptors and is only available on Unix. On
//! other platforms the guard does nothing.

use std::io::{self, Write};

/// Sends stdout to stderr until dropped.
///
/// Redirection is process-wide. Guards must not overlap across threads.
#[derive(Debug)]
#[must_use = "stdout is restored as soon as the guard is dropped"]
pub struct StdoutRedirect {
    #[cfg(unix)]
    saved: libc::c_int,
}

impl StdoutRedirect {
    /// Redirects stdout to stderr.
    ///
    /// Buffered stdout is flushed first, so earlier output keeps its place.
    pub fn to_stderr() -> io::Result<Self> {
        io::stdout().flush()?;

        #[cfg(unix)]
        {
            // SAFETY: `dup` has no memory-safety preconditions; failure is
            // reported through the return value, which is checked.
            let saved = unsafe { libc::dup(libc::STDOUT_FILENO) };
            if saved < 0 {
                return Err(io::Error::last_os_error());
            }
            // SAFETY: both descriptors are valid; `dup2` atomically replaces
            // descriptor 1 and reports failure through its return value.
            if unsafe { libc::dup2(libc::STDERR_FILENO, libc::STDOUT_FILENO) } < 0 {
                let error = io::Error::last_os_error();
                // SAFETY: `saved` was returned by `dup` above and is not used
                // after this point.
                unsafe { libc::close(saved) };
                return Err(error);
            }
            tracing::trace!("stdout redirected to stderr");
            Ok(Self { saved })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }
}

impl Drop for StdoutRedirect {
    fn drop(&mut self) {
        // Flush into stderr before the descriptor changes back.
        let _ = io::stdout().flush();

        #[cfg(unix)]
        {
            // SAFETY: `saved` is the descriptor duplicated in `to_stderr`,
            // owned by this guard and closed exactly once here.
            unsafe {
                libc::dup2(self.saved, libc::STDOUT_FILENO);
                libc::close(self.saved);
            }
            tracing::trace!("stdout restored");
        }
    }
}
