//! The `file-set` resource type.
//!
//! One binary serves all three scripts. Install it as `/opt/resource/check`
//! and link `in` and `out` to it; the operation is picked from the name
//! the program was invoked as.
//!
//! ```bash
//! echo '{"source": {"directory": "/mnt/reports"}}' | /opt/resource/check
//! ```

use concourse_resource::{ResourceClass, dispatch};
use example::FileSetResource;
use std::process::ExitCode;

fn main() -> ExitCode {
    dispatch::main(&ResourceClass::<FileSetResource>::new())
}
