//! Write Concourse CI resource types as ordinary Rust traits.
//!
//! The layer crates are re-exported under their own names:
//! [`concourse_flat`] encodes values as strings, [`concourse_version`]
//! defines versions and [`concourse_resource`] runs `check`, `in` and
//! `out`. Most resources only need the [`prelude`].

pub use concourse_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use concourse_internal::prelude::*;
}
