//! Path resolution for code generated by the `concourse_version` derives.
//!
//! Generated impls name `Version`, `Flat` and friends by absolute path. A
//! resource crate may depend on `concourse_version` directly, under a
//! renamed key, or only through the `concourse_tools` umbrella, and the
//! emitted path has to resolve in each case.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::quote;

const VERSION_CRATE: &str = "concourse_version";
const UMBRELLA_CRATE: &str = "concourse_tools";

/// How the crate being compiled reaches `concourse_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPath {
    /// The derive runs inside `concourse_version` or its own tests, where
    /// the crate is reachable under its own name.
    Local,
    /// A direct dependency under the given, possibly renamed, name.
    Direct(String),
    /// The re-export inside the umbrella crate under the given name.
    Umbrella(String),
}

impl VersionPath {
    /// Reads the manifest of the crate being compiled.
    ///
    /// Without either dependency the plain crate name is used, so the
    /// compiler reports the unresolved path at the derive site.
    #[must_use]
    pub fn find() -> Self {
        match crate_name(VERSION_CRATE) {
            Ok(FoundCrate::Itself) => Self::Local,
            Ok(FoundCrate::Name(name)) => Self::Direct(name),
            Err(_) => match crate_name(UMBRELLA_CRATE) {
                Ok(FoundCrate::Name(name)) => Self::Umbrella(name),
                _ => Self::Direct(VERSION_CRATE.to_owned()),
            },
        }
    }

    /// The path as tokens, usable as a prefix such as `#path::Version`.
    #[must_use]
    pub fn to_tokens(&self) -> TokenStream {
        match self {
            Self::Local => ident(VERSION_CRATE),
            Self::Direct(name) => ident(name),
            Self::Umbrella(umbrella) => {
                let umbrella = ident(umbrella);
                let version = ident(VERSION_CRATE);
                quote!(#umbrella::#version)
            }
        }
    }
}

fn ident(name: &str) -> TokenStream {
    let ident = proc_macro2::Ident::new(name, Span::call_site());
    quote!(#ident)
}

/// The path generated code uses for `concourse_version`.
#[must_use]
pub fn version_crate_path() -> TokenStream {
    VersionPath::find().to_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_and_direct_paths_are_single_segments() {
        assert_eq!(VersionPath::Local.to_tokens().to_string(), "concourse_version");
        assert_eq!(
            VersionPath::Direct("versions".to_owned()).to_tokens().to_string(),
            "versions"
        );
    }

    #[test]
    fn umbrella_path_goes_through_the_re_export() {
        let path = VersionPath::Umbrella("tools".to_owned()).to_tokens();
        assert_eq!(path.to_string(), "tools :: concourse_version");
    }
}
