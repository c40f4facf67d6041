//! Reusable shapes of resource.
//!
//! Many resources only need part of the [`Resource`](crate::Resource)
//! contract, or implement it in a well-known way. Each pattern here is a
//! wrapper that implements `Resource` in terms of a narrower trait:
//!
//! | Wrapper | Author implements | Behaviour |
//! |---------|-------------------|-----------|
//! | [`OutOnly`] | [`OutOnlyResource`] | `check` finds nothing, `in` does nothing |
//! | [`InOnly`] | [`InOnlyResource`] | `check` finds nothing, `out` stamps the time |
//! | [`TriggerOnChange`] | [`TriggerOnChangeResource`] | emits the latest version when it changes |
//! | [`SelfOrganising`] | [`SelfOrganisingResource`] | orders every version itself |
//! | [`MultiVersioned`] | [`MultiVersionResource`] | tracks a set of sub-versions as one version |
//!
//! Wrappers are transparent to serde, so `ResourceClass<OutOnly<Notify>>`
//! builds the wrapped resource straight from the source configuration.
//!
//! [`CombinedResourceType`] multiplexes several resource types that share a
//! version type behind one source key.

mod combine;
mod in_only;
mod multi;
mod out_only;
mod self_organising;
mod trigger;

pub use combine::{CombinedResourceType, DEFAULT_PARAM_KEY, DynResourceType};
pub use in_only::{InOnly, InOnlyResource};
pub use multi::{
    MultiVersionDownloadParams, MultiVersionResource, MultiVersioned, write_sub_versions,
};
pub use out_only::{OutOnly, OutOnlyResource};
pub use self_organising::{SelfOrganising, SelfOrganisingResource, organise};
pub use trigger::{TriggerOnChange, TriggerOnChangeResource, trigger_on_change};
