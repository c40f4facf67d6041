//! # Concourse Tools Internal Library
//!
//! Re-exports the layered `concourse_tools` crates for convenience.

/// Layer 1: flat encoding of values into string dictionaries.
pub use concourse_flat;

/// Layer 2: resource versions, their identity and their ordering.
pub use concourse_version;

/// Layer 3: the `check`/`in`/`out` lifecycle and reusable patterns.
pub use concourse_resource;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use concourse_resource::patterns::{
        CombinedResourceType, InOnly, InOnlyResource, MultiVersionDownloadParams,
        MultiVersionResource, MultiVersioned, OutOnly, OutOnlyResource, SelfOrganising,
        SelfOrganisingResource, TriggerOnChange, TriggerOnChangeResource,
    };
    pub use concourse_resource::{
        BuildMetadata, ConfigError, DispatchError, Dispatcher, Metadata, NoParams, Operation,
        Resource, ResourceClass, ResourceConfig, ResourceError, ResourceType,
    };
    pub use concourse_version::{
        DatetimeVersion, FlatEnum, MultiVersion, SortableVersion, TypedVersion, Version,
        VersionConfig, VersionKey,
    };
}
