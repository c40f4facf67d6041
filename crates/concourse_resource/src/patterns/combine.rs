//! Multiplexing several resource types behind one.

use crate::error::ConfigError;
use crate::resource::{DynResource, Resource, ResourceType, VersionOf};
use crate::wire::{self, ResourceConfig};
use concourse_version::Version;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// The source key that selects a resource unless configured otherwise.
pub const DEFAULT_PARAM_KEY: &str = "resource";

/// A [`ResourceType`] with its resource erased behind [`DynResource`].
pub trait DynResourceType<V> {
    /// Builds the erased resource from its source configuration.
    fn build(&self, config: ResourceConfig) -> Result<Box<dyn DynResource<V>>, ConfigError>;
}

impl<T> DynResourceType<VersionOf<T>> for T
where
    T: ResourceType,
    T::Resource: 'static,
{
    fn build(
        &self,
        config: ResourceConfig,
    ) -> Result<Box<dyn DynResource<VersionOf<T>>>, ConfigError> {
        let resource = self.from_resource_config(config)?;
        Ok(Box::new(resource))
    }
}

/// Several resource types sharing a version type, selected per pipeline by
/// a key in the source.
///
/// ```yaml
/// resource_types:
/// - name: artifacts
///   source: {repository: example/artifacts}
/// resources:
/// - name: release-notes
///   type: artifacts
///   source: {resource: notes, bucket: releases}
/// ```
///
/// The selector key is removed before the chosen type sees the source.
pub struct CombinedResourceType<V> {
    param_key: String,
    resource_types: IndexMap<String, Box<dyn DynResourceType<V>>>,
}

impl<V: Version> CombinedResourceType<V> {
    /// Creates an empty combination selected by [`DEFAULT_PARAM_KEY`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            param_key: DEFAULT_PARAM_KEY.to_owned(),
            resource_types: IndexMap::new(),
        }
    }

    /// Uses `key` to select the resource type.
    #[must_use]
    pub fn with_param_key(mut self, key: impl Into<String>) -> Self {
        self.param_key = key.into();
        self
    }

    /// Registers `resource_type` under `name`, replacing any previous one.
    #[must_use]
    pub fn with_resource<T>(mut self, name: impl Into<String>, resource_type: T) -> Self
    where
        T: ResourceType + 'static,
        T::Resource: Resource<Version = V> + 'static,
    {
        self.resource_types
            .insert(name.into(), Box::new(resource_type));
        self
    }

    /// The selector key.
    #[must_use]
    pub fn param_key(&self) -> &str {
        &self.param_key
    }

    /// The registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resource_types.keys().map(String::as_str)
    }
}

impl<V: Version> Default for CombinedResourceType<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> core::fmt::Debug for CombinedResourceType<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombinedResourceType")
            .field("param_key", &self.param_key)
            .field("resource_types", &self.resource_types.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<V: Version> ResourceType for CombinedResourceType<V> {
    type Resource = Box<dyn DynResource<V>>;

    fn from_resource_config(
        &self,
        mut config: ResourceConfig,
    ) -> Result<Self::Resource, ConfigError> {
        let selector = config
            .remove(&self.param_key)
            .ok_or_else(|| ConfigError::MissingFlag {
                key: self.param_key.clone(),
            })?;
        let name = match selector {
            Value::String(name) => name,
            other => wire::to_wire_string(&other),
        };

        let Some(resource_type) = self.resource_types.get(&name) else {
            return Err(ConfigError::UnknownResource {
                requested: name,
                available: self.names().map(str::to_owned).collect(),
            });
        };
        debug!(resource = %name, "selected combined resource");
        resource_type.build(config)
    }
}
