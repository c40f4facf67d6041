//! Per-type codec registries.
//!
//! A [`CodecRegistry`] maps [`TypeKey`]s to flatten and un-flatten
//! functions. Lookups walk a type's chain (see [`type_chain`]) and return the
//! first registered function, so a codec registered for a family covers every
//! member that has no entry of its own.
//!
//! Registries are plain values. [`CodecRegistry::standard`] holds the
//! built-in codecs and is never mutated; a version type that needs more
//! codecs derives its own registry from it:
//!
//! ```
//! use concourse_flat::{CodecRegistry, FlatError};
//! use std::path::PathBuf;
//! use std::sync::LazyLock;
//!
//! static CODECS: LazyLock<CodecRegistry> = LazyLock::new(|| {
//!     CodecRegistry::standard()
//!         .derive()
//!         .with_flatten(|path: &PathBuf| path.display().to_string().replace('\\', "/"))
//! });
//!
//! assert_eq!(CODECS.flatten(&PathBuf::from("a/b")), "a/b");
//! assert_eq!(CODECS.flatten(&false), "False");
//! ```

use crate::builtins;
use crate::error::FlatError;
use crate::flat::{Flat, FlatObject, Target, type_chain};
use crate::key::TypeKey;
use core::any::Any;
use hashbrown::HashMap;
use std::sync::{Arc, LazyLock};

/// A registered flatten function.
///
/// Returns `None` when handed a value it cannot encode, which makes the
/// lookup continue down the chain.
pub type FlattenFn = Arc<dyn Fn(&dyn FlatObject) -> Option<String> + Send + Sync>;

/// A registered un-flatten function.
pub type UnflattenFn =
    Arc<dyn Fn(&Target, &str) -> Result<Box<dyn Any>, FlatError> + Send + Sync>;

static STANDARD: LazyLock<CodecRegistry> = LazyLock::new(CodecRegistry::with_builtins);

/// Registry of flatten and un-flatten functions keyed by type.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    flatten: HashMap<TypeKey, FlattenFn>,
    unflatten: HashMap<TypeKey, UnflattenFn>,
}

impl core::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut flatten: Vec<_> = self.flatten.keys().map(TypeKey::name).collect();
        let mut unflatten: Vec<_> = self.unflatten.keys().map(TypeKey::name).collect();
        flatten.sort_unstable();
        unflatten.sort_unstable();
        f.debug_struct("CodecRegistry")
            .field("flatten", &flatten)
            .field("unflatten", &unflatten)
            .finish()
    }
}

impl CodecRegistry {
    /// Creates an empty registry. Every lookup falls back to the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in codecs.
    ///
    /// | Type | Flatten | Un-flatten |
    /// |------|---------|------------|
    /// | `bool` | `"True"` / `"False"` | exact match on `"True"` / `"False"` |
    /// | `DateTime<Utc>` | Unix timestamp in whole seconds | from the timestamp |
    /// | [`TypeKey::enumeration`] | member name | member lookup by name |
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register(&mut registry);
        registry
    }

    /// The shared, immutable registry of built-in codecs.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Returns an independent copy of this registry.
    ///
    /// Registrations on the copy never leak back into the parent.
    #[must_use]
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Registers a flatten function for `T`.
    ///
    /// `T` is inferred from the parameter type of `func`.
    pub fn register_flatten<T, F>(&mut self, func: F) -> &mut Self
    where
        T: Flat,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let erased: FlattenFn =
            Arc::new(move |value: &dyn FlatObject| value.as_any().downcast_ref::<T>().map(&func));
        self.flatten.insert(TypeKey::of::<T>(), erased);
        self
    }

    /// Registers an un-flatten function for `T`.
    ///
    /// `T` is inferred from the return type of `func`.
    pub fn register_unflatten<T, F>(&mut self, func: F) -> &mut Self
    where
        T: Flat,
        F: Fn(&str) -> Result<T, FlatError> + Send + Sync + 'static,
    {
        let erased: UnflattenFn = Arc::new(move |_target: &Target, flat: &str| {
            func(flat).map(|value| Box::new(value) as Box<dyn Any>)
        });
        self.unflatten.insert(TypeKey::of::<T>(), erased);
        self
    }

    /// Registers a flatten function for every type whose chain contains `family`.
    pub fn register_family_flatten<F>(&mut self, family: TypeKey, func: F) -> &mut Self
    where
        F: Fn(&dyn FlatObject) -> Option<String> + Send + Sync + 'static,
    {
        self.flatten.insert(family, Arc::new(func));
        self
    }

    /// Registers an un-flatten function for every type whose chain contains `family`.
    ///
    /// The function receives the concrete [`Target`] so it can build the
    /// right member type.
    pub fn register_family_unflatten<F>(&mut self, family: TypeKey, func: F) -> &mut Self
    where
        F: Fn(&Target, &str) -> Result<Box<dyn Any>, FlatError> + Send + Sync + 'static,
    {
        self.unflatten.insert(family, Arc::new(func));
        self
    }

    /// Builder form of [`register_flatten`](Self::register_flatten).
    #[must_use]
    pub fn with_flatten<T, F>(mut self, func: F) -> Self
    where
        T: Flat,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.register_flatten(func);
        self
    }

    /// Builder form of [`register_unflatten`](Self::register_unflatten).
    #[must_use]
    pub fn with_unflatten<T, F>(mut self, func: F) -> Self
    where
        T: Flat,
        F: Fn(&str) -> Result<T, FlatError> + Send + Sync + 'static,
    {
        self.register_unflatten(func);
        self
    }

    /// Returns the first flatten function registered along `chain`.
    #[must_use]
    pub fn flatten_function(&self, chain: &[TypeKey]) -> Option<&FlattenFn> {
        chain.iter().find_map(|key| self.flatten.get(key))
    }

    /// Returns the first un-flatten function registered along `chain`, with
    /// the key it was found under.
    #[must_use]
    pub fn unflatten_function(&self, chain: &[TypeKey]) -> Option<(TypeKey, &UnflattenFn)> {
        chain
            .iter()
            .find_map(|key| self.unflatten.get(key).map(|func| (*key, func)))
    }

    /// Flattens `value`, using the most specific registered function or the
    /// type's default encoding.
    #[must_use]
    pub fn flatten<T: Flat>(&self, value: &T) -> String {
        type_chain::<T>()
            .iter()
            .filter_map(|key| self.flatten.get(key))
            .find_map(|func| func(value as &dyn FlatObject))
            .unwrap_or_else(|| value.flatten_default())
    }

    /// Un-flattens `flat` into a `T`, using the most specific registered
    /// function or the type's default decoding.
    pub fn unflatten<T: Flat>(&self, flat: &str) -> Result<T, FlatError> {
        let chain = type_chain::<T>();
        let Some((key, func)) = self.unflatten_function(&chain) else {
            return T::unflatten_default(flat);
        };

        let value = func(&Target::of::<T>(), flat)?;
        value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| FlatError::TypeMismatch {
                registered: key.name(),
                expected: core::any::type_name::<T>(),
            })
    }

    /// Returns `true` if a flatten function is registered exactly under `key`.
    #[must_use]
    pub fn has_flatten(&self, key: TypeKey) -> bool {
        self.flatten.contains_key(&key)
    }

    /// Returns `true` if an un-flatten function is registered exactly under `key`.
    #[must_use]
    pub fn has_unflatten(&self, key: TypeKey) -> bool {
        self.unflatten.contains_key(&key)
    }
}
