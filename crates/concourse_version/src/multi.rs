//! A version made of a set of sub-versions.
//!
//! [`MultiVersion`] tracks "the current set" of something (open pull
//! requests, files in a bucket) as a single version. The set is stored under
//! one key as a JSON list of flat sub-versions:
//!
//! ```text
//! {"versions": "[{\"name\": \"a.txt\"}, {\"name\": \"b.txt\"}]"}
//! ```
//!
//! The list is sorted before encoding, so equal sets always produce the same
//! bytes. Sorting needs [`SortableVersion`] + [`Ord`] on the sub-version, and
//! the bound is checked at compile time; decoding with
//! [`MultiVersion::parse`] does not need it.

use crate::sortable::SortableVersion;
use crate::version::{Version, VersionConfig, sorted_pairs};
use concourse_flat::FlatError;
use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use std::collections::HashSet;

/// Names the key a [`MultiVersion`] is stored under.
pub trait VersionKey: 'static {
    /// The flat key.
    const KEY: &'static str;
}

/// The default key, `"versions"`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultKey;

impl VersionKey for DefaultKey {
    const KEY: &'static str = "versions";
}

/// Declares a [`VersionKey`] marker type.
///
/// ```
/// use concourse_version::{VersionKey, version_key};
///
/// version_key!(pub PullRequests = "pull_requests");
/// assert_eq!(PullRequests::KEY, "pull_requests");
/// ```
#[macro_export]
macro_rules! version_key {
    ($vis:vis $name:ident = $key:literal) => {
        #[doc = concat!("Stores a multi-version under `", $key, "`.")]
        #[derive(Debug, Clone, Copy)]
        $vis struct $name;

        impl $crate::VersionKey for $name {
            const KEY: &'static str = $key;
        }
    };
}

/// A set of sub-versions tracked as one version.
pub struct MultiVersion<V, K = DefaultKey> {
    versions: HashSet<V>,
    key: PhantomData<fn() -> K>,
}

impl<V: Version, K: VersionKey> MultiVersion<V, K> {
    /// Wraps a set of sub-versions.
    pub fn new(versions: impl IntoIterator<Item = V>) -> Self {
        Self {
            versions: versions.into_iter().collect(),
            key: PhantomData,
        }
    }

    /// The key the set is stored under.
    #[must_use]
    pub fn key() -> &'static str {
        K::KEY
    }

    /// The sub-versions, in no particular order.
    #[must_use]
    pub fn versions(&self) -> &HashSet<V> {
        &self.versions
    }

    /// Consumes the wrapper, returning the set.
    #[must_use]
    pub fn into_versions(self) -> HashSet<V> {
        self.versions
    }

    /// Number of sub-versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Decodes a flattened multi-version.
    ///
    /// Keys other than [`Self::key`] are ignored.
    pub fn parse(config: &VersionConfig) -> Result<Self, FlatError> {
        let encoded = config
            .get(K::KEY)
            .ok_or_else(|| FlatError::missing_field::<Self>(K::KEY))?;
        let entries: Vec<VersionConfig> = serde_json::from_str(encoded)?;
        let versions = entries
            .iter()
            .map(V::from_flat_dict)
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self::new(versions))
    }
}

impl<V, K> MultiVersion<V, K>
where
    V: SortableVersion + Ord,
    K: VersionKey,
{
    /// The flattened sub-versions, in their natural order.
    #[must_use]
    pub fn sub_version_data(&self) -> Vec<VersionConfig> {
        let mut ordered: Vec<&V> = self.versions.iter().collect();
        ordered.sort_by(|left, right| {
            left.cmp(right)
                .then_with(|| sorted_pairs(*left).cmp(&sorted_pairs(*right)))
        });
        ordered
            .into_iter()
            .map(|version| version.to_flat_dict())
            .collect()
    }
}

impl<V, K> Version for MultiVersion<V, K>
where
    V: SortableVersion + Ord,
    K: VersionKey,
{
    fn to_flat_dict(&self) -> VersionConfig {
        let entries = self
            .sub_version_data()
            .into_iter()
            .map(|config| {
                serde_json::Value::Object(
                    config
                        .into_iter()
                        .map(|(key, value)| (key, serde_json::Value::String(value)))
                        .collect(),
                )
            })
            .collect();
        let encoded = concourse_flat::json::encode(&serde_json::Value::Array(entries));
        VersionConfig::from([(K::KEY.to_owned(), encoded)])
    }

    fn from_flat_dict(config: &VersionConfig) -> Result<Self, FlatError> {
        Self::parse(config)
    }
}

impl<V: Version, K> PartialEq for MultiVersion<V, K> {
    fn eq(&self, other: &Self) -> bool {
        self.versions == other.versions
    }
}

impl<V: Version, K> Eq for MultiVersion<V, K> {}

impl<V: Version, K: 'static> Hash for MultiVersion<V, K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut members: Vec<Vec<(String, String)>> =
            self.versions.iter().map(sorted_pairs).collect();
        members.sort_unstable();
        TypeId::of::<Self>().hash(state);
        members.hash(state);
    }
}

impl<V: fmt::Debug, K: VersionKey> fmt::Debug for MultiVersion<V, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiVersion")
            .field("key", &K::KEY)
            .field("versions", &self.versions)
            .finish()
    }
}

impl<V: Clone, K> Clone for MultiVersion<V, K> {
    fn clone(&self) -> Self {
        Self {
            versions: self.versions.clone(),
            key: PhantomData,
        }
    }
}

impl<V: Version, K: VersionKey> FromIterator<V> for MultiVersion<V, K> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::new(iter)
    }
}
