//! Ordering for versions.
//!
//! Sorting goes through [`PartialOrd`], so a pair of versions that cannot be
//! compared surfaces as a [`ComparisonError`] instead of a panic or a
//! silently truncated result.

use crate::version::Version;
use core::cmp::Ordering;
use thiserror::Error;

/// A [`Version`] with a strict less-than relation.
///
/// Implementing the trait is opt-in: the self-organising and multi-version
/// patterns require it.
pub trait SortableVersion: Version + PartialOrd {
    /// Whether `self` strictly precedes `other`, or `None` if the two cannot
    /// be compared.
    fn precedes(&self, other: &Self) -> Option<bool> {
        self.partial_cmp(other).map(Ordering::is_lt)
    }

    /// `self < other || self == other`.
    fn precedes_or_equals(&self, other: &Self) -> Option<bool> {
        if self == other {
            return Some(true);
        }
        self.precedes(other)
    }
}

/// Two versions that were expected to be ordered could not be compared.
#[derive(Debug, Clone, Error)]
#[error("cannot order {left} against {right} ({type_name})")]
pub struct ComparisonError {
    /// The version type.
    pub type_name: &'static str,
    /// Debug rendering of the left operand.
    pub left: String,
    /// Debug rendering of the right operand.
    pub right: String,
}

impl ComparisonError {
    fn new<V: Version>(left: &V, right: &V) -> Self {
        Self {
            type_name: core::any::type_name::<V>(),
            left: format!("{left:?}"),
            right: format!("{right:?}"),
        }
    }
}

fn compare<V: SortableVersion>(left: &V, right: &V) -> Result<Ordering, ComparisonError> {
    left.partial_cmp(right)
        .ok_or_else(|| ComparisonError::new(left, right))
}

/// Sorts versions oldest first.
///
/// Equal versions keep their relative order.
pub fn sort_versions<V: SortableVersion>(
    versions: impl IntoIterator<Item = V>,
) -> Result<Vec<V>, ComparisonError> {
    let mut sorted: Vec<V> = Vec::new();
    for version in versions {
        let mut index = sorted.len();
        while index > 0 {
            if compare(&sorted[index - 1], &version)?.is_gt() {
                index -= 1;
            } else {
                break;
            }
        }
        sorted.insert(index, version);
    }
    Ok(sorted)
}

/// Returns the greatest version, or `None` when there are no candidates.
pub fn newest_version<V: SortableVersion>(
    versions: impl IntoIterator<Item = V>,
) -> Result<Option<V>, ComparisonError> {
    let mut newest: Option<V> = None;
    for version in versions {
        newest = match newest {
            Some(current) if compare(&current, &version)?.is_ge() => Some(current),
            _ => Some(version),
        };
    }
    Ok(newest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionConfig;
    use concourse_flat::FlatError;

    /// A float-backed version, where NaN cannot be ordered.
    #[derive(Debug, Clone, Copy)]
    struct Score(f64);

    impl Version for Score {
        fn to_flat_dict(&self) -> VersionConfig {
            VersionConfig::from([("score".to_owned(), self.0.to_string())])
        }

        fn from_flat_dict(config: &VersionConfig) -> Result<Self, FlatError> {
            crate::typed::take_default_field::<Self, f64>(config, "score").map(Score)
        }
    }

    crate::impl_version_identity!(Score);

    impl PartialOrd for Score {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            self.0.partial_cmp(&other.0)
        }
    }

    impl SortableVersion for Score {}

    #[test]
    fn sorts_oldest_first() {
        let sorted = sort_versions([Score(3.0), Score(1.0), Score(2.0)]).unwrap();
        assert_eq!(sorted, vec![Score(1.0), Score(2.0), Score(3.0)]);
    }

    #[test]
    fn newest_of_nothing_is_none() {
        assert_eq!(newest_version(Vec::<Score>::new()).unwrap(), None);
    }

    #[test]
    fn incomparable_versions_are_an_error() {
        assert!(sort_versions([Score(1.0), Score(f64::NAN)]).is_err());
        assert!(newest_version([Score(1.0), Score(f64::NAN)]).is_err());
    }

    #[test]
    fn precedes_or_equals_covers_equality() {
        assert_eq!(Score(1.0).precedes_or_equals(&Score(1.0)), Some(true));
        assert_eq!(Score(2.0).precedes_or_equals(&Score(1.0)), Some(false));
        assert_eq!(Score(f64::NAN).precedes(&Score(1.0)), None);
    }
}
