//! A version that is nothing but a point in time.

use chrono::{DateTime, SubsecRound, Utc};

/// An opaque, timestamp-based version.
///
/// Used by resources whose versions carry no meaning of their own: every
/// publish produces a fresh `now()`. The timestamp flattens to whole Unix
/// seconds.
#[derive(Debug, Clone, PartialOrd, Ord, crate::TypedVersion)]
pub struct DatetimeVersion {
    /// The moment the version was created.
    pub execution_date: DateTime<Utc>,
}

impl DatetimeVersion {
    /// Creates a version for the given moment, truncated to whole seconds.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            execution_date: timestamp.trunc_subsecs(0),
        }
    }

    /// Creates a version for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Utc::now())
    }
}

impl crate::SortableVersion for DatetimeVersion {}
