//! Codecs installed by [`CodecRegistry::with_builtins`].

use crate::error::FlatError;
use crate::flat::{Flat, FlatObject, Target};
use crate::key::TypeKey;
use crate::registry::CodecRegistry;
use chrono::{DateTime, Utc};

pub(crate) fn register(registry: &mut CodecRegistry) {
    registry
        .register_flatten(<bool as Flat>::flatten_default)
        .register_unflatten(<bool as Flat>::unflatten_default)
        .register_flatten(flatten_datetime)
        .register_unflatten(unflatten_datetime)
        .register_family_flatten(TypeKey::enumeration(), |value: &dyn FlatObject| {
            value.member().map(str::to_owned)
        })
        .register_family_unflatten(TypeKey::enumeration(), |target: &Target, flat: &str| {
            target.member(flat)
        });
}

fn flatten_datetime(value: &DateTime<Utc>) -> String {
    value.timestamp().to_string()
}

fn unflatten_datetime(flat: &str) -> Result<DateTime<Utc>, FlatError> {
    let seconds: i64 = flat
        .parse()
        .map_err(|err| FlatError::parse::<DateTime<Utc>>(flat, err))?;
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| FlatError::invalid_value::<DateTime<Utc>>(flat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bool_round_trips_through_capitalised_names() {
        let registry = CodecRegistry::with_builtins();
        assert_eq!(registry.flatten(&true), "True");
        assert_eq!(registry.flatten(&false), "False");
        assert!(!registry.unflatten::<bool>(&registry.flatten(&false)).unwrap());
        assert!(registry.unflatten::<bool>("True").unwrap());
    }

    #[test]
    fn bool_rejects_anything_but_exact_names() {
        let registry = CodecRegistry::with_builtins();
        assert!(matches!(
            registry.unflatten::<bool>("true"),
            Err(FlatError::InvalidValue { .. })
        ));
    }

    #[test]
    fn datetime_flattens_to_whole_seconds() {
        let registry = CodecRegistry::with_builtins();
        let date = Utc.with_ymd_and_hms(2020, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(registry.flatten(&date), "1577881800");
        assert_eq!(registry.unflatten::<DateTime<Utc>>("1577881800").unwrap(), date);
    }

    #[test]
    fn datetime_rejects_non_numeric_input() {
        let registry = CodecRegistry::with_builtins();
        assert!(registry.unflatten::<DateTime<Utc>>("yesterday").is_err());
    }
}
