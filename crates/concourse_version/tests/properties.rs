//! Property tests for version identity.

use concourse_version::{
    CodecRegistry, MultiVersion, SortableVersion, TypedVersion, Version, version_hash,
};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialOrd, Ord, TypedVersion)]
struct Build {
    name: String,
    number: u64,
    passed: bool,
}

impl SortableVersion for Build {}

fn arb_build() -> impl Strategy<Value = Build> {
    (".*", any::<u64>(), any::<bool>()).prop_map(|(name, number, passed)| Build {
        name,
        number,
        passed,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_round_trip(build in arb_build()) {
        let rebuilt = Build::from_flat_dict(&build.to_flat_dict()).unwrap();
        prop_assert_eq!(rebuilt, build);
    }

    #[test]
    fn prop_equality_matches_flat_form(left in arb_build(), right in arb_build()) {
        prop_assert_eq!(left == right, left.to_flat_dict() == right.to_flat_dict());
        if left == right {
            prop_assert_eq!(version_hash(&left), version_hash(&right));
        }
    }

    #[test]
    fn prop_bool_survives_the_registry(value in any::<bool>()) {
        let codecs = CodecRegistry::standard();
        prop_assert_eq!(codecs.unflatten::<bool>(&codecs.flatten(&value)).unwrap(), value);
    }

    #[test]
    fn prop_multi_version_is_order_independent(
        builds in prop::collection::vec(arb_build(), 0..8),
    ) {
        let forward: MultiVersion<Build> = builds.iter().cloned().collect();
        let backward: MultiVersion<Build> = builds.iter().rev().cloned().collect();
        prop_assert_eq!(forward.to_flat_dict(), backward.to_flat_dict());
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(version_hash(&forward), version_hash(&backward));
    }

    #[test]
    fn prop_multi_version_round_trips(
        builds in prop::collection::vec(arb_build(), 0..8),
    ) {
        let multi: MultiVersion<Build> = builds.into_iter().collect();
        let rebuilt = MultiVersion::<Build>::from_flat_dict(&multi.to_flat_dict()).unwrap();
        prop_assert_eq!(rebuilt, multi);
    }
}

#[test]
fn false_is_not_truthy() {
    let codecs = CodecRegistry::standard();
    assert!(!codecs.unflatten::<bool>(&codecs.flatten(&false)).unwrap());
}

#[test]
fn schema_is_available_without_an_instance() {
    assert_eq!(Build::schema().public_fields().count(), 3);
}
