//! Property-based tests for the core policies.

use lingua_cms::error::ValidationError;
use lingua_cms::i18n::{
    validate_default_uniqueness, DefaultFlag, Localizable, LocalizedRecord,
};
use lingua_cms::localization::{converted_price, Currency};
use lingua_cms::ordering::{next_weight, next_weight_from_max};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn currency(coefficient: f64) -> Currency {
    Currency {
        id: 0,
        name: "X".to_string(),
        short_name: "XXX".to_string(),
        coefficient,
        default: false,
        first_image: None,
        second_image: None,
    }
}

proptest! {
    // For any proposed set, validation fails iff the live default count
    // is not exactly one (empty sets pass).
    #[test]
    fn default_uniqueness_counts_live_defaults(flags in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..20)) {
        let set: Vec<DefaultFlag> = flags
            .iter()
            .map(|&(default, deleted)| DefaultFlag { default, deleted })
            .collect();
        let live = set.iter().filter(|f| !f.deleted).count();
        let defaults = set.iter().filter(|f| !f.deleted && f.default).count();

        let result = validate_default_uniqueness(set.iter().copied());
        if live == 0 || defaults == 1 {
            prop_assert!(result.is_ok());
        } else if defaults == 0 {
            prop_assert_eq!(result, Err(ValidationError::NoDefault));
        } else {
            prop_assert_eq!(result, Err(ValidationError::MultipleDefault));
        }
    }

    // unrealized == catalog - realized, and full realization is exactly
    // an empty difference.
    #[test]
    fn coverage_set_algebra(
        realized in proptest::collection::btree_set(1i64..30, 0..10),
        catalog in proptest::collection::btree_set(1i64..30, 0..10),
    ) {
        let records: Vec<LocalizedRecord<()>> = realized
            .iter()
            .enumerate()
            .map(|(i, &language)| LocalizedRecord { language, default: i == 0, value: () })
            .collect();
        let set = Localizable::new(records);

        let unrealized = set.unrealized_language_ids(&catalog);
        let expected: BTreeSet<i64> = catalog.difference(&realized).copied().collect();
        prop_assert_eq!(&unrealized, &expected);
        prop_assert_eq!(set.is_fully_realized(&catalog), unrealized.is_empty());
    }

    // Resolution returns the requested language whenever it is realized.
    #[test]
    fn resolve_prefers_requested_language(
        languages in proptest::collection::btree_set(1i64..30, 1..10),
        requested in 1i64..30,
    ) {
        let records: Vec<LocalizedRecord<i64>> = languages
            .iter()
            .enumerate()
            .map(|(i, &language)| LocalizedRecord { language, default: i == 0, value: language })
            .collect();
        let set = Localizable::new(records);

        let resolved = set.resolve(requested).unwrap();
        if languages.contains(&requested) {
            prop_assert_eq!(resolved.language, requested);
        } else {
            prop_assert!(resolved.default);
        }
        // Idempotent: same result twice with no writes in between.
        prop_assert_eq!(set.resolve(requested).unwrap(), resolved);
    }

    // Appending N children to an empty scope yields 0..N in order.
    #[test]
    fn weights_are_monotonic(n in 0usize..50) {
        let mut weights: Vec<i64> = Vec::new();
        for expected in 0..n as i64 {
            let assigned = next_weight(weights.iter().copied());
            prop_assert_eq!(assigned, expected);
            weights.push(assigned);
        }
    }

    // next_weight always lands strictly above every existing weight.
    #[test]
    fn next_weight_exceeds_existing(existing in proptest::collection::vec(-1000i64..1000, 0..20)) {
        let next = next_weight(existing.iter().copied());
        prop_assert!(existing.iter().all(|&w| next > w));
        prop_assert_eq!(next, next_weight_from_max(existing.iter().copied().max()));
    }

    // Price conversion is None iff any input is missing, and exact
    // otherwise.
    #[test]
    fn price_conversion_none_propagation(
        price in proptest::option::of(0.01f64..1e6),
        base in proptest::option::of(0.01f64..1e3),
        target in proptest::option::of(0.01f64..1e3),
    ) {
        let base_currency = base.map(currency);
        let target_currency = target.map(currency);
        let converted = converted_price(price, base_currency.as_ref(), target_currency.as_ref());

        match (price, base, target) {
            (Some(price), Some(base), Some(target)) => {
                prop_assert_eq!(converted, Some(price * base / target));
            }
            _ => prop_assert_eq!(converted, None),
        }
    }
}
