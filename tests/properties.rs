//! Property-based tests over generated inputs.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{json, Value};

use casegen::limits::{LimitParameter, LimitValueAnalysis, Predicate};
use casegen::oa::{Factor, OrthogonalArray};
use casegen::partition::{EquivalenceClass, EquivalencePartition, Parameter};

/// Per parameter, a list of class validity flags; the first class is always valid.
fn class_layout() -> impl Strategy<Value = Vec<Vec<bool>>> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), 0..4), 2..5).prop_map(|layout| {
        layout
            .into_iter()
            .map(|flags| std::iter::once(true).chain(flags).collect())
            .collect()
    })
}

fn partition(layout: &[Vec<bool>]) -> EquivalencePartition {
    let parameters = layout
        .iter()
        .enumerate()
        .map(|(p, flags)| {
            let classes = flags
                .iter()
                .enumerate()
                .map(|(c, &valid)| {
                    let name = format!("c{c}");
                    let value = json!(p * 10 + c);
                    if valid {
                        EquivalenceClass::valid(name, value)
                    } else {
                        EquivalenceClass::invalid(name, value)
                    }
                })
                .collect();
            Parameter::new(format!("p{p}"), classes)
        })
        .collect();
    EquivalencePartition::new(parameters).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ep_case_counts(layout in class_layout()) {
        let cases = partition(&layout).build_test_cases().unwrap();

        let valid_per_parameter: Vec<usize> = layout
            .iter()
            .map(|flags| flags.iter().filter(|&&valid| valid).count())
            .collect();
        let expected_valid: usize = valid_per_parameter.iter().product();
        prop_assert_eq!(cases.valid.len(), expected_valid);

        let expected_invalid: usize = layout
            .iter()
            .map(|flags| flags.iter().filter(|&&valid| !valid).count())
            .sum();
        prop_assert_eq!(cases.invalid.len(), expected_invalid);
    }

    #[test]
    fn ep_cases_are_distinct(layout in class_layout()) {
        let cases = partition(&layout).build_test_cases().unwrap();
        let mut seen = HashSet::new();
        for case in cases.valid.iter().chain(&cases.invalid) {
            let key: Vec<String> = case
                .iter()
                .map(|(_, assignment)| assignment.equivalence_class.clone())
                .collect();
            prop_assert!(seen.insert(key));
        }
    }

    #[test]
    fn ep_invalid_cases_flip_one_parameter(layout in class_layout()) {
        let ep = partition(&layout);
        let cases = ep.build_test_cases().unwrap();
        for case in &cases.invalid {
            let flipped = case
                .iter()
                .zip(&layout)
                .filter(|((_, assignment), flags)| {
                    let index: usize = assignment.equivalence_class[1..].parse().unwrap();
                    !flags[index]
                })
                .count();
            prop_assert_eq!(flipped, 1);
        }
    }

    #[test]
    fn oa_rows_draw_from_candidates(
        head in 2usize..4,
        tail in prop::collection::vec(1usize..4, 0..7),
    ) {
        // Single-valued factors alone match no design.
        let sizes: Vec<usize> = std::iter::once(head).chain(tail).collect();
        let factors: Vec<Factor> = sizes
            .iter()
            .enumerate()
            .map(|(f, &n)| {
                Factor::new(format!("f{f}"), (0..n).map(|v| json!(format!("{f}-{v}"))).collect())
            })
            .collect();
        let cases = OrthogonalArray::new(factors.clone())
            .unwrap()
            .build_test_cases()
            .unwrap();

        // Columns follow `keys()`, which orders factors by candidate count.
        let columns: Vec<&Factor> = cases
            .keys()
            .iter()
            .map(|key| factors.iter().find(|f| &f.name == key).unwrap())
            .collect();
        prop_assert_eq!(columns.len(), factors.len());
        for pair in columns.windows(2) {
            prop_assert!(pair[0].values.len() >= pair[1].values.len());
        }
        for row in cases.rows() {
            prop_assert_eq!(row.len(), columns.len());
            for (value, factor) in row.iter().zip(&columns) {
                prop_assert!(factor.values.contains(value), "{} not in {}", value, factor.name);
            }
        }
        prop_assert!(cases.balance_report().is_balanced());
    }

    #[test]
    fn lva_integer_range_edges(low in -500i64..500, width in 10i64..400) {
        let high = low + width;
        let source = format!("{low} <= x <= {high}");
        let lva = LimitValueAnalysis::new(vec![LimitParameter::new("x", source.as_str(), 1.0)])
            .unwrap();
        let limits = lva.build_limits().unwrap();
        let set = limits.get("x").unwrap();

        #[allow(clippy::cast_precision_loss)]
        let (low, high) = (low as f64, high as f64);
        prop_assert_eq!(set.first_min, low);
        prop_assert_eq!(set.invalid_min, low - 1.0);
        prop_assert_eq!(set.second_max, high);
        prop_assert_eq!(set.invalid_max, high + 1.0);

        let predicate: Predicate = source.parse().unwrap();
        prop_assert!(predicate.holds(set.first_min).unwrap());
        prop_assert!(predicate.holds(set.second_max).unwrap());
        prop_assert!(!predicate.holds(set.invalid_min).unwrap());
        prop_assert!(!predicate.holds(set.invalid_max).unwrap());
        if let Some(middle) = set.middle {
            prop_assert!(predicate.holds(middle).unwrap());
        }
    }
}

#[test]
fn lva_json_aliases_match_canonical_keys() {
    let canonical = LimitValueAnalysis::from_json(&json!({
        "p": { "predicate": "10<=x<=100 and x%2==0", "step": 1 }
    }))
    .unwrap();
    let aliased = LimitValueAnalysis::from_json(&json!({
        "p": { "lambda": "10<=x<=100 and x%2==0", "delta": 1 }
    }))
    .unwrap();
    assert_eq!(
        serde_json::to_value(canonical.build_limits().unwrap()).unwrap(),
        serde_json::to_value(aliased.build_limits().unwrap()).unwrap()
    );
    let _: Value = serde_json::to_value(canonical.build_test_cases().unwrap()).unwrap();
}
