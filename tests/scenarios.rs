//! End-to-end scenarios for the three techniques.

use serde_json::{json, Value};
use test_log::test;

use casegen::limits::LimitValueAnalysis;
use casegen::oa::OrthogonalArray;
use casegen::partition::{EquivalencePartition, TestCase, TestCases};
use casegen::technique::{Generator, Technique};
use casegen::ErrorKind;

fn cases_json(cases: &TestCases) -> Value {
    serde_json::to_value(cases).unwrap()
}

fn class_names(cases: &[TestCase]) -> Vec<Vec<String>> {
    cases
        .iter()
        .map(|case| {
            case.iter()
                .map(|(_, assignment)| assignment.equivalence_class.clone())
                .collect()
        })
        .collect()
}

fn class(name: &str, value: Value) -> Value {
    json!({ "equivalence_class": name, "value": value })
}

#[test]
fn ep_one_valid_two_invalid() {
    let ep = EquivalencePartition::from_json(&json!({
        "param1": {
            "c1": { "valid": true, "value": "value1" },
            "c2": { "valid": false, "value": 1 }
        },
        "param2": {
            "c1": { "valid": true, "value": [1, 2, 3] },
            "c2": { "valid": false, "value": -1 }
        }
    }))
    .unwrap();

    let cases = ep.build_test_cases().unwrap();
    assert_eq!(
        cases_json(&cases),
        json!({
            "valid": [
                { "param1": class("c1", json!("value1")), "param2": class("c1", json!([1, 2, 3])) }
            ],
            "invalid": [
                { "param1": class("c2", json!(1)), "param2": class("c1", json!([1, 2, 3])) },
                { "param1": class("c1", json!("value1")), "param2": class("c2", json!(-1)) }
            ]
        })
    );
}

#[test]
fn ep_counts_follow_class_flags() {
    let three = |flags: [bool; 3]| {
        json!({
            "c1": { "valid": flags[0], "value": 1 },
            "c2": { "valid": flags[1], "value": 2 },
            "c3": { "valid": flags[2], "value": 3 }
        })
    };

    let all_valid = EquivalencePartition::from_json(&json!({
        "p1": three([true, true, true]),
        "p2": three([true, true, true]),
        "p3": three([true, true, true]),
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();
    assert_eq!((all_valid.valid.len(), all_valid.invalid.len()), (27, 0));

    let mixed = EquivalencePartition::from_json(&json!({
        "p1": three([true, false, true]),
        "p2": three([true, false, false]),
        "p3": three([true, false, true]),
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();
    assert_eq!((mixed.valid.len(), mixed.invalid.len()), (4, 4));

    let mostly_invalid = EquivalencePartition::from_json(&json!({
        "p1": three([true, false, false]),
        "p2": three([true, false, false]),
        "p3": three([true, false, false]),
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();
    assert_eq!((mostly_invalid.valid.len(), mostly_invalid.invalid.len()), (1, 6));
}

#[test]
fn ep_age_salary_gender() {
    let ep = EquivalencePartition::from_json(&json!({
        "age": {
            "under_18": { "valid": false, "value": 10 },
            "18_to_65": { "valid": true, "value": 30 },
            "over_65": { "valid": true, "value": 70 }
        },
        "salary": {
            "under_1000": { "valid": false, "value": 500 },
            "1000_to_5000": { "valid": true, "value": 2000 },
            "over_5000": { "valid": false, "value": 8000 }
        },
        "gender": {
            "male": { "valid": true, "value": "M" },
            "female": { "valid": true, "value": "F" },
            "other": { "valid": false, "value": "O" }
        }
    }))
    .unwrap();

    let cases = ep.build_test_cases().unwrap();

    assert_eq!(
        class_names(&cases.valid),
        [
            ["18_to_65", "1000_to_5000", "male"],
            ["18_to_65", "1000_to_5000", "female"],
            ["over_65", "1000_to_5000", "male"],
            ["over_65", "1000_to_5000", "female"],
        ]
    );
    assert_eq!(
        class_names(&cases.invalid),
        [
            ["under_18", "1000_to_5000", "male"],
            ["18_to_65", "under_1000", "male"],
            ["18_to_65", "over_5000", "male"],
            ["18_to_65", "1000_to_5000", "other"],
        ]
    );
}

#[test]
fn lva_multiple_of_hundred() {
    let lva = LimitValueAnalysis::from_json(&json!({
        "param1": { "predicate": "x>=100 and x<=10000 and x%100==0", "step": 1 }
    }))
    .unwrap();

    let limits = serde_json::to_value(lva.build_limits().unwrap()).unwrap();
    assert_eq!(
        limits,
        json!({
            "param1": {
                "invalid_min": 99,
                "first_min": 100,
                "second_min": 200,
                "middle": 5000,
                "first_max": 9900,
                "second_max": 10000,
                "invalid_max": 10001
            }
        })
    );
}

#[test]
fn lva_original_behaviour_table() {
    let lva = LimitValueAnalysis::from_json(&json!({
        "param1": { "predicate": "-1.2<x<=4.3", "step": 0.1 },
        "param2": { "predicate": "1<=x<=10^6 and x%10000!=0", "step": 10 },
        "param3": { "predicate": "10<=x<=100 and x%2==0", "step": 1 }
    }))
    .unwrap();

    let limits = serde_json::to_value(lva.build_limits().unwrap()).unwrap();
    assert_eq!(
        limits,
        json!({
            "param1": {
                "invalid_min": -1.2,
                "first_min": -1.1,
                "second_min": -1.0,
                "middle": 1.0,
                "first_max": 4.2,
                "second_max": 4.3,
                "invalid_max": 4.4
            },
            "param2": {
                "invalid_min": 0,
                "first_min": 10,
                "second_min": 20,
                "middle": 499_990,
                "first_max": 999_980,
                "second_max": 999_990,
                "invalid_max": 1_000_000
            },
            "param3": {
                "invalid_min": 9,
                "first_min": 10,
                "second_min": 12,
                "middle": 54,
                "first_max": 98,
                "second_max": 100,
                "invalid_max": 101
            }
        })
    );

    let cases = lva.build_test_cases().unwrap();
    assert_eq!(cases.valid.len(), 125);
    assert_eq!(cases.invalid.len(), 6);
    for case in &cases.invalid {
        let invalid: Vec<&str> = case
            .iter()
            .map(|(_, a)| a.equivalence_class.as_str())
            .filter(|class| class.starts_with("invalid"))
            .collect();
        assert_eq!(invalid.len(), 1);
    }
}

#[test]
fn lva_short_predicate_fails_before_search() {
    let err = LimitValueAnalysis::from_json(&json!({
        "param1": { "predicate": "x>1", "step": 1 }
    }))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn lva_rejects_foreign_identifiers() {
    for predicate in ["10<=x<=1p00", "x >= 1 and X <= 10", "__import__ > 1"] {
        let err = LimitValueAnalysis::from_json(&json!({
            "param1": { "predicate": predicate, "step": 1 }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax, "{predicate}");
    }
}

#[test]
fn lva_fine_step_over_huge_range_times_out() {
    let generator = Generator::with_config(
        casegen::config::GeneratorConfig::from_toml_str("[limits]\ntime_budget_ms = 1\n").unwrap(),
    )
    .unwrap();
    let report = generator.report(
        Technique::LimitValueAnalysis,
        &json!({
            "param1": { "predicate": "x >= 1 and x <= 10^15 and x % 100000 == 0", "step": 0.1 }
        }),
    );
    assert_eq!(report.error_kind(), Some(ErrorKind::Timeout));
}

#[test]
fn oa_l4_with_single_value_parameter() {
    let cases = OrthogonalArray::from_json(&json!({
        "param1": ["A", "B"],
        "param2": [1, 2],
        "param3": ["value1"]
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();

    assert_eq!(
        serde_json::to_value(&cases).unwrap(),
        json!({
            "L": "L4",
            "keys": ["param1", "param2", "param3"],
            "array": [
                ["A", 1, "value1"],
                ["A", 2, "value1"],
                ["B", 1, "value1"],
                ["B", 2, "value1"]
            ]
        })
    );
}

#[test]
fn oa_l8_five_and_seven_parameters() {
    let cases = OrthogonalArray::from_json(&json!({
        "param1": ["A", "B"],
        "param2": [1, 2],
        "param3": ["%", "#"],
        "param4": ["P", "Q"],
        "param5": ["X", "Y"]
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();
    assert_eq!(cases.design(), "L8");
    assert_eq!(
        serde_json::to_value(cases.rows()).unwrap(),
        json!([
            ["A", 1, "%", "P", "X"],
            ["A", 1, "%", "Q", "Y"],
            ["A", 2, "#", "P", "X"],
            ["A", 2, "#", "Q", "Y"],
            ["B", 1, "#", "P", "Y"],
            ["B", 1, "#", "Q", "X"],
            ["B", 2, "%", "P", "Y"],
            ["B", 2, "%", "Q", "X"]
        ])
    );

    let cases = OrthogonalArray::from_json(&json!({
        "param1": ["A", "B"],
        "param2": [1, 2],
        "param3": ["%", "#"],
        "param4": ["P", "Q"],
        "param5": [100, 200],
        "param6": ["+", "-"],
        "param7": ["OS", "WS"]
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();
    assert_eq!(cases.design(), "L8");
    assert_eq!(
        serde_json::to_value(cases.rows()).unwrap(),
        json!([
            ["A", 1, "%", "P", 100, "+", "OS"],
            ["A", 1, "%", "Q", 200, "-", "WS"],
            ["A", 2, "#", "P", 100, "-", "WS"],
            ["A", 2, "#", "Q", 200, "+", "OS"],
            ["B", 1, "#", "P", 200, "+", "WS"],
            ["B", 1, "#", "Q", 100, "-", "OS"],
            ["B", 2, "%", "P", 200, "-", "OS"],
            ["B", 2, "%", "Q", 100, "+", "WS"]
        ])
    );
}

#[test]
fn oa_l9_four_three_level_parameters() {
    let cases = OrthogonalArray::from_json(&json!({
        "param1": ["A", "B", "C"],
        "param2": [1, 2, 3],
        "param3": ["%", "#", "$"],
        "param4": ["P", "Q", "R"]
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();
    assert_eq!(cases.design(), "L9");
    assert_eq!(
        serde_json::to_value(cases.rows()).unwrap(),
        json!([
            ["A", 1, "%", "P"],
            ["A", 2, "#", "Q"],
            ["A", 3, "$", "R"],
            ["B", 1, "#", "R"],
            ["B", 2, "$", "P"],
            ["B", 3, "%", "Q"],
            ["C", 1, "$", "Q"],
            ["C", 2, "%", "R"],
            ["C", 3, "#", "P"]
        ])
    );
    assert!(cases.balance_report().is_balanced());
}

#[test]
fn oa_l12_eight_two_level_parameters() {
    let cases = OrthogonalArray::from_json(&json!({
        "param1": ["A", "B"],
        "param2": [1, 2],
        "param3": ["%", "#"],
        "param4": ["&", "*"],
        "param5": [100, 200],
        "param6": [300, 400],
        "param7": ["r", "z"],
        "param8": ["W", "D"]
    }))
    .unwrap()
    .build_test_cases()
    .unwrap();
    assert_eq!(cases.design(), "L12");
    assert_eq!(
        serde_json::to_value(cases.rows()).unwrap(),
        json!([
            ["A", 1, "%", "&", 100, 300, "r", "W"],
            ["A", 1, "%", "&", 100, 400, "z", "D"],
            ["A", 1, "#", "*", 200, 300, "r", "W"],
            ["A", 2, "%", "*", 200, 300, "z", "D"],
            ["A", 2, "#", "&", 200, 400, "r", "D"],
            ["A", 2, "#", "*", 100, 400, "z", "W"],
            ["B", 1, "#", "*", 100, 300, "z", "D"],
            ["B", 1, "#", "&", 200, 400, "z", "W"],
            ["B", 1, "%", "*", 200, 400, "r", "D"],
            ["B", 2, "#", "&", 100, 300, "r", "D"],
            ["B", 2, "%", "*", 100, 400, "r", "W"],
            ["B", 2, "%", "&", 200, 300, "z", "W"]
        ])
    );
}

#[test]
fn oa_thirteen_ten_level_parameters_have_no_design() {
    let parameters: serde_json::Map<String, Value> = (0..13)
        .map(|i| {
            let values: Vec<i32> = (0..10).map(|v| i + v).collect();
            (format!("param{}", i + 1), json!(values))
        })
        .collect();

    let err = OrthogonalArray::from_json(&Value::Object(parameters))
        .unwrap()
        .build_test_cases()
        .unwrap_err();
    assert_eq!(err.root_cause().kind(), ErrorKind::Lookup);
    assert!(err.to_string().contains("L(10^13)"));
}

#[test]
fn oa_rejects_empty_and_null_values() {
    for parameters in [
        json!({ "param1": [], "param2": [], "param3": [] }),
        json!({ "param1": null, "param2": null, "param3": [1, 2, 3] }),
        json!({ "param1": [1, 2, 3, null], "param2": [null], "param3": [1, 2, 3] }),
    ] {
        let err = OrthogonalArray::from_json(&parameters).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }
}
