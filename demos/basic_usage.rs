//! Basic usage example for the casegen library.
//!
//! Runs each technique on a small input and prints what it generates.

use serde_json::json;

use casegen::catalogue::{verify_strength, Catalogue};
use casegen::{EquivalencePartition, Generator, LimitValueAnalysis, OrthogonalArray, Technique};

fn main() {
    println!("casegen - Basic Usage Example\n");

    // Equivalence partitioning: every valid combination, one flip per invalid class
    println!("Equivalence partitioning over age and salary...");
    let ep = EquivalencePartition::from_json(&json!({
        "age": {
            "under_18": { "valid": false, "value": 10 },
            "18_to_65": { "valid": true, "value": 30 },
            "over_65": { "valid": true, "value": 70 }
        },
        "salary": {
            "under_1000": { "valid": false, "value": 500 },
            "1000_to_5000": { "valid": true, "value": 2000 }
        }
    }))
    .expect("Invalid partition");
    let cases = ep.build_test_cases().expect("Partition failed");
    println!("  Valid cases: {}", cases.valid.len());
    println!("  Invalid cases: {}", cases.invalid.len());
    for case in &cases.invalid {
        let classes: Vec<String> = case
            .iter()
            .map(|(name, assignment)| format!("{name}={}", assignment.equivalence_class))
            .collect();
        println!("    {}", classes.join(", "));
    }
    println!();

    // Limit value analysis: boundary values found by stepping through the predicate
    println!("Limit value analysis of `10<=x<=100 and x%2==0`...");
    let lva = LimitValueAnalysis::from_json(&json!({
        "even": { "predicate": "10<=x<=100 and x%2==0", "step": 1 }
    }))
    .expect("Invalid limits");
    let limits = lva.build_limits().expect("Search failed");
    for (name, set) in limits.iter() {
        println!("  {name}:");
        for (key, value) in set.entries() {
            match value {
                Some(value) => println!("    {key:<12} {value}"),
                None => println!("    {key:<12} -"),
            }
        }
    }
    println!();

    // Orthogonal arrays: pairwise coverage from a catalogued design
    println!("Orthogonal array over four three-valued parameters...");
    let oa = OrthogonalArray::from_json(&json!({
        "browser": ["firefox", "chrome", "safari"],
        "os": ["linux", "macos", "windows"],
        "locale": ["en", "es", "de"],
        "theme": ["light", "dark", "contrast"]
    }))
    .expect("Invalid parameters");
    let cases = oa.build_test_cases().expect("No design fits");
    println!("  Design: {}", cases.design());
    println!("  Keys: {:?}", cases.keys());
    for row in cases.rows() {
        println!("    {}", serde_json::to_string(row).expect("Row is JSON"));
    }

    let report = cases.balance_report();
    if report.is_balanced() {
        println!("✓ Every column uses its values evenly");
    } else {
        println!("✗ Unbalanced columns: {:?}", report.column_balance);
    }
    println!();

    // The catalogued designs are strength-2 orthogonal
    let catalogue = Catalogue::standard().expect("Catalogue failed to load");
    let l9 = catalogue.get("L9").expect("L9 is catalogued");
    let result = verify_strength(l9, 2);
    if result.is_valid {
        println!("✓ L9 is a valid strength-2 orthogonal array");
    }
    println!();

    // Response envelope, as served to clients
    println!("Report envelope for an LVA request with a too-short predicate...");
    let generator = Generator::new().expect("Generator failed");
    let report = generator.report(
        Technique::LimitValueAnalysis,
        &json!({ "p": { "predicate": "x>1", "step": 1 } }),
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("Report is JSON")
    );
}
