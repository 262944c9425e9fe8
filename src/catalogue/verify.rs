//! Strength verification of catalogued designs.
//!
//! A design has strength `t` when every selection of `t` columns contains
//! every `t`-tuple of levels the same number of times. Test-case generation
//! relies on strength 2: every pair of parameter values is covered.

use std::collections::HashMap;

use crate::utils::combinations;

use super::Design;

/// Result of verifying a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether the design reaches the claimed strength.
    pub is_valid: bool,
    /// The claimed strength.
    pub claimed_strength: u32,
    /// The highest strength up to the claim for which the design is balanced.
    pub actual_strength: u32,
    /// Issues found.
    pub issues: Vec<VerificationIssue>,
}

/// A specific issue found during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationIssue {
    /// The run count is not a multiple of `levels^t`, so no selection of
    /// `t` columns can be balanced.
    IndivisibleRuns {
        /// The strength being checked.
        strength: u32,
        /// `levels^strength`.
        tuples: usize,
    },
    /// Some tuples of a column selection appear more or less often than others.
    ImbalancedColumns {
        /// The selected columns, 0-based.
        columns: Vec<usize>,
        /// How often every tuple should appear.
        expected_count: usize,
        /// Number of distinct tuples that were seen.
        distinct_tuples: usize,
    },
}

/// Verify that a design has the claimed strength.
///
/// Every selection of `1..=strength` columns is checked, stopping at the
/// first strength that fails.
#[must_use]
pub fn verify_strength(design: &Design, strength: u32) -> VerificationResult {
    let runs = design.runs();
    let factors = design.factors();
    let levels = design.levels() as usize;

    let mut issues = Vec::new();
    let mut verified = 0;

    for t in 1..=strength {
        let width = t as usize;
        if width > factors {
            break;
        }

        let Some(tuples) = levels.checked_pow(t) else {
            issues.push(VerificationIssue::IndivisibleRuns { strength: t, tuples: usize::MAX });
            break;
        };
        if runs % tuples != 0 {
            issues.push(VerificationIssue::IndivisibleRuns { strength: t, tuples });
            break;
        }
        let expected_count = runs / tuples;

        let before = issues.len();
        for columns in combinations(factors, width) {
            let mut counts: HashMap<Vec<u32>, usize> = HashMap::with_capacity(tuples);
            for row in 0..runs {
                let tuple = columns.iter().map(|&c| design.get(row, c)).collect();
                *counts.entry(tuple).or_insert(0) += 1;
            }

            if counts.len() != tuples || counts.values().any(|&c| c != expected_count) {
                issues.push(VerificationIssue::ImbalancedColumns {
                    distinct_tuples: counts.len(),
                    columns,
                    expected_count,
                });
            }
        }

        if issues.len() > before {
            break;
        }
        verified = t;
    }

    VerificationResult {
        is_valid: issues.is_empty() && verified >= strength,
        claimed_strength: strength,
        actual_strength: verified,
        issues,
    }
}
