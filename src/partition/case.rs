//! Test case output types shared by the partition and limit engines.

use std::collections::HashSet;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// The equivalence class chosen for one parameter of a test case.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Assignment {
    /// Name of the equivalence class.
    pub equivalence_class: String,
    /// Representative value of the class.
    pub value: Value,
}

/// A test case: one [`Assignment`] per parameter, in parameter order.
///
/// Serializes as a map from parameter name to assignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCase {
    entries: Vec<(String, Assignment)>,
}

impl TestCase {
    /// Create an empty test case.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the assignment of a parameter.
    pub fn push(&mut self, parameter: impl Into<String>, assignment: Assignment) {
        self.entries.push((parameter.into(), assignment));
    }

    /// Look up the assignment of a parameter.
    #[must_use]
    pub fn get(&self, parameter: &str) -> Option<&Assignment> {
        self.entries
            .iter()
            .find(|(name, _)| name == parameter)
            .map(|(_, assignment)| assignment)
    }

    /// Iterate over `(parameter, assignment)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.entries
            .iter()
            .map(|(name, assignment)| (name.as_str(), assignment))
    }

    /// Number of parameters in the case.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the case assigns no parameter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for TestCase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, assignment) in &self.entries {
            map.serialize_entry(name, assignment)?;
        }
        map.end()
    }
}

/// Valid and invalid test cases produced by one generation call.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TestCases {
    /// Cases where every parameter uses a valid class.
    pub valid: Vec<TestCase>,
    /// Cases where exactly one parameter uses an invalid class.
    pub invalid: Vec<TestCase>,
}

/// Insertion-ordered set of class-index combinations.
///
/// A combination holds, for every parameter in declaration order, the index
/// of the chosen class. Class names are unique per parameter, so two
/// combinations are equal exactly when the cases they describe are equal.
#[derive(Debug, Default)]
pub(crate) struct CombinationSet {
    seen: HashSet<Vec<usize>>,
    ordered: Vec<Vec<usize>>,
}

impl CombinationSet {
    /// Insert a combination, returning `false` if it was already present.
    pub(crate) fn insert(&mut self, combination: &[usize]) -> bool {
        if self.seen.contains(combination) {
            return false;
        }
        self.seen.insert(combination.to_vec());
        self.ordered.push(combination.to_vec());
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.ordered.iter().map(Vec::as_slice)
    }
}
