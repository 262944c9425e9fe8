//! Equivalence partitioning.
//!
//! Each parameter is split into named equivalence classes, each flagged valid
//! or invalid and carrying one representative value. The engine produces:
//!
//! - **valid cases**: the Cartesian product of every parameter's valid classes;
//! - **invalid cases**: for each parameter in turn, one case per invalid class
//!   of that parameter, with every other parameter pinned to its first valid
//!   class. The invalid output grows linearly with the number of invalid
//!   classes instead of multiplying them.
//!
//! # Example
//!
//! ```
//! use casegen::partition::{EquivalenceClass, EquivalencePartition, Parameter};
//! use serde_json::json;
//!
//! let engine = EquivalencePartition::new(vec![
//!     Parameter::new("name", vec![
//!         EquivalenceClass::valid("short", json!("bob")),
//!         EquivalenceClass::invalid("empty", json!(" ")),
//!     ]),
//!     Parameter::new("age", vec![
//!         EquivalenceClass::valid("adult", json!(30)),
//!         EquivalenceClass::valid("minor", json!(12)),
//!         EquivalenceClass::invalid("negative", json!(-1)),
//!     ]),
//! ])
//! .unwrap();
//!
//! let cases = engine.build_test_cases().unwrap();
//! assert_eq!(cases.valid.len(), 2);
//! assert_eq!(cases.invalid.len(), 2);
//! ```

mod case;

pub use case::{Assignment, TestCase, TestCases};

pub(crate) use case::CombinationSet;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Smallest number of parameters accepted by [`EquivalencePartition::new`].
pub const MIN_PARAMETERS: usize = 2;

/// A named partition of a parameter's values.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceClass {
    /// Class name, unique within its parameter.
    pub name: String,
    /// Whether values of this class are acceptable input.
    pub valid: bool,
    /// Representative value.
    pub value: Value,
}

impl EquivalenceClass {
    /// Create a class flagged valid.
    #[must_use]
    pub fn valid(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            valid: true,
            value,
        }
    }

    /// Create a class flagged invalid.
    #[must_use]
    pub fn invalid(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            valid: false,
            value,
        }
    }
}

/// An input parameter and its equivalence classes, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Equivalence classes.
    pub classes: Vec<EquivalenceClass>,
}

impl Parameter {
    /// Create a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, classes: Vec<EquivalenceClass>) -> Self {
        Self {
            name: name.into(),
            classes,
        }
    }

    /// Indices of the classes with the given validity flag.
    fn class_indices(&self, valid: bool) -> Vec<usize> {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, class)| class.valid == valid)
            .map(|(index, _)| index)
            .collect()
    }

    fn first_valid(&self) -> Option<usize> {
        self.classes.iter().position(|class| class.valid)
    }

    fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::configuration(format!(
                "parameter `{}` has no equivalence classes",
                self.name
            )));
        }

        let mut names = HashSet::new();
        for class in &self.classes {
            if !names.insert(class.name.as_str()) {
                return Err(Error::configuration(format!(
                    "parameter `{}` declares class `{}` twice",
                    self.name, class.name
                )));
            }
            if class.value.is_null() {
                return Err(Error::configuration(format!(
                    "in `{}`: the value of `{}` is null",
                    self.name, class.name
                )));
            }
            if class.value.as_str() == Some("") {
                return Err(Error::configuration(format!(
                    "in `{}`: the value of `{}` is empty",
                    self.name, class.name
                )));
            }
        }
        Ok(())
    }
}

/// Predicate deciding whether a generated case is kept.
pub type CaseFilter = Arc<dyn Fn(&TestCase) -> bool + Send + Sync>;

/// Chooses the candidate classes of a parameter at a given recursion depth.
type ClassChoice<'a> = dyn Fn(&Parameter, usize) -> Result<Vec<usize>> + 'a;

/// Equivalence partition test case generator.
#[derive(Clone)]
pub struct EquivalencePartition {
    parameters: Vec<Parameter>,
    filter: CaseFilter,
}

impl EquivalencePartition {
    /// Create a generator over at least [`MIN_PARAMETERS`] parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if fewer than two parameters are given,
    /// a parameter name repeats, a parameter has no classes, or a class value
    /// is null or an empty string.
    pub fn new(parameters: Vec<Parameter>) -> Result<Self> {
        Self::with_min_parameters(parameters, MIN_PARAMETERS)
    }

    /// Create a generator accepting as few as `min` parameters.
    pub(crate) fn with_min_parameters(parameters: Vec<Parameter>, min: usize) -> Result<Self> {
        if parameters.len() < min {
            return Err(Error::configuration(format!(
                "at least {min} parameters are required, got {}",
                parameters.len()
            )));
        }

        let mut names = HashSet::new();
        for parameter in &parameters {
            if !names.insert(parameter.name.as_str()) {
                return Err(Error::configuration(format!(
                    "parameter `{}` is declared twice",
                    parameter.name
                )));
            }
            parameter.validate()?;
        }

        Ok(Self {
            parameters,
            filter: Arc::new(|_| true),
        })
    }

    /// Create a generator from decoded JSON of the form
    /// `{ parameter: { class: { "valid": bool, "value": any } } }`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the document has the wrong shape or
    /// violates the rules of [`EquivalencePartition::new`].
    pub fn from_json(parameters: &Value) -> Result<Self> {
        Self::new(parse_parameters(parameters)?)
    }

    /// Keep only the cases accepted by `filter`.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&TestCase) -> bool + Send + Sync + 'static,
    {
        self.filter = Arc::new(filter);
        self
    }

    /// The parameters, in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Generate the valid and invalid test cases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] wrapping the cause if generation fails,
    /// e.g. when an invalid case needs a valid class of a parameter that has none.
    pub fn build_test_cases(&self) -> Result<TestCases> {
        self.generate().map_err(Error::generation)
    }

    fn generate(&self) -> Result<TestCases> {
        debug!(
            "equivalence partition over {} parameters",
            self.parameters.len()
        );

        let valid = self.valid_combinations()?;
        let invalid = self.invalid_combinations()?;

        let cases = TestCases {
            valid: self.materialize(&valid),
            invalid: self.materialize(&invalid),
        };

        debug!(
            "generated {} valid and {} invalid cases ({} and {} before filtering)",
            cases.valid.len(),
            cases.invalid.len(),
            valid.len(),
            invalid.len()
        );
        Ok(cases)
    }

    fn valid_combinations(&self) -> Result<CombinationSet> {
        let order: Vec<usize> = (0..self.parameters.len()).collect();
        let mut combinations = CombinationSet::default();
        let mut current = vec![0; self.parameters.len()];

        self.combine(
            &order,
            0,
            &mut current,
            &mut combinations,
            &|parameter, _| Ok(parameter.class_indices(true)),
        )?;
        Ok(combinations)
    }

    fn invalid_combinations(&self) -> Result<CombinationSet> {
        let order: Vec<usize> = (0..self.parameters.len()).collect();
        let mut combinations = CombinationSet::default();
        let mut current = vec![0; self.parameters.len()];

        // The head of each rotation is the parameter taking invalid classes.
        let choice = |parameter: &Parameter, depth: usize| {
            if depth == 0 {
                return Ok(parameter.class_indices(false));
            }
            parameter.first_valid().map(|index| vec![index]).ok_or_else(|| {
                Error::configuration(format!(
                    "parameter `{}` has no valid equivalence class",
                    parameter.name
                ))
            })
        };

        for shift in 0..order.len() {
            let rotated = rotation(&order, shift);
            self.combine(&rotated, 0, &mut current, &mut combinations, &choice)?;
        }
        Ok(combinations)
    }

    /// Depth-first product over `order`; `current` is indexed by parameter position.
    fn combine(
        &self,
        order: &[usize],
        depth: usize,
        current: &mut Vec<usize>,
        combinations: &mut CombinationSet,
        choice: &ClassChoice<'_>,
    ) -> Result<()> {
        let Some(&position) = order.get(depth) else {
            combinations.insert(current);
            return Ok(());
        };

        for class in choice(&self.parameters[position], depth)? {
            current[position] = class;
            self.combine(order, depth + 1, current, combinations, choice)?;
        }
        Ok(())
    }

    fn materialize(&self, combinations: &CombinationSet) -> Vec<TestCase> {
        combinations
            .iter()
            .map(|combination| {
                let mut case = TestCase::new();
                for (parameter, &class) in self.parameters.iter().zip(combination) {
                    let class = &parameter.classes[class];
                    case.push(
                        parameter.name.clone(),
                        Assignment {
                            equivalence_class: class.name.clone(),
                            value: class.value.clone(),
                        },
                    );
                }
                case
            })
            .filter(|case| (self.filter)(case))
            .collect()
    }
}

impl fmt::Debug for EquivalencePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquivalencePartition")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// `order` rotated left by `shift` positions.
fn rotation(order: &[usize], shift: usize) -> Vec<usize> {
    let mut rotated = order.to_vec();
    if !rotated.is_empty() {
        rotated.rotate_left(shift % order.len());
    }
    rotated
}

/// Decode `{ parameter: { class: { "valid": bool, "value": any } } }`.
fn parse_parameters(document: &Value) -> Result<Vec<Parameter>> {
    let parameters = document
        .as_object()
        .ok_or_else(|| Error::configuration("parameters must be an object"))?;

    parameters
        .iter()
        .map(|(name, classes)| {
            let classes = classes.as_object().ok_or_else(|| {
                Error::configuration(format!(
                    "`{name}` must map equivalence class names to classes"
                ))
            })?;
            let classes = classes
                .iter()
                .map(|(class_name, class)| parse_class(name, class_name, class))
                .collect::<Result<Vec<_>>>()?;
            Ok(Parameter::new(name.clone(), classes))
        })
        .collect()
}

fn parse_class(parameter: &str, name: &str, class: &Value) -> Result<EquivalenceClass> {
    let fields: &Map<String, Value> = class.as_object().ok_or_else(|| {
        Error::configuration(format!("in `{parameter}`: class `{name}` must be an object"))
    })?;

    let valid = match fields.get("valid") {
        None | Some(Value::Null) => {
            return Err(Error::configuration(format!(
                "in `{parameter}`: the validity flag of `{name}` is missing"
            )))
        }
        Some(Value::Bool(valid)) => *valid,
        Some(_) => {
            return Err(Error::configuration(format!(
                "in `{parameter}`: the validity flag of `{name}` is not a boolean"
            )))
        }
    };

    let value = fields.get("value").cloned().unwrap_or(Value::Null);
    Ok(EquivalenceClass {
        name: name.to_string(),
        valid,
        value,
    })
}
