//! Limit value analysis.
//!
//! Each parameter is described by a predicate over `x` and a step. The
//! engine derives a coarse interval from the numeric literals of the
//! predicate, then walks it to find the seven boundary values of the valid
//! region: two just inside each end, one near the middle, and one just
//! outside each end.
//!
//! ```
//! use casegen::limits::LimitValueAnalysis;
//! use serde_json::json;
//!
//! let lva = LimitValueAnalysis::from_json(&json!({
//!     "amount": { "predicate": "x >= 100 and x <= 10000 and x % 100 == 0", "step": 1 }
//! }))
//! .unwrap();
//!
//! let limits = lva.build_limits().unwrap();
//! let amount = limits.get("amount").unwrap();
//! assert_eq!(amount.first_min, 100.0);
//! assert_eq!(amount.invalid_max, 10001.0);
//!
//! let cases = lva.build_test_cases().unwrap();
//! assert_eq!(cases.valid.len(), 5);
//! assert_eq!(cases.invalid.len(), 2);
//! ```

pub mod predicate;
mod search;

use std::collections::HashSet;

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

pub use predicate::{Predicate, PredicateError};
pub use search::{coarse_interval, LimitSet, Step, LIMIT_KEYS};

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::partition::{EquivalenceClass, EquivalencePartition, Parameter, TestCases};
use search::{BoundarySearch, Deadline};

/// Accepted names of the predicate key; the first is canonical.
const PREDICATE_KEYS: [&str; 2] = ["predicate", "lambda"];
/// Accepted names of the step key; the first is canonical.
const STEP_KEYS: [&str; 2] = ["step", "delta"];

/// Unvalidated description of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitParameter {
    /// Parameter name.
    pub name: String,
    /// Predicate text over `x`.
    pub predicate: String,
    /// Search increment.
    pub step: f64,
}

impl LimitParameter {
    /// Describe a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, predicate: impl Into<String>, step: f64) -> Self {
        Self {
            name: name.into(),
            predicate: predicate.into(),
            step,
        }
    }
}

/// A validated parameter: parsed predicate and usable step.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundedParameter {
    pub(crate) name: String,
    pub(crate) predicate: Predicate,
    pub(crate) step: Step,
}

/// Limit value analysis engine.
#[derive(Debug, Clone)]
pub struct LimitValueAnalysis {
    parameters: Vec<BoundedParameter>,
    settings: LimitsConfig,
}

impl LimitValueAnalysis {
    /// Create an engine with default settings.
    ///
    /// # Errors
    ///
    /// See [`LimitValueAnalysis::with_settings`].
    pub fn new(parameters: Vec<LimitParameter>) -> Result<Self> {
        Self::with_settings(parameters, LimitsConfig::default())
    }

    /// Create an engine with explicit settings.
    ///
    /// # Errors
    ///
    /// - [`Error::Settings`] if `settings` are unusable.
    /// - [`Error::Configuration`] if no parameter is given or names repeat.
    /// - [`Error::InvalidValue`] if a predicate is shorter than
    ///   `settings.min_predicate_len` or a step is not strictly positive.
    /// - [`Error::Syntax`] if a predicate does not parse.
    pub fn with_settings(parameters: Vec<LimitParameter>, settings: LimitsConfig) -> Result<Self> {
        settings.validate()?;
        if parameters.is_empty() {
            return Err(Error::configuration(
                "limit value analysis requires at least one parameter",
            ));
        }

        let mut names = HashSet::new();
        let parameters = parameters
            .into_iter()
            .map(|parameter| {
                if !names.insert(parameter.name.clone()) {
                    return Err(Error::configuration(format!(
                        "duplicate parameter `{}`",
                        parameter.name
                    )));
                }
                validate_parameter(parameter, &settings)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            parameters,
            settings,
        })
    }

    /// Create an engine with default settings from a JSON parameter map of
    /// the form `{ name: { "predicate": str, "step": number } }`.
    ///
    /// # Errors
    ///
    /// See [`LimitValueAnalysis::from_json_with_settings`].
    pub fn from_json(parameters: &Value) -> Result<Self> {
        Self::from_json_with_settings(parameters, LimitsConfig::default())
    }

    /// Create an engine from a JSON parameter map with explicit settings.
    ///
    /// `lambda` and `delta` are accepted in place of `predicate` and `step`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingKey`] if an entry lacks a predicate or a step.
    /// - [`Error::WrongType`] if the predicate is not a string or the step is
    ///   not a number.
    /// - Everything [`LimitValueAnalysis::with_settings`] reports.
    pub fn from_json_with_settings(parameters: &Value, settings: LimitsConfig) -> Result<Self> {
        let map = parameters.as_object().ok_or_else(|| {
            Error::configuration("limit value parameters must be an object of parameter entries")
        })?;
        let parameters = map
            .iter()
            .map(|(name, entry)| parse_parameter(name, entry))
            .collect::<Result<Vec<_>>>()?;
        Self::with_settings(parameters, settings)
    }

    /// Names of the parameters, in declaration order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// The engine settings.
    #[must_use]
    pub fn settings(&self) -> &LimitsConfig {
        &self.settings
    }

    /// Search the boundary values of every parameter.
    ///
    /// Each parameter gets its own time budget. The first failure aborts the
    /// whole call.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if a predicate yields no usable interval.
    /// - [`Error::BoundaryNotFound`] if a predicate never holds in its interval.
    /// - [`Error::Evaluation`] if a predicate fails to evaluate.
    /// - [`Error::Timeout`] if a search exceeds its budget.
    pub fn build_limits(&self) -> Result<Limits> {
        debug!(
            "building limits for {} parameter(s)",
            self.parameters.len()
        );
        let entries = self
            .parameters
            .iter()
            .map(|parameter| Ok((parameter.name.clone(), self.search(parameter)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Limits { entries })
    }

    /// Generate test cases from the boundary values.
    ///
    /// The limits of each parameter become equivalence classes named after
    /// their keys; `invalid_min` and `invalid_max` are the invalid classes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] wrapping any failure of
    /// [`LimitValueAnalysis::build_limits`] or of case generation.
    pub fn build_test_cases(&self) -> Result<TestCases> {
        let limits = self.build_limits().map_err(Error::generation)?;
        limits
            .to_partition()
            .map_err(Error::generation)?
            .build_test_cases()
    }

    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(crate) fn parameters(&self) -> &[BoundedParameter] {
        &self.parameters
    }

    /// Search one parameter under a fresh deadline.
    pub(crate) fn search(&self, parameter: &BoundedParameter) -> Result<LimitSet> {
        let (min, max) = coarse_interval(&parameter.name, &parameter.predicate)?;
        let deadline = Deadline::start(
            self.settings.time_budget(),
            self.settings.deadline_check_interval,
        );
        BoundarySearch::new(&parameter.name, &parameter.predicate, parameter.step, deadline)
            .run(min, max)
    }
}

/// Boundary values of every parameter, in declaration order.
///
/// Serializes as a map from parameter name to [`LimitSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    entries: Vec<(String, LimitSet)>,
}

impl Limits {
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(crate) fn from_entries(entries: Vec<(String, LimitSet)>) -> Self {
        Self { entries }
    }

    /// Boundary values of a parameter.
    #[must_use]
    pub fn get(&self, parameter: &str) -> Option<&LimitSet> {
        self.entries
            .iter()
            .find(|(name, _)| name == parameter)
            .map(|(_, limits)| limits)
    }

    /// Iterate over `(parameter, limits)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LimitSet)> {
        self.entries
            .iter()
            .map(|(name, limits)| (name.as_str(), limits))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameter is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the partition engine whose classes are these boundary values.
    ///
    /// Unset values are left out. A single parameter is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the partition cannot be built.
    pub fn to_partition(&self) -> Result<EquivalencePartition> {
        let parameters = self
            .entries
            .iter()
            .map(|(name, limits)| {
                let classes = limits
                    .entries()
                    .into_iter()
                    .filter_map(|(key, value)| {
                        let value = limits.step().to_json(value?);
                        Some(if LimitSet::is_invalid_key(key) {
                            EquivalenceClass::invalid(key, value)
                        } else {
                            EquivalenceClass::valid(key, value)
                        })
                    })
                    .collect();
                Parameter::new(name.clone(), classes)
            })
            .collect();
        EquivalencePartition::with_min_parameters(parameters, 1)
    }
}

impl Serialize for Limits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, limits) in &self.entries {
            map.serialize_entry(name, limits)?;
        }
        map.end()
    }
}

fn validate_parameter(parameter: LimitParameter, settings: &LimitsConfig) -> Result<BoundedParameter> {
    let LimitParameter {
        name,
        predicate,
        step,
    } = parameter;

    if predicate.chars().count() < settings.min_predicate_len {
        return Err(Error::invalid_value(format!(
            "predicate of `{name}` must be at least {} characters long",
            settings.min_predicate_len
        )));
    }

    let predicate = Predicate::parse(&predicate).map_err(|err| Error::Syntax {
        parameter: name.clone(),
        position: err.position(),
        message: err.to_string(),
    })?;

    let step = Step::new(step).ok_or_else(|| {
        Error::invalid_value(format!(
            "step of `{name}` must be a finite positive number, got {step}"
        ))
    })?;

    Ok(BoundedParameter {
        name,
        predicate,
        step,
    })
}

fn parse_parameter(name: &str, entry: &Value) -> Result<LimitParameter> {
    let entry: &Map<String, Value> = entry.as_object().ok_or_else(|| {
        Error::wrong_type(name, "entry must be an object with `predicate` and `step`")
    })?;

    let predicate = lookup(entry, &PREDICATE_KEYS).ok_or_else(|| Error::MissingKey {
        parameter: name.to_string(),
        key: PREDICATE_KEYS[0],
    })?;
    let predicate = predicate
        .as_str()
        .ok_or_else(|| Error::wrong_type(name, "predicate must be a string"))?;

    let step = lookup(entry, &STEP_KEYS).ok_or_else(|| Error::MissingKey {
        parameter: name.to_string(),
        key: STEP_KEYS[0],
    })?;
    let step = step
        .as_f64()
        .ok_or_else(|| Error::wrong_type(name, "step must be a number"))?;

    Ok(LimitParameter::new(name, predicate, step))
}

fn lookup<'a>(entry: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| entry.get(*key))
}
