//! Orthogonal array test-case generation.
//!
//! Each parameter lists its candidate values. The engine picks the smallest
//! catalogued design whose level count equals the largest candidate list
//! and which has a column for every parameter, then reads one test case per
//! design row.
//!
//! Parameters are assigned to columns in order of decreasing candidate
//! count. A parameter with fewer candidates than the design has levels
//! cannot use every level directly: rows asking for a missing level draw the
//! parameter's values round-robin instead, so overflow rows stay balanced.
//!
//! ```
//! use casegen::oa::OrthogonalArray;
//! use serde_json::json;
//!
//! let oa = OrthogonalArray::from_json(&json!({
//!     "param1": ["A", "B"],
//!     "param2": [1, 2],
//!     "param3": ["value1"],
//! }))
//! .unwrap();
//!
//! let cases = oa.build_test_cases().unwrap();
//! assert_eq!(cases.design(), "L4");
//! assert_eq!(
//!     serde_json::to_value(&cases).unwrap()["array"],
//!     json!([["A", 1, "value1"], ["A", 2, "value1"], ["B", 1, "value1"], ["B", 2, "value1"]])
//! );
//! ```

mod stats;

pub use stats::BalanceReport;

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt::Write as _;
use std::sync::Arc;

use log::debug;
use ndarray::Array2;
use serde::Serialize;
use serde_json::Value;

use crate::catalogue::{Catalogue, Design};
use crate::error::{Error, Result};

/// A parameter and its candidate values.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    /// Parameter name.
    pub name: String,
    /// Candidate values, in preference order.
    pub values: Vec<Value>,
}

impl Factor {
    /// Create a factor.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_value("parameter names must not be empty"));
        }
        if self.values.is_empty() {
            return Err(Error::invalid_value(format!(
                "parameter `{}` needs at least one value",
                self.name
            )));
        }
        if self.values.iter().any(Value::is_null) {
            return Err(Error::invalid_value(format!(
                "values of `{}` must not be null",
                self.name
            )));
        }
        Ok(())
    }
}

/// Orthogonal array engine.
#[derive(Debug, Clone)]
pub struct OrthogonalArray {
    factors: Vec<Factor>,
    catalogue: Arc<Catalogue>,
}

impl OrthogonalArray {
    /// Create an engine over the standard catalogue.
    ///
    /// # Errors
    ///
    /// See [`OrthogonalArray::with_catalogue`]; also fails with
    /// [`Error::Catalogue`] if the standard catalogue cannot be loaded.
    pub fn new(factors: Vec<Factor>) -> Result<Self> {
        Self::with_catalogue(factors, Catalogue::standard()?)
    }

    /// Create an engine over a given catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if no factor is given, a name is empty
    /// or repeated, or a factor has no values or a null value.
    pub fn with_catalogue(factors: Vec<Factor>, catalogue: Arc<Catalogue>) -> Result<Self> {
        if factors.is_empty() {
            return Err(Error::invalid_value(
                "orthogonal array requires at least one parameter",
            ));
        }
        let mut names = HashSet::new();
        for factor in &factors {
            factor.validate()?;
            if !names.insert(factor.name.as_str()) {
                return Err(Error::invalid_value(format!(
                    "duplicate parameter `{}`",
                    factor.name
                )));
            }
        }
        Ok(Self { factors, catalogue })
    }

    /// Create an engine over the standard catalogue from a JSON map of
    /// `{ name: [value, ...] }`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the document is not an object or an
    /// entry is not a non-empty array of non-null values.
    pub fn from_json(parameters: &Value) -> Result<Self> {
        Self::from_json_with_catalogue(parameters, Catalogue::standard()?)
    }

    /// Like [`OrthogonalArray::from_json`], over a given catalogue.
    ///
    /// # Errors
    ///
    /// See [`OrthogonalArray::from_json`].
    pub fn from_json_with_catalogue(parameters: &Value, catalogue: Arc<Catalogue>) -> Result<Self> {
        let map = parameters
            .as_object()
            .ok_or_else(|| Error::invalid_value("orthogonal array parameters must be an object"))?;
        let factors = map
            .iter()
            .map(|(name, values)| {
                let values = values.as_array().ok_or_else(|| {
                    Error::invalid_value(format!("the value of `{name}` is not a list"))
                })?;
                Ok(Factor::new(name.clone(), values.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::with_catalogue(factors, catalogue)
    }

    /// The factors, in declaration order.
    #[must_use]
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Level signature of the request, e.g. `L(3^2 2^1)` for two parameters
    /// with three values and one with two.
    #[must_use]
    pub fn signature(&self) -> String {
        let mut counts: BTreeMap<Reverse<usize>, usize> = BTreeMap::new();
        for factor in &self.factors {
            *counts.entry(Reverse(factor.values.len())).or_insert(0) += 1;
        }
        let mut signature = String::from("L(");
        for (i, (Reverse(levels), count)) in counts.into_iter().enumerate() {
            if i > 0 {
                signature.push(' ');
            }
            let _ = write!(signature, "{levels}^{count}");
        }
        signature.push(')');
        signature
    }

    /// Select a design and fill it with parameter values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] wrapping [`Error::NoAdequateDesign`] if
    /// no catalogued design fits.
    pub fn build_test_cases(&self) -> Result<OrthogonalCases> {
        self.generate().map_err(Error::generation)
    }

    fn generate(&self) -> Result<OrthogonalCases> {
        let max_level = self
            .factors
            .iter()
            .map(|f| f.values.len())
            .max()
            .unwrap_or(0);
        let design = u32::try_from(max_level)
            .ok()
            .and_then(|levels| self.catalogue.select(levels, self.factors.len()))
            .ok_or_else(|| Error::NoAdequateDesign {
                signature: self.signature(),
            })?;
        debug!(
            "selected {} ({} runs) for {}",
            design.name(),
            design.runs(),
            self.signature()
        );

        let mut order: Vec<usize> = (0..self.factors.len()).collect();
        order.sort_by_key(|&i| Reverse(self.factors[i].values.len()));

        let indices = fill(design, &order, &self.factors);
        let array = indices
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&order)
                    .map(|(&value, &factor)| self.factors[factor].values[value].clone())
                    .collect()
            })
            .collect();

        Ok(OrthogonalCases {
            design: design.name().to_string(),
            keys: order
                .iter()
                .map(|&i| self.factors[i].name.clone())
                .collect(),
            array,
            indices,
            candidates: order
                .iter()
                .map(|&i| self.factors[i].values.len())
                .collect(),
        })
    }
}

/// Map design levels to candidate indices, column by column.
///
/// Column `c` of the result belongs to `factors[order[c]]`.
fn fill(design: &Design, order: &[usize], factors: &[Factor]) -> Array2<usize> {
    let mut indices = Array2::zeros((design.runs(), order.len()));
    for (col, &factor) in order.iter().enumerate() {
        let candidates = factors[factor].values.len();
        let mut overflow: VecDeque<usize> = (0..candidates).collect();
        for row in 0..design.runs() {
            let level = (design.get(row, col) - 1) as usize;
            indices[[row, col]] = if level < candidates {
                level
            } else {
                // Round-robin over the candidates; the queue is never empty.
                let next = overflow.pop_front().unwrap_or(0);
                overflow.push_back(next);
                next
            };
        }
    }
    indices
}

/// Test cases read from an orthogonal design.
///
/// Serializes as `{ "L": design, "keys": [...], "array": [[...], ...] }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrthogonalCases {
    #[serde(rename = "L")]
    design: String,
    keys: Vec<String>,
    array: Vec<Vec<Value>>,
    #[serde(skip)]
    indices: Array2<usize>,
    #[serde(skip)]
    candidates: Vec<usize>,
}

impl OrthogonalCases {
    /// Name of the selected design.
    #[must_use]
    pub fn design(&self) -> &str {
        &self.design
    }

    /// Parameter names, one per column.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The test cases, one row per design run.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.array
    }

    /// Number of test cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Whether no case was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Candidate index of every cell, aligned with [`OrthogonalCases::rows`].
    #[must_use]
    pub fn indices(&self) -> &Array2<usize> {
        &self.indices
    }
}
