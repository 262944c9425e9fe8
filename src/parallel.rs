//! Parallel boundary search.
//!
//! Enable with the `parallel` feature flag. Every parameter of a limit value
//! analysis is searched on the rayon pool with its own deadline; results keep
//! declaration order.
//!
//! # Usage
//!
//! ```
//! use casegen::limits::LimitValueAnalysis;
//! use serde_json::json;
//!
//! let lva = LimitValueAnalysis::from_json(&json!({
//!     "a": { "predicate": "-1.2<x<=4.3", "step": 0.1 },
//!     "b": { "predicate": "10<=x<=100 and x%2==0", "step": 1 },
//! }))
//! .unwrap();
//!
//! assert_eq!(lva.par_build_limits().unwrap(), lva.build_limits().unwrap());
//! ```
//!
//! # Performance
//!
//! Worth it when several parameters have long searches; for a handful of
//! coarse predicates the sequential version is as fast.

use log::debug;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::limits::{LimitValueAnalysis, Limits};
use crate::partition::TestCases;

impl LimitValueAnalysis {
    /// Parallel version of [`LimitValueAnalysis::build_limits`].
    ///
    /// # Errors
    ///
    /// Fails if any parameter's search fails; see
    /// [`LimitValueAnalysis::build_limits`].
    pub fn par_build_limits(&self) -> Result<Limits> {
        debug!(
            "building limits for {} parameter(s) in parallel",
            self.parameters().len()
        );
        let entries = self
            .parameters()
            .par_iter()
            .map(|parameter| Ok((parameter.name.clone(), self.search(parameter)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Limits::from_entries(entries))
    }

    /// Parallel version of [`LimitValueAnalysis::build_test_cases`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] wrapping the first failure.
    pub fn par_build_test_cases(&self) -> Result<TestCases> {
        let limits = self.par_build_limits().map_err(Error::generation)?;
        limits
            .to_partition()
            .map_err(Error::generation)?
            .build_test_cases()
    }
}
