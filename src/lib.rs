//! # casegen
//!
//! Black-box test case generation with three classic techniques:
//!
//! - **Equivalence partitioning** ([`partition`]): parameters are split into
//!   named classes of valid and invalid values. Valid cases cover every
//!   combination of valid classes; invalid cases flip one parameter at a
//!   time to each of its invalid classes.
//! - **Limit value analysis** ([`limits`]): the valid range of a parameter is
//!   given as a predicate over `x`, e.g. `1 <= x <= 10^6 and x % 10000 != 0`.
//!   A stepped search finds the values at and just outside its edges, which
//!   then feed equivalence partitioning.
//! - **Orthogonal arrays** ([`oa`]): candidate values are laid out on a
//!   catalogued Taguchi design ([`catalogue`]) so every pair of values is
//!   covered with far fewer cases than the full product.
//!
//! ## Quick Start
//!
//! ```rust
//! use casegen::partition::EquivalencePartition;
//! use serde_json::json;
//!
//! let ep = EquivalencePartition::from_json(&json!({
//!     "param1": {
//!         "c1": { "valid": true, "value": "value1" },
//!         "c2": { "valid": false, "value": 1 }
//!     },
//!     "param2": {
//!         "c1": { "valid": true, "value": [1, 2, 3] },
//!         "c2": { "valid": false, "value": -1 }
//!     }
//! }))
//! .unwrap();
//!
//! let cases = ep.build_test_cases().unwrap();
//! assert_eq!(cases.valid.len(), 1);
//! assert_eq!(cases.invalid.len(), 2);
//! ```
//!
//! The [`technique`] module dispatches on the technique codes `EP`, `LVA`
//! and `OA` and wraps outcomes in a JSON response envelope.
//!
//! ## Features
//!
//! - `parallel`: search limit value parameters on the rayon pool
//! - `cli`: build the `casegen` command-line tool

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalogue;
pub mod config;
pub mod error;
pub mod limits;
pub mod oa;
pub mod partition;
pub mod technique;
pub mod utils;

#[cfg(feature = "parallel")]
pub mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::catalogue::{Catalogue, Design};
    pub use crate::config::{GeneratorConfig, LimitsConfig, OrthogonalConfig};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::limits::{LimitParameter, LimitSet, LimitValueAnalysis, Limits, Predicate};
    pub use crate::oa::{BalanceReport, Factor, OrthogonalArray, OrthogonalCases};
    pub use crate::partition::{
        Assignment, EquivalenceClass, EquivalencePartition, Parameter, TestCase, TestCases,
    };
    pub use crate::technique::{Generator, Report, Technique};
}

// Re-export commonly used items at crate root
pub use error::{Error, ErrorKind, Result};
pub use limits::LimitValueAnalysis;
pub use oa::OrthogonalArray;
pub use partition::EquivalencePartition;
pub use technique::{Generator, Report, Technique};
