//! Technique dispatch and response envelopes.
//!
//! A [`Generator`] holds the settings and design catalogue shared by every
//! request and runs one technique over a decoded JSON parameter map.
//!
//! ```
//! use casegen::technique::{Generator, Technique};
//! use serde_json::json;
//!
//! let generator = Generator::new().unwrap();
//! let report = generator.report(
//!     "OA".parse::<Technique>().unwrap(),
//!     &json!({ "a": [1, 2], "b": ["x", "y"] }),
//! );
//! let body = serde_json::to_value(&report).unwrap();
//! assert_eq!(body["error"], json!(false));
//! assert_eq!(body["test-cases"]["L"], json!("L4"));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::catalogue::Catalogue;
use crate::config::GeneratorConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::limits::LimitValueAnalysis;
use crate::oa::OrthogonalArray;
use crate::partition::EquivalencePartition;

/// A test-case generation technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technique {
    /// Equivalence partitioning, code `EP`.
    EquivalencePartition,
    /// Limit value analysis, code `LVA`.
    LimitValueAnalysis,
    /// Orthogonal arrays, code `OA`.
    OrthogonalArray,
}

impl Technique {
    /// All techniques.
    pub const ALL: [Self; 3] = [
        Self::EquivalencePartition,
        Self::LimitValueAnalysis,
        Self::OrthogonalArray,
    ];

    /// The short code of the technique.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EquivalencePartition => "EP",
            Self::LimitValueAnalysis => "LVA",
            Self::OrthogonalArray => "OA",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Technique {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|technique| technique.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::configuration(format!("unknown technique `{s}`, expected EP, LVA or OA"))
            })
    }
}

/// Runs techniques with shared settings.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    catalogue: Arc<Catalogue>,
}

impl Generator {
    /// A generator with default settings and the standard catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalogue`] if the standard catalogue cannot be loaded.
    pub fn new() -> Result<Self> {
        Self::with_config(GeneratorConfig::default())
    }

    /// A generator with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] if the settings are inconsistent, or
    /// [`Error::Catalogue`] if the configured catalogue cannot be loaded.
    pub fn with_config(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let catalogue = Catalogue::from_config(&config.orthogonal)?;
        Ok(Self { config, catalogue })
    }

    /// The settings.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The design catalogue used by the orthogonal array technique.
    #[must_use]
    pub fn catalogue(&self) -> &Arc<Catalogue> {
        &self.catalogue
    }

    /// Run a technique and return its output as JSON.
    ///
    /// # Errors
    ///
    /// Returns whatever the technique's constructor or generation reports.
    pub fn generate(&self, technique: Technique, parameters: &Value) -> Result<Value> {
        debug!("running {technique}");
        let output = match technique {
            Technique::EquivalencePartition => {
                to_json(&EquivalencePartition::from_json(parameters)?.build_test_cases()?)?
            }
            Technique::LimitValueAnalysis => to_json(
                &LimitValueAnalysis::from_json_with_settings(
                    parameters,
                    self.config.limits.clone(),
                )?
                .build_test_cases()?,
            )?,
            Technique::OrthogonalArray => to_json(
                &OrthogonalArray::from_json_with_catalogue(parameters, Arc::clone(&self.catalogue))?
                    .build_test_cases()?,
            )?,
        };
        Ok(output)
    }

    /// Run a technique and wrap the outcome, success or failure, in a
    /// [`Report`] with the elapsed time.
    #[must_use]
    pub fn report(&self, technique: Technique, parameters: &Value) -> Report {
        let started = Instant::now();
        let outcome = self.generate(technique, parameters);
        let elapsed = started.elapsed();
        match outcome {
            Ok(test_cases) => Report::Success {
                technique,
                test_cases,
                elapsed,
            },
            Err(error) => Report::Failure { error, elapsed },
        }
    }
}

fn to_json<T: Serialize>(output: &T) -> Result<Value> {
    serde_json::to_value(output).map_err(|err| {
        Error::generation(Error::invalid_value(format!(
            "test cases cannot be encoded as JSON: {err}"
        )))
    })
}

/// Outcome of one generation request.
///
/// Serializes as
/// `{ "error": false, "technique", "test-cases", "elapsed-time" }` or
/// `{ "error": true, "error-kind", "error-message", "elapsed-time" }`, with
/// the elapsed time in seconds formatted to five decimals.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// The technique produced test cases.
    Success {
        /// The technique that ran.
        technique: Technique,
        /// Its output.
        test_cases: Value,
        /// Wall-clock time spent.
        elapsed: Duration,
    },
    /// The technique failed.
    Failure {
        /// The failure.
        error: Error,
        /// Wall-clock time spent.
        elapsed: Duration,
    },
}

impl Report {
    /// Whether the request failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Wall-clock time spent.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Success { elapsed, .. } | Self::Failure { elapsed, .. } => *elapsed,
        }
    }

    /// Kind of the failure's innermost cause, if the request failed.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error.root_cause().kind()),
        }
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let elapsed = format!("{:.5}", self.elapsed().as_secs_f64());
        match self {
            Self::Success {
                technique,
                test_cases,
                ..
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("error", &false)?;
                map.serialize_entry("technique", technique.code())?;
                map.serialize_entry("test-cases", test_cases)?;
                map.serialize_entry("elapsed-time", &elapsed)?;
                map.end()
            }
            Self::Failure { error, .. } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("error", &true)?;
                map.serialize_entry("error-kind", error.root_cause().kind().name())?;
                map.serialize_entry("error-message", &error.to_string())?;
                map.serialize_entry("elapsed-time", &elapsed)?;
                map.end()
            }
        }
    }
}
