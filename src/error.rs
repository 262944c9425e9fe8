//! Error types for the casegen library.
//!
//! This module provides error handling using the `thiserror` crate, with
//! specific variants for parameter validation, predicate parsing, boundary
//! search, design lookup and catalogue loading.

use std::fmt;

use thiserror::Error;

/// The main error type for the casegen library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Parameter Validation Errors ============
    /// A parameter map is malformed (wrong shape, empty collections, null values).
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of what is invalid.
        message: String,
    },

    /// A required key is absent from a parameter entry.
    #[error("parameter `{parameter}` is missing required key `{key}`")]
    MissingKey {
        /// The parameter whose entry is incomplete.
        parameter: String,
        /// The missing key.
        key: &'static str,
    },

    /// A parameter field has the wrong type.
    #[error("parameter `{parameter}`: {message}")]
    WrongType {
        /// The offending parameter.
        parameter: String,
        /// Description of the expected type.
        message: String,
    },

    /// A value is structurally well-typed but not acceptable.
    #[error("invalid value: {message}")]
    InvalidValue {
        /// Description of what is invalid.
        message: String,
    },

    /// A predicate could not be parsed.
    #[error("predicate of `{parameter}` has invalid syntax at offset {position}: {message}")]
    Syntax {
        /// The parameter owning the predicate.
        parameter: String,
        /// Byte offset in the predicate text.
        position: usize,
        /// Parser diagnostic.
        message: String,
    },

    // ============ Generation Errors ============
    /// No catalogued design matches the requested levels and factor count.
    #[error("no orthogonal array available for {signature}")]
    NoAdequateDesign {
        /// The `levels^count` signature of the request, e.g. `L(3^2 2^1)`.
        signature: String,
    },

    /// The boundary search of a parameter exceeded its wall-clock budget.
    #[error("boundary search for `{parameter}` exceeded the {budget_ms} ms budget")]
    Timeout {
        /// The parameter being searched.
        parameter: String,
        /// The budget that was exceeded, in milliseconds.
        budget_ms: u64,
    },

    /// The predicate never holds inside the scanned interval.
    #[error("predicate of `{parameter}` never holds between {min} and {max}")]
    BoundaryNotFound {
        /// The parameter being searched.
        parameter: String,
        /// Lower end of the scanned interval.
        min: String,
        /// Upper end of the scanned interval.
        max: String,
    },

    /// A predicate failed while being evaluated.
    #[error("evaluating predicate of `{parameter}` failed: {message}")]
    Evaluation {
        /// The parameter owning the predicate.
        parameter: String,
        /// Description of the failure.
        message: String,
    },

    /// Wraps any failure raised while generating test cases.
    #[error("error generating test cases: {source}")]
    Generation {
        /// The underlying cause.
        source: Box<Error>,
    },

    // ============ Data Errors ============
    /// The orthogonal design dataset is malformed.
    #[error("invalid design catalogue: {message}")]
    Catalogue {
        /// Description of what is invalid.
        message: String,
    },

    /// Engine settings could not be loaded or are inconsistent.
    #[error("invalid settings: {message}")]
    Settings {
        /// Description of what is invalid.
        message: String,
    },
}

/// A specialized `Result` type for casegen operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`], for callers that map failures to
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed parameter map.
    Configuration,
    /// Missing required key.
    Validation,
    /// Wrong field type.
    Type,
    /// Unacceptable value.
    Value,
    /// Unparsable predicate.
    Syntax,
    /// No matching design.
    Lookup,
    /// Search budget exceeded.
    Timeout,
    /// Predicate never holds in range.
    Assertion,
    /// Predicate runtime failure.
    Evaluation,
    /// Generation-time failure wrapping another error.
    Generation,
    /// Malformed design dataset.
    Catalogue,
    /// Malformed settings.
    Settings,
}

impl ErrorKind {
    /// The conventional name of this kind, e.g. `"ConfigurationError"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::Validation => "ValidationError",
            Self::Type => "TypeError",
            Self::Value => "ValueError",
            Self::Syntax => "SyntaxError",
            Self::Lookup => "LookupError",
            Self::Timeout => "TimeoutError",
            Self::Assertion => "AssertionError",
            Self::Evaluation => "EvaluationError",
            Self::Generation => "GenerationError",
            Self::Catalogue => "CatalogueError",
            Self::Settings => "SettingsError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Error {
    /// Create a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Create a new `WrongType` error.
    #[must_use]
    pub fn wrong_type(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WrongType {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new `Catalogue` error.
    #[must_use]
    pub fn catalogue(message: impl Into<String>) -> Self {
        Self::Catalogue {
            message: message.into(),
        }
    }

    /// Create a new `Settings` error.
    #[must_use]
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// Wrap an error raised during case generation.
    ///
    /// Errors that are already wrapped are returned unchanged.
    #[must_use]
    pub fn generation(source: Self) -> Self {
        match source {
            Self::Generation { .. } => source,
            other => Self::Generation {
                source: Box::new(other),
            },
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::MissingKey { .. } => ErrorKind::Validation,
            Self::WrongType { .. } => ErrorKind::Type,
            Self::InvalidValue { .. } => ErrorKind::Value,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::NoAdequateDesign { .. } => ErrorKind::Lookup,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::BoundaryNotFound { .. } => ErrorKind::Assertion,
            Self::Evaluation { .. } => ErrorKind::Evaluation,
            Self::Generation { .. } => ErrorKind::Generation,
            Self::Catalogue { .. } => ErrorKind::Catalogue,
            Self::Settings { .. } => ErrorKind::Settings,
        }
    }

    /// The innermost cause of this error, looking through `Generation`.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Generation { source } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingKey {
            parameter: "age".to_string(),
            key: "step",
        };
        assert!(err.to_string().contains("age"));
        assert!(err.to_string().contains("step"));

        let err = Error::Timeout {
            parameter: "age".to_string(),
            budget_ms: 4000,
        };
        assert!(err.to_string().contains("4000 ms"));

        let err = Error::NoAdequateDesign {
            signature: "L(10^13)".to_string(),
        };
        assert!(err.to_string().contains("L(10^13)"));
    }

    #[test]
    fn test_generation_surfaces_cause() {
        let cause = Error::configuration("parameter `b` has no valid equivalence class");
        let err = Error::generation(cause.clone());

        assert_eq!(err.kind(), ErrorKind::Generation);
        assert!(err.to_string().contains("no valid equivalence class"));
        assert_eq!(err.root_cause(), &cause);

        // Wrapping twice does not nest.
        assert_eq!(Error::generation(err.clone()), err);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Syntax.to_string(), "SyntaxError");
        assert_eq!(Error::invalid_value("x").kind(), ErrorKind::Value);
        assert_eq!(Error::wrong_type("p", "x").kind(), ErrorKind::Type);
    }
}
