//! Deadline-bounded boundary search.
//!
//! The search walks the coarse interval of a predicate in increments of the
//! parameter's step. Every point is rounded to the decimal precision of the
//! step, so accumulated floating point error never drifts the walk off the
//! step grid.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};

use super::predicate::{evaluate_constant, literal_spans, Predicate};
use crate::error::{Error, Result};

/// Largest magnitude below which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Names of the seven boundary values, in output order.
pub const LIMIT_KEYS: [&str; 7] = [
    "invalid_min",
    "first_min",
    "second_min",
    "middle",
    "first_max",
    "second_max",
    "invalid_max",
];

/// Increment of a boundary search, with the decimal precision derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    value: f64,
    decimals: u32,
}

impl Step {
    /// Create a step, or `None` unless `value` is finite and strictly positive.
    ///
    /// The precision is the number of fractional digits of the shortest
    /// decimal representation of `value`: `0.1` has one, `10` has none.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        let text = value.to_string();
        let decimals = text
            .split_once('.')
            .map_or(0, |(_, fraction)| fraction.len());
        Some(Self {
            value,
            decimals: u32::try_from(decimals).unwrap_or(u32::MAX),
        })
    }

    /// The increment.
    #[must_use]
    pub fn value(self) -> f64 {
        self.value
    }

    /// Fractional digits kept by [`Step::round`].
    #[must_use]
    pub fn decimals(self) -> u32 {
        self.decimals
    }

    /// Round `value` to the precision of the step, ties to even.
    #[must_use]
    pub fn round(self, value: f64) -> f64 {
        let Ok(exponent) = i32::try_from(self.decimals) else {
            return value;
        };
        let scale = 10f64.powi(exponent);
        let rounded = (value * scale).round_ties_even() / scale;
        if rounded.is_finite() {
            rounded
        } else {
            value
        }
    }

    /// JSON rendering of a boundary value: an integer when the step has no
    /// fractional digits and the value is integral, otherwise a float.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn to_json(self, value: f64) -> Value {
        if self.decimals == 0 && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
            return Value::from(value as i64);
        }
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// The seven boundary values of one parameter.
///
/// `second_min`, `middle` and `first_max` are `None` when the search ran out
/// of range before finding them. Serializes as a map keyed by
/// [`LIMIT_KEYS`], with unset values as `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitSet {
    /// One step below `first_min`; expected to violate the predicate.
    pub invalid_min: f64,
    /// Lowest point of the interval where the predicate holds.
    pub first_min: f64,
    /// Next holding point above `first_min`.
    pub second_min: Option<f64>,
    /// A holding point near the middle of the interval.
    pub middle: Option<f64>,
    /// Next holding point below `second_max`.
    pub first_max: Option<f64>,
    /// Highest point of the interval where the predicate holds.
    pub second_max: f64,
    /// One step above `second_max`; expected to violate the predicate.
    pub invalid_max: f64,
    step: Step,
}

impl LimitSet {
    /// The step the set was searched with.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// `(key, value)` pairs in output order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, Option<f64>); 7] {
        [
            (LIMIT_KEYS[0], Some(self.invalid_min)),
            (LIMIT_KEYS[1], Some(self.first_min)),
            (LIMIT_KEYS[2], self.second_min),
            (LIMIT_KEYS[3], self.middle),
            (LIMIT_KEYS[4], self.first_max),
            (LIMIT_KEYS[5], Some(self.second_max)),
            (LIMIT_KEYS[6], Some(self.invalid_max)),
        ]
    }

    /// Look up a boundary value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == key)
            .and_then(|(_, value)| value)
    }

    /// Whether `key` names one of the two out-of-range values.
    #[must_use]
    pub fn is_invalid_key(key: &str) -> bool {
        key == LIMIT_KEYS[0] || key == LIMIT_KEYS[6]
    }
}

impl Serialize for LimitSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LIMIT_KEYS.len()))?;
        for (key, value) in self.entries() {
            let value = value.map_or(Value::Null, |v| self.step.to_json(v));
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

/// Cooperative wall-clock budget, checked every `check_every` ticks.
#[derive(Debug)]
pub(crate) struct Deadline {
    started: Instant,
    budget: Duration,
    check_every: u32,
    until_check: u32,
}

impl Deadline {
    pub(crate) fn start(budget: Duration, check_every: u32) -> Self {
        let check_every = check_every.max(1);
        Self {
            started: Instant::now(),
            budget,
            check_every,
            until_check: check_every,
        }
    }

    /// Count one iteration; `true` once the budget is exhausted.
    pub(crate) fn tick(&mut self) -> bool {
        self.until_check -= 1;
        if self.until_check > 0 {
            return false;
        }
        self.until_check = self.check_every;
        self.started.elapsed() > self.budget
    }

    pub(crate) fn budget_ms(&self) -> u64 {
        u64::try_from(self.budget.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Coarse `[min, max]` interval of a predicate, from its numeric literals.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] if the predicate holds no literal, a
/// literal fails to evaluate or overflows, or every literal has the same value.
pub fn coarse_interval(parameter: &str, predicate: &Predicate) -> Result<(f64, f64)> {
    let mut bounds: Option<(f64, f64)> = None;
    for span in literal_spans(predicate.source()) {
        let value = evaluate_constant(span).map_err(|err| {
            Error::invalid_value(format!(
                "predicate of `{parameter}`: cannot evaluate `{span}`: {err}"
            ))
        })?;
        if !value.is_finite() {
            return Err(Error::invalid_value(format!(
                "predicate of `{parameter}`: `{span}` is out of range"
            )));
        }
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    match bounds {
        Some((min, max)) if min < max => Ok((min, max)),
        Some(_) => Err(Error::invalid_value(format!(
            "predicate of `{parameter}`: minimum and maximum bounds are equal ({})",
            predicate.source()
        ))),
        None => Err(Error::invalid_value(format!(
            "predicate of `{parameter}` has no numeric bounds ({})",
            predicate.source()
        ))),
    }
}

/// Boundary search of one parameter.
pub(crate) struct BoundarySearch<'a> {
    parameter: &'a str,
    predicate: &'a Predicate,
    step: Step,
    deadline: Deadline,
}

impl<'a> BoundarySearch<'a> {
    pub(crate) fn new(
        parameter: &'a str,
        predicate: &'a Predicate,
        step: Step,
        deadline: Deadline,
    ) -> Self {
        Self {
            parameter,
            predicate,
            step,
            deadline,
        }
    }

    /// Search the coarse interval `[min, max]` for the seven boundary values.
    pub(crate) fn run(mut self, min: f64, max: f64) -> Result<LimitSet> {
        debug!(
            "searching `{}` over [{min}, {max}] with step {}",
            self.parameter,
            self.step.value()
        );
        let step = self.step.value();

        let (first_min, second_min) = self.scan(min, |x| x < max + step, step)?;
        let (second_max, first_max) = self.scan(max, |x| x > min - step, -step)?;

        let (Some(first_min), Some(second_max)) = (first_min, second_max) else {
            warn!(
                "predicate of `{}` never holds in [{min}, {max}]",
                self.parameter
            );
            return Err(Error::BoundaryNotFound {
                parameter: self.parameter.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        };

        let middle = self.midpoint(first_min, second_max, min)?;

        let limits = LimitSet {
            invalid_min: self.step.round(first_min - step),
            first_min,
            second_min,
            middle,
            first_max,
            second_max,
            invalid_max: self.step.round(second_max + step),
            step: self.step,
        };
        debug!("limits of `{}`: {limits:?}", self.parameter);
        Ok(limits)
    }

    /// Walk from `start` by `delta` while `inside` holds, returning the
    /// first two points where the predicate holds.
    fn scan<F>(&mut self, start: f64, inside: F, delta: f64) -> Result<(Option<f64>, Option<f64>)>
    where
        F: Fn(f64) -> bool,
    {
        let mut first = None;
        let mut number = start;
        while inside(number) {
            self.tick()?;
            if self.holds(number)? {
                trace!("`{}` holds at {number}", self.parameter);
                if first.is_some() {
                    return Ok((first, Some(number)));
                }
                first = Some(number);
            }
            number = self.step.round(number + delta);
        }
        Ok((first, None))
    }

    /// Step down from the floored average of the extremes until the
    /// predicate holds, giving up at `min`.
    fn midpoint(&mut self, first_min: f64, second_max: f64, min: f64) -> Result<Option<f64>> {
        let mut number = ((first_min + second_max) / 2.0).floor();
        while number > min {
            self.tick()?;
            if self.holds(number)? {
                return Ok(Some(number));
            }
            number = self.step.round(number - self.step.value());
        }
        Ok(None)
    }

    fn holds(&self, x: f64) -> Result<bool> {
        self.predicate.holds(x).map_err(|err| Error::Evaluation {
            parameter: self.parameter.to_string(),
            message: err.to_string(),
        })
    }

    fn tick(&mut self) -> Result<()> {
        if self.deadline.tick() {
            warn!(
                "boundary search for `{}` ran out of time",
                self.parameter
            );
            return Err(Error::Timeout {
                parameter: self.parameter.to_string(),
                budget_ms: self.deadline.budget_ms(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_log::test;

    fn search(source: &str, step: f64) -> Result<LimitSet> {
        let predicate = Predicate::parse(source).unwrap();
        let (min, max) = coarse_interval("p", &predicate)?;
        let deadline = Deadline::start(Duration::from_secs(4), 256);
        BoundarySearch::new("p", &predicate, Step::new(step).unwrap(), deadline).run(min, max)
    }

    #[test]
    fn test_step_precision() {
        assert_eq!(Step::new(1.0).unwrap().decimals(), 0);
        assert_eq!(Step::new(10.0).unwrap().decimals(), 0);
        assert_eq!(Step::new(0.1).unwrap().decimals(), 1);
        assert_eq!(Step::new(0.25).unwrap().decimals(), 2);
        assert!(Step::new(0.0).is_none());
        assert!(Step::new(-1.0).is_none());
        assert!(Step::new(f64::NAN).is_none());

        let step = Step::new(0.1).unwrap();
        assert_eq!(step.round(-1.2 + 0.1), -1.1);
        assert_eq!(step.round(0.1 + 0.2), 0.3);
    }

    #[test]
    fn test_json_rendering() {
        let whole = Step::new(1.0).unwrap();
        assert_eq!(whole.to_json(99.0), json!(99));
        assert_eq!(whole.to_json(-3.0), json!(-3));

        let fine = Step::new(0.1).unwrap();
        assert_eq!(fine.to_json(1.0), json!(1.0));
        assert_eq!(fine.to_json(-1.1), json!(-1.1));
    }

    #[test]
    fn test_coarse_interval() {
        let predicate = Predicate::parse("1<=x<=10^6 and x%10000!=0").unwrap();
        assert_eq!(coarse_interval("p", &predicate).unwrap(), (0.0, 1_000_000.0));

        let predicate = Predicate::parse("x == 5 or x == 5").unwrap();
        assert!(matches!(
            coarse_interval("p", &predicate).unwrap_err(),
            Error::InvalidValue { .. }
        ));

        let predicate = Predicate::parse("x > x - x").unwrap();
        assert!(coarse_interval("p", &predicate).is_err());
    }

    #[test]
    fn test_coarse_interval_rejects_overflowing_literal() {
        let predicate = Predicate::parse("x >= 0 and x <= 10^400").unwrap();
        let err = coarse_interval("p", &predicate).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert!(err.to_string().contains("10^400"));
    }

    #[test]
    fn test_multiple_of_hundred() {
        let limits = search("x >= 100 and x <= 10000 and x % 100 == 0", 1.0).unwrap();
        assert_eq!(limits.invalid_min, 99.0);
        assert_eq!(limits.first_min, 100.0);
        assert_eq!(limits.second_min, Some(200.0));
        assert_eq!(limits.middle, Some(5000.0));
        assert_eq!(limits.first_max, Some(9900.0));
        assert_eq!(limits.second_max, 10000.0);
        assert_eq!(limits.invalid_max, 10001.0);
    }

    #[test]
    fn test_decimal_step() {
        let limits = search("-1.2<x<=4.3", 0.1).unwrap();
        assert_eq!(limits.invalid_min, -1.2);
        assert_eq!(limits.first_min, -1.1);
        assert_eq!(limits.second_min, Some(-1.0));
        assert_eq!(limits.middle, Some(1.0));
        assert_eq!(limits.first_max, Some(4.2));
        assert_eq!(limits.second_max, 4.3);
        assert_eq!(limits.invalid_max, 4.4);

        let value = serde_json::to_value(limits).unwrap();
        assert_eq!(value["first_min"], json!(-1.1));
        assert_eq!(value["middle"], json!(1.0));
    }

    #[test]
    fn test_even_numbers() {
        let limits = search("10<=x<=100 and x%2==0", 1.0).unwrap();
        let value = serde_json::to_value(limits).unwrap();
        assert_eq!(
            value,
            json!({
                "invalid_min": 9,
                "first_min": 10,
                "second_min": 12,
                "middle": 54,
                "first_max": 98,
                "second_max": 100,
                "invalid_max": 101
            })
        );
    }

    #[test]
    fn test_single_point_leaves_gaps() {
        let limits = search("x == 3 and x < 10", 1.0).unwrap();
        assert_eq!(limits.first_min, 3.0);
        assert_eq!(limits.second_min, None);
        assert_eq!(limits.first_max, None);
        assert_eq!(limits.second_max, 3.0);
        // The midpoint walk stops at the lower end of the interval.
        assert_eq!(limits.middle, None);
        assert_eq!(limits.get("second_min"), None);
        assert_eq!(limits.get("invalid_max"), Some(4.0));

        let value = serde_json::to_value(limits).unwrap();
        assert_eq!(value["second_min"], Value::Null);
        assert_eq!(value["invalid_min"], json!(2));
    }

    #[test]
    fn test_never_holds() {
        let err = search("x > 10 and x < 5", 1.0).unwrap_err();
        assert!(matches!(err, Error::BoundaryNotFound { .. }));
    }

    #[test]
    fn test_division_by_zero_is_evaluation_error() {
        let err = search("x >= 0 and 10 / x > 1", 1.0).unwrap_err();
        assert!(matches!(err, Error::Evaluation { .. }));
    }

    #[test]
    fn test_deadline_aborts_search() {
        let predicate = Predicate::parse("x >= 1 and x <= 10^12 and x % 100000 == 0").unwrap();
        let deadline = Deadline::start(Duration::ZERO, 1);
        let err = BoundarySearch::new("p", &predicate, Step::new(0.1).unwrap(), deadline)
            .run(0.0, 1e12)
            .unwrap_err();
        assert_eq!(
            err,
            Error::Timeout {
                parameter: "p".to_string(),
                budget_ms: 0
            }
        );
    }
}
