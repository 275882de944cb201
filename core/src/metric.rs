//! Explicitly tagged numeric values.
//!
//! RULE: a value that is mathematically undefined (DSCR with no debt
//! service, a percentile over too few samples, a probability with no
//! completed trials) is `Metric::Undefined`. It is never encoded as 0,
//! NaN or infinity, so it cannot leak into sorts or means.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Defined(f64),
    Undefined,
}

impl Metric {
    /// `numerator / denominator`, undefined when the denominator is not
    /// strictly positive or the result is not finite.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator <= 0.0 || !denominator.is_finite() {
            return Metric::Undefined;
        }
        let value = numerator / denominator;
        if value.is_finite() {
            Metric::Defined(value)
        } else {
            Metric::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(*v),
            Metric::Undefined  => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Metric::Defined(v),
            _ => Metric::Undefined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_is_undefined() {
        assert_eq!(Metric::ratio(1_000.0, 0.0), Metric::Undefined);
        assert_eq!(Metric::ratio(-50.0, 0.0), Metric::Undefined);
    }

    #[test]
    fn negative_numerator_stays_defined() {
        assert_eq!(Metric::ratio(-500.0, 1_000.0), Metric::Defined(-0.5));
    }
}
