//! Explicit numeric coercion
//!
//! Limits, measured values and serial words arrive as loosely typed cells.
//! Coercion never panics or errors; it reports `Unparsable` and lets the
//! caller pick the fallback.

/// Outcome of coercing a value to a number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Value(f64),
    Unparsable,
}

impl Numeric {
    /// NaN is treated as unparsable
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Numeric::Unparsable
        } else {
            Numeric::Value(value)
        }
    }

    pub fn from_opt(value: Option<f64>) -> Self {
        value.map_or(Numeric::Unparsable, Numeric::from_f64)
    }

    pub fn parse(text: &str) -> Self {
        text.trim()
            .parse::<f64>()
            .map_or(Numeric::Unparsable, Numeric::from_f64)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(v),
            Numeric::Unparsable => None,
        }
    }
}

/// True when `value` lies strictly outside `[lo, hi]`
///
/// Any unparsable operand means "not flagged".
pub fn outside_limits(value: Numeric, lo: Numeric, hi: Numeric) -> bool {
    match (value, lo, hi) {
        (Numeric::Value(v), Numeric::Value(lo), Numeric::Value(hi)) => v < lo || v > hi,
        _ => false,
    }
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
