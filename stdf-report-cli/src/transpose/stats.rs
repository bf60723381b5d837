//! Row statistics over serial columns

use crate::numeric::round2;

/// Mean, standard deviation and relative standard deviation of a row
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    /// |stddev / mean| rounded to two decimals; missing when mean is 0
    pub stddev_pct: Option<f64>,
}

impl Stats {
    /// Population statistics (divide by n)
    pub fn population(values: &[f64]) -> Self {
        Self::compute(values, 0)
    }

    /// Sample statistics (divide by n - 1); stddev needs two values
    pub fn sample(values: &[f64]) -> Self {
        Self::compute(values, 1)
    }

    fn compute(values: &[f64], ddof: usize) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let stddev = (n > ddof).then(|| {
            let ss: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - ddof) as f64).sqrt()
        });
        let stddev_pct = stddev
            .filter(|_| mean != 0.0)
            .map(|s| round2((s / mean).abs()))
            .filter(|p| p.is_finite());

        Self {
            mean: Some(mean).filter(|m| m.is_finite()),
            stddev: stddev.filter(|s| s.is_finite()),
            stddev_pct,
        }
    }
}
