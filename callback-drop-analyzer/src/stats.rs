//! Descriptive column statistics
//!
//! Same fields as a dataframe `describe()`: count, mean, sample standard
//! deviation, min, quartiles and max.

use serde::Serialize;

/// Summary statistics over one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); `None` below two values
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl ColumnStats {
    /// Describe a column; `None` when it is empty
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let sum_sq: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        });

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: percentile(&sorted, 0.25),
            p50: percentile(&sorted, 0.50),
            p75: percentile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

/// Linearly interpolated percentile of sorted, non-empty data
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * weight
    }
}
