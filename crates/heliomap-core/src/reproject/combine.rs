use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-pixel rule for merging reprojected maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineRule {
    /// Mean of the valid contributions.
    #[default]
    Mean,
    /// Median of the valid contributions.
    Median,
    /// Sum of the valid contributions.
    Sum,
}

impl fmt::Display for CombineRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineRule::Mean => write!(f, "Mean"),
            CombineRule::Median => write!(f, "Median"),
            CombineRule::Sum => write!(f, "Sum"),
        }
    }
}

impl CombineRule {
    /// Combine the non-NaN entries of `values`, reordering the slice in the
    /// process. `None` when no entry is valid.
    pub fn combine(self, values: &mut Vec<f32>) -> Option<f32> {
        values.retain(|v| !v.is_nan());
        let n = values.len();
        if n == 0 {
            return None;
        }
        if self == CombineRule::Median {
            return Some(compute_median(values));
        }
        let sum: f64 = values.iter().map(|&v| v as f64).sum();
        Some(match self {
            CombineRule::Mean => (sum / n as f64) as f32,
            _ => sum as f32,
        })
    }
}

fn compute_median(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        *values.select_nth_unstable_by(n / 2, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (values[mid - 1] + values[mid]) / 2.0
    }
}
