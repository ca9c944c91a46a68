//! Resampling kernels shared by rotate, resample and reprojection.
//!
//! Pixel coordinates are 0-based with pixel centres on integers, so the
//! footprint of an `h x w` array spans `[-0.5, w - 0.5] x [-0.5, h - 0.5]`.
//! Samples outside the footprint are `None`; inside it, both kernels only
//! ever return a convex combination of input pixels, so results stay within
//! the input range. A NaN pixel with non-zero weight makes the sample
//! `Some(NaN)`; callers treat NaN and `None` alike as "no valid value".

use std::fmt;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Value of the pixel whose centre is nearest.
    Nearest,
    /// Bilinear weighting of the four surrounding pixel centres, with edge
    /// pixels repeated in the half-pixel border.
    #[default]
    Bilinear,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Nearest => write!(f, "Nearest"),
            Interpolation::Bilinear => write!(f, "Bilinear"),
        }
    }
}

/// Whether `(x, y)` lies within the array footprint.
pub fn in_footprint(data: &Array2<f32>, x: f64, y: f64) -> bool {
    let (h, w) = data.dim();
    x >= -0.5 && y >= -0.5 && x <= w as f64 - 0.5 && y <= h as f64 - 0.5
}

/// Sample `data` at `(x, y)` with the given kernel.
pub fn sample(data: &Array2<f32>, x: f64, y: f64, method: Interpolation) -> Option<f32> {
    match method {
        Interpolation::Nearest => nearest_sample(data, x, y),
        Interpolation::Bilinear => bilinear_sample(data, x, y),
    }
}

pub fn nearest_sample(data: &Array2<f32>, x: f64, y: f64) -> Option<f32> {
    if !in_footprint(data, x, y) {
        return None;
    }
    let (h, w) = data.dim();
    let col = (x.round().max(0.0) as usize).min(w - 1);
    let row = (y.round().max(0.0) as usize).min(h - 1);
    Some(data[[row, col]])
}

pub fn bilinear_sample(data: &Array2<f32>, x: f64, y: f64) -> Option<f32> {
    if !in_footprint(data, x, y) {
        return None;
    }
    let (h, w) = data.dim();

    let xc = x.clamp(0.0, (w - 1) as f64);
    let yc = y.clamp(0.0, (h - 1) as f64);

    let x0 = xc.floor() as usize;
    let y0 = yc.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);

    let fx = (xc - x0 as f64) as f32;
    let fy = (yc - y0 as f64) as f32;

    let v00 = data[[y0, x0]];
    let v10 = data[[y0, x1]];
    let v01 = data[[y1, x0]];
    let v11 = data[[y1, x1]];

    // skip zero-weight neighbours so a NaN there does not leak in
    let term = |v: f32, wgt: f32| if wgt == 0.0 { 0.0 } else { v * wgt };

    Some(
        term(v00, (1.0 - fx) * (1.0 - fy))
            + term(v10, fx * (1.0 - fy))
            + term(v01, (1.0 - fx) * fy)
            + term(v11, fx * fy),
    )
}

/// Build an `h x w` array by evaluating `pixel(row, col)` everywhere.
/// Rows are computed in parallel for large outputs.
pub(crate) fn render<F>(shape: (usize, usize), pixel: F) -> Array2<f32>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    let (h, w) = shape;
    if h * w < PARALLEL_PIXEL_THRESHOLD {
        return Array2::from_shape_fn((h, w), |(row, col)| pixel(row, col));
    }

    let rows: Vec<Vec<f32>> = (0..h)
        .into_par_iter()
        .map(|row| (0..w).map(|col| pixel(row, col)).collect())
        .collect();

    let mut result = Array2::<f32>::zeros((h, w));
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, val) in row_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }
    result
}
