//! Resampling of maps onto a different WCS.
//!
//! For each destination pixel the engine computes its world coordinate,
//! converts it into the source map's frame, projects it into source pixel
//! space and interpolates. Destination pixels that land outside the source
//! footprint, that have no world position (off-limb directions leaving a
//! helioprojective frame), or that sit on the far side of the Sun from the
//! source observer get the fill value.

pub mod combine;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::PARALLEL_MAP_THRESHOLD;
use crate::coords::coordinate::Coordinate;
use crate::coords::frame::FrameKind;
use crate::coords::transform::{TransformGraph, TransformPlan};
use crate::error::{HelioError, Result};
use crate::interpolate::{self, Interpolation};
use crate::map::generic::GenericMap;
use crate::map::wcs::WcsDescriptor;

pub use combine::CombineRule;

/// Relative slack when deciding whether a point is hidden behind the Sun.
const OCCLUSION_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReprojectConfig {
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub combine: CombineRule,
    /// Value for destination pixels without a valid source sample. NaN when
    /// unset.
    #[serde(default)]
    pub fill: Option<f32>,
}

impl ReprojectConfig {
    pub fn fill_value(&self) -> f32 {
        self.fill.unwrap_or(f32::NAN)
    }
}

/// Reproject `source` onto `dest`.
pub fn reproject(
    source: &GenericMap,
    dest: &WcsDescriptor,
    config: &ReprojectConfig,
) -> Result<GenericMap> {
    let raw = reproject_raw(source, dest, config.interpolation)?;
    let fill = config.fill_value();
    let data = raw.mapv(|v| if v.is_nan() { fill } else { v });

    info!(
        from = %source.frame().kind(),
        to = %dest.frame().kind(),
        width = dest.shape().1,
        height = dest.shape().0,
        interpolation = %config.interpolation,
        "Reprojection complete"
    );
    GenericMap::new(data, dest.clone(), source.meta().clone())
}

/// Reproject every source onto `dest` and merge them pixel by pixel with
/// the configured [`CombineRule`]. Pixels with no valid contribution get the
/// fill value. Metadata is taken from the first source.
pub fn reproject_and_coadd(
    sources: &[GenericMap],
    dest: &WcsDescriptor,
    config: &ReprojectConfig,
) -> Result<GenericMap> {
    reproject_and_coadd_with_progress(sources, dest, config, |_| {})
}

/// Like [`reproject_and_coadd`], calling `progress(done)` as each source
/// finishes.
pub fn reproject_and_coadd_with_progress(
    sources: &[GenericMap],
    dest: &WcsDescriptor,
    config: &ReprojectConfig,
    progress: impl Fn(usize) + Sync,
) -> Result<GenericMap> {
    let first = sources.first().ok_or(HelioError::EmptySequence)?;
    let done = std::sync::atomic::AtomicUsize::new(0);
    let layer = |map: &GenericMap| {
        let raw = reproject_raw(map, dest, config.interpolation);
        let n = done.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        progress(n);
        raw
    };

    let layers: Vec<Array2<f32>> = if sources.len() >= PARALLEL_MAP_THRESHOLD {
        sources.par_iter().map(layer).collect::<Result<_>>()?
    } else {
        sources.iter().map(layer).collect::<Result<_>>()?
    };

    let fill = config.fill_value();
    let rule = config.combine;
    let data = interpolate::render(dest.shape(), |row, col| {
        let mut values: Vec<f32> = layers.iter().map(|l| l[[row, col]]).collect();
        rule.combine(&mut values).unwrap_or(fill)
    });

    info!(
        sources = sources.len(),
        combine = %rule,
        to = %dest.frame().kind(),
        "Coadd complete"
    );
    GenericMap::new(data, dest.clone(), first.meta().clone())
}

/// Reprojected values with NaN marking every invalid destination pixel.
fn reproject_raw(
    source: &GenericMap,
    dest: &WcsDescriptor,
    interpolation: Interpolation,
) -> Result<Array2<f32>> {
    let plan = TransformGraph::builtin()
        .plan(dest.frame(), source.frame())
        .map_err(|e| HelioError::IncompatibleFrame {
            source_kind: source.frame().kind(),
            target_kind: dest.frame().kind(),
            reason: e.to_string(),
        })?;
    debug!(path = ?plan.path(), "Reprojection plan");

    Ok(interpolate::render(dest.shape(), |row, col| {
        sample_destination(source, dest, &plan, interpolation, col as f64, row as f64)
            .unwrap_or(f32::NAN)
    }))
}

fn sample_destination(
    source: &GenericMap,
    dest: &WcsDescriptor,
    plan: &TransformPlan,
    interpolation: Interpolation,
    x: f64,
    y: f64,
) -> Option<f32> {
    let world = dest.pixel_to_world(x, y).ok()?;
    if world.is_nan() {
        return None;
    }
    let local = plan.apply(&world).ok()?;
    if local.is_nan() || is_occluded(&local) {
        return None;
    }
    let pixel = source
        .wcs()
        .world_angles_to_pixel(local.lon()?, local.lat()?);
    if pixel.is_nan() {
        return None;
    }
    interpolate::sample(source.data(), pixel.x, pixel.y, interpolation)
}

/// Whether a helioprojective point lies behind the solar disk as seen by
/// its frame's observer.
fn is_occluded(coord: &Coordinate) -> bool {
    if coord.frame().kind() != FrameKind::Helioprojective {
        return false;
    }
    let (Some(lon), Some(lat), Some(distance)) = (coord.lon(), coord.lat(), coord.radius()) else {
        return false;
    };
    let surface = Coordinate::direction(coord.frame().clone(), lon, lat)
        .map(|c| c.make_3d())
        .ok()
        .and_then(|c| c.radius());
    match surface {
        Some(front) if !front.meters().is_nan() => {
            distance.meters() > front.meters() * (1.0 + OCCLUSION_TOLERANCE)
        }
        _ => false,
    }
}
