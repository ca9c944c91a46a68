#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use heliomap_core::coords::Frame;
use heliomap_core::error::HelioError;
use heliomap_core::interpolate::Interpolation;
use heliomap_core::map::{GenericMap, WcsDescriptor};
use heliomap_core::reproject::{reproject, reproject_and_coadd, CombineRule, ReprojectConfig};
use heliomap_core::units::Angle;

use common::{earth_hpc_frame, hpc_map, obstime, ramp, side_observer_frame};

fn hpc_grid(frame: Frame, size: usize, scale_arcsec: f64, center: (f64, f64)) -> WcsDescriptor {
    WcsDescriptor::helioprojective(
        frame,
        (size, size),
        (Angle::from_arcsec(scale_arcsec), Angle::from_arcsec(scale_arcsec)),
        (Angle::from_arcsec(center.0), Angle::from_arcsec(center.1)),
        Angle::ZERO,
    )
    .unwrap()
}

fn constant_map(value: f32, size: usize, scale_arcsec: f64) -> GenericMap {
    hpc_map(Array2::from_elem((size, size), value), scale_arcsec)
}

// ---------------------------------------------------------------------------
// Single map
// ---------------------------------------------------------------------------

#[test]
fn test_reproject_onto_own_grid_is_identity() {
    let map = hpc_map(ramp(32, 32), 4.0);
    let out = reproject(&map, map.wcs(), &ReprojectConfig::default()).unwrap();
    assert_eq!(out.dimensions(), map.dimensions());
    assert_eq!(out.meta(), map.meta());
    for ((r, c), v) in out.data().indexed_iter() {
        assert_abs_diff_eq!(*v, map.data()[[r, c]], epsilon = 1e-3);
    }
}

#[test]
fn test_reproject_large_grid_in_parallel() {
    let map = hpc_map(ramp(300, 300), 2.0);
    let config = ReprojectConfig {
        interpolation: Interpolation::Nearest,
        ..Default::default()
    };
    let out = reproject(&map, map.wcs(), &config).unwrap();
    assert_eq!(out.data(), map.data());
}

#[test]
fn test_interpolated_values_stay_in_source_range() {
    let data = Array2::from_shape_fn((48, 48), |(r, c)| ((r * 7 + c * 13) % 17) as f32);
    let map = hpc_map(data, 4.0);
    let dest = WcsDescriptor::helioprojective(
        earth_hpc_frame(obstime()),
        (40, 40),
        (Angle::from_arcsec(3.0), Angle::from_arcsec(3.0)),
        (Angle::from_arcsec(10.0), Angle::from_arcsec(-5.0)),
        Angle::from_degrees(20.0),
    )
    .unwrap();

    let out = reproject(&map, &dest, &ReprojectConfig::default()).unwrap();
    let finite: Vec<f32> = out.data().iter().copied().filter(|v| v.is_finite()).collect();
    assert!(!finite.is_empty());
    assert!(finite.iter().all(|v| (0.0..=16.0).contains(v)));
}

#[test]
fn test_pixels_outside_source_get_fill_value() {
    let map = constant_map(1.0, 32, 4.0);
    let dest = hpc_grid(earth_hpc_frame(obstime()), 8, 4.0, (5000.0, 0.0));

    let out = reproject(&map, &dest, &ReprojectConfig::default()).unwrap();
    assert!(out.data().iter().all(|v| v.is_nan()));

    let config = ReprojectConfig {
        fill: Some(-5.0),
        ..Default::default()
    };
    let out = reproject(&map, &dest, &config).unwrap();
    assert!(out.data().iter().all(|&v| v == -5.0));
}

#[test]
fn test_far_side_is_masked_for_another_observer() {
    // Earth view covering the whole disk, seen from 60° west of Earth
    let map = constant_map(1.0, 64, 40.0);
    let dest = hpc_grid(side_observer_frame(60.0), 65, 40.0, (0.0, 0.0));
    let out = reproject(&map, &dest, &ReprojectConfig::default()).unwrap();
    let data = out.data();

    // disk centre for the new observer is at Stonyhurst longitude 60°
    assert_abs_diff_eq!(data[[32, 32]], 1.0, epsilon = 1e-5);
    // 800" east lands near longitude 4°, well inside Earth's view
    assert_abs_diff_eq!(data[[32, 12]], 1.0, epsilon = 1e-5);
    // 800" west lands near longitude 116°, hidden from Earth
    assert!(data[[32, 52]].is_nan());
    // off the limb entirely
    assert!(data[[0, 0]].is_nan());
}

#[test]
fn test_reproject_to_heliographic_grid() {
    let map = constant_map(1.0, 64, 40.0);
    let dest = WcsDescriptor::heliographic(Frame::stonyhurst(obstime()), (90, 180)).unwrap();
    let out = reproject(&map, &dest, &ReprojectConfig::default()).unwrap();

    assert_eq!(out.frame().kind(), dest.frame().kind());
    // longitude -1°, latitude -1°
    assert_abs_diff_eq!(out.data()[[44, 89]], 1.0, epsilon = 1e-5);
    // longitude -179°, on the far side
    assert!(out.data()[[44, 0]].is_nan());
}

// ---------------------------------------------------------------------------
// Coadd
// ---------------------------------------------------------------------------

fn coadd_inputs() -> Vec<GenericMap> {
    let mut first = Array2::from_elem((16, 16), 1.0f32);
    first[[0, 0]] = f32::NAN;
    vec![
        hpc_map(first, 4.0),
        constant_map(2.0, 16, 4.0),
        constant_map(6.0, 16, 4.0),
    ]
}

#[test]
fn test_coadd_rules() {
    let maps = coadd_inputs();
    let dest = maps[0].wcs().clone();
    let coadd = |combine: CombineRule| {
        let config = ReprojectConfig {
            combine,
            ..Default::default()
        };
        reproject_and_coadd(&maps, &dest, &config).unwrap()
    };

    let mean = coadd(CombineRule::Mean);
    assert_abs_diff_eq!(mean.data()[[5, 5]], 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(mean.data()[[0, 0]], 4.0, epsilon = 1e-5);

    let sum = coadd(CombineRule::Sum);
    assert_abs_diff_eq!(sum.data()[[5, 5]], 9.0, epsilon = 1e-5);
    assert_abs_diff_eq!(sum.data()[[0, 0]], 8.0, epsilon = 1e-5);

    let median = coadd(CombineRule::Median);
    assert_abs_diff_eq!(median.data()[[5, 5]], 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(median.data()[[0, 0]], 4.0, epsilon = 1e-5);

    assert_eq!(mean.meta(), maps[0].meta());
}

#[test]
fn test_coadd_without_contributions_uses_fill() {
    let maps = coadd_inputs();
    let dest = hpc_grid(earth_hpc_frame(obstime()), 8, 4.0, (5000.0, 0.0));
    let config = ReprojectConfig {
        fill: Some(0.0),
        ..Default::default()
    };
    let out = reproject_and_coadd(&maps, &dest, &config).unwrap();
    assert!(out.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_coadd_of_nothing_is_an_error() {
    let dest = hpc_grid(earth_hpc_frame(obstime()), 8, 4.0, (0.0, 0.0));
    assert!(matches!(
        reproject_and_coadd(&[], &dest, &ReprojectConfig::default()),
        Err(HelioError::EmptySequence)
    ));
}
