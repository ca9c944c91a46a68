#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use heliomap_core::coords::{Coordinate, FrameKind};
use heliomap_core::error::HelioError;
use heliomap_core::interpolate::Interpolation;
use heliomap_core::map::{GenericMap, MapMeta, PixelRect, SuperpixelReduction};
use heliomap_core::units::Angle;

use common::{hpc_map, ramp, rotated_hpc_map};

fn arcsec_point(map: &GenericMap, tx: f64, ty: f64) -> Coordinate {
    Coordinate::direction(map.frame().clone(), Angle::from_arcsec(tx), Angle::from_arcsec(ty))
        .unwrap()
}

fn assert_same_direction(a: &Coordinate, b: &Coordinate) {
    assert_abs_diff_eq!(a.lon().unwrap().arcsec(), b.lon().unwrap().arcsec(), epsilon = 1e-6);
    assert_abs_diff_eq!(a.lat().unwrap().arcsec(), b.lat().unwrap().arcsec(), epsilon = 1e-6);
}

// ---------------------------------------------------------------------------
// Construction and accessors
// ---------------------------------------------------------------------------

#[test]
fn test_data_must_match_wcs_shape() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let err = GenericMap::new(Array2::zeros((10, 12)), map.wcs().clone(), MapMeta::default());
    assert!(matches!(err, Err(HelioError::InvalidDimensions { width: 12, height: 10 })));
}

#[test]
fn test_accessors() {
    let map = hpc_map(ramp(40, 20), 2.0);
    assert_eq!(map.dimensions(), (40, 20));
    assert_eq!(map.width(), 40);
    assert_eq!(map.height(), 20);
    assert_eq!(map.frame().kind(), FrameKind::Helioprojective);
    assert_eq!(map.date(), common::obstime());
    assert_abs_diff_eq!(map.scale().0.arcsec(), 2.0, epsilon = 1e-9);
    assert!(map.observer_coordinate().is_some());

    assert_eq!(map.meta().instrument.as_deref(), Some("SYNTH"));
    assert_eq!(map.meta().wavelength, Some(171.0));

    let header = map.to_header();
    assert_eq!(header.get_str("INSTRUME"), Some("SYNTH"));
    assert_eq!(header.get_str("CTYPE1"), Some("HPLN-TAN"));
}

#[test]
fn test_center_is_reference_point() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let c = map.center().unwrap();
    assert_abs_diff_eq!(c.lon().unwrap().arcsec(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(c.lat().unwrap().arcsec(), 0.0, epsilon = 1e-9);

    let bl = map.bottom_left_coord().unwrap();
    assert_abs_diff_eq!(bl.lon().unwrap().arcsec(), -64.0, epsilon = 1e-4);
    let tr = map.top_right_coord().unwrap();
    assert_abs_diff_eq!(tr.lat().unwrap().arcsec(), 64.0, epsilon = 1e-4);
}

#[test]
fn test_pixel_world_round_trip() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let world = map.pixel_to_world(12.25, 40.5).unwrap();
    let p = map.world_to_pixel(&world).unwrap();
    assert_abs_diff_eq!(p.x, 12.25, epsilon = 1e-9);
    assert_abs_diff_eq!(p.y, 40.5, epsilon = 1e-9);
}

#[test]
fn test_world_to_pixel_outside_image_is_not_an_error() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let p = map.world_to_pixel(&arcsec_point(&map, 1000.0, 0.0)).unwrap();
    assert!(p.x > 500.0);
}

// ---------------------------------------------------------------------------
// Crop
// ---------------------------------------------------------------------------

#[test]
fn test_crop_by_world_corners() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let bl = arcsec_point(&map, -21.0, -11.0);
    let tr = arcsec_point(&map, 21.0, 11.0);
    let cropped = map.crop(&bl, &tr).unwrap();

    assert_eq!(cropped.dimensions(), (22, 12));
    assert_eq!(cropped.data()[[0, 0]], 21.0);
    assert_eq!(cropped.data()[[11, 21]], 42.0);
    assert_abs_diff_eq!(cropped.wcs().crpix().x, 11.5, epsilon = 1e-12);
    assert_abs_diff_eq!(cropped.wcs().crpix().y, 6.5, epsilon = 1e-12);

    assert_same_direction(
        &cropped.pixel_to_world(0.0, 0.0).unwrap(),
        &map.pixel_to_world(21.0, 26.0).unwrap(),
    );
    assert_eq!(map.dimensions(), (64, 64));
    assert_eq!(map.data()[[0, 0]], 0.0);
}

#[test]
fn test_crop_corner_order_does_not_matter() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let a = arcsec_point(&map, 21.0, -11.0);
    let b = arcsec_point(&map, -21.0, 11.0);
    assert_eq!(map.crop(&a, &b).unwrap().dimensions(), (22, 12));
}

#[test]
fn test_crop_is_clipped_to_the_image() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let bl = arcsec_point(&map, -1000.0, -1000.0);
    let tr = arcsec_point(&map, 1.0, 1.0);
    let cropped = map.crop(&bl, &tr).unwrap();
    assert_eq!(cropped.dimensions(), (33, 33));
    assert_eq!(cropped.data()[[0, 0]], 0.0);
}

#[test]
fn test_crop_outside_the_image_is_empty() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let bl = arcsec_point(&map, 2000.0, 2000.0);
    let tr = arcsec_point(&map, 3000.0, 3000.0);
    assert!(matches!(map.crop(&bl, &tr), Err(HelioError::EmptyRegion(_))));
}

#[test]
fn test_crop_pixels() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let cropped = map
        .crop_pixels(&PixelRect {
            x: 60,
            y: 0,
            width: 10,
            height: 5,
        })
        .unwrap();
    assert_eq!(cropped.dimensions(), (4, 5));
    assert_eq!(cropped.data()[[0, 0]], 60.0);

    let outside = PixelRect {
        x: 64,
        y: 0,
        width: 4,
        height: 4,
    };
    assert!(matches!(map.crop_pixels(&outside), Err(HelioError::EmptyRegion(_))));
}

// ---------------------------------------------------------------------------
// Resample and superpixel
// ---------------------------------------------------------------------------

#[test]
fn test_resample_halves_the_grid() {
    let map = hpc_map(ramp(64, 64), 2.0);
    let small = map.resample((32, 32), Interpolation::Bilinear).unwrap();

    assert_eq!(small.dimensions(), (32, 32));
    assert_abs_diff_eq!(small.scale().0.arcsec(), 4.0, epsilon = 1e-9);
    for col in [0usize, 7, 31] {
        assert_abs_diff_eq!(small.data()[[5, col]], 2.0 * col as f32 + 0.5, epsilon = 1e-4);
    }

    assert_same_direction(&small.bottom_left_coord().unwrap(), &map.bottom_left_coord().unwrap());
    assert_same_direction(&small.top_right_coord().unwrap(), &map.top_right_coord().unwrap());
}

#[test]
fn test_resample_upsamples_with_nearest() {
    let map = hpc_map(ramp(8, 8), 2.0);
    let big = map.resample((16, 16), Interpolation::Nearest).unwrap();
    assert_eq!(big.dimensions(), (16, 16));
    // (col + 0.5) / 2 - 0.5 rounds to col / 2
    assert_eq!(big.data()[[3, 0]], 0.0);
    assert_eq!(big.data()[[3, 5]], 2.0);
    assert_eq!(big.data()[[3, 15]], 7.0);
}

#[test]
fn test_resample_rejects_empty_shape() {
    let map = hpc_map(ramp(8, 8), 2.0);
    assert!(matches!(
        map.resample((0, 4), Interpolation::Bilinear),
        Err(HelioError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_superpixel_mean_and_sum() {
    let map = hpc_map(ramp(64, 64), 2.0);

    let mean = map.superpixel(2, SuperpixelReduction::Mean).unwrap();
    assert_eq!(mean.dimensions(), (32, 32));
    assert_abs_diff_eq!(mean.scale().1.arcsec(), 4.0, epsilon = 1e-9);
    for k in [0usize, 10, 31] {
        assert_abs_diff_eq!(mean.data()[[3, k]], 2.0 * k as f32 + 0.5, epsilon = 1e-5);
    }

    let sum = map.superpixel(2, SuperpixelReduction::Sum).unwrap();
    for k in [0usize, 10, 31] {
        assert_abs_diff_eq!(sum.data()[[3, k]], 8.0 * k as f32 + 2.0, epsilon = 1e-4);
    }

    assert_same_direction(&mean.top_right_coord().unwrap(), &map.top_right_coord().unwrap());
}

#[test]
fn test_superpixel_skips_nan_and_drops_remainder() {
    let mut data = ramp(9, 9);
    data[[0, 0]] = f32::NAN;
    let map = hpc_map(data, 2.0);
    let out = map.superpixel(2, SuperpixelReduction::Mean).unwrap();
    assert_eq!(out.dimensions(), (4, 4));
    assert_abs_diff_eq!(out.data()[[0, 0]], 2.0 / 3.0, epsilon = 1e-6);
}

#[test]
fn test_superpixel_rejects_bad_factors() {
    let map = hpc_map(ramp(8, 8), 2.0);
    assert!(map.superpixel(0, SuperpixelReduction::Mean).is_err());
    assert!(map.superpixel(9, SuperpixelReduction::Mean).is_err());
}

// ---------------------------------------------------------------------------
// Rotate
// ---------------------------------------------------------------------------

#[test]
fn test_rotate_quarter_turn_keeps_world_positions() {
    let map = hpc_map(ramp(40, 20), 2.0);
    let rotated = map
        .rotate(Some(Angle::from_degrees(90.0)), f32::NAN, Interpolation::Bilinear)
        .unwrap();
    assert_eq!(rotated.dimensions(), (20, 40));

    let world = map.pixel_to_world(30.0, 5.0).unwrap();
    let p = rotated.world_to_pixel(&world).unwrap();
    assert_abs_diff_eq!(p.x, 14.0, epsilon = 1e-6);
    assert_abs_diff_eq!(p.y, 30.0, epsilon = 1e-6);
    assert_abs_diff_eq!(rotated.data()[[30, 14]], 30.0, epsilon = 1e-3);
}

#[test]
fn test_rotate_without_angle_aligns_world_axes() {
    let map = rotated_hpc_map(Array2::from_elem((30, 30), 1.0), 2.0, Angle::from_degrees(30.0));
    assert_abs_diff_eq!(map.wcs().rotation_angle().degrees(), 30.0, epsilon = 1e-9);

    let aligned = map.rotate(None, 0.0, Interpolation::Bilinear).unwrap();
    assert_abs_diff_eq!(aligned.wcs().rotation_angle().degrees(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(aligned.scale().0.arcsec(), 2.0, epsilon = 1e-9);
    assert!(aligned.width() > 30);

    let world = map.pixel_to_world(3.0, 20.0).unwrap();
    let p = aligned.world_to_pixel(&world).unwrap();
    let back = aligned.pixel_to_world(p.x, p.y).unwrap();
    assert_same_direction(&back, &world);
}

#[test]
fn test_rotate_fills_uncovered_pixels() {
    let map = hpc_map(Array2::from_elem((20, 20), 1.0), 2.0);
    let rotated = map
        .rotate(Some(Angle::from_degrees(45.0)), -1.0, Interpolation::Nearest)
        .unwrap();
    assert_eq!(rotated.dimensions(), (29, 29));
    assert_eq!(rotated.data()[[0, 0]], -1.0);
    assert_eq!(rotated.data()[[14, 14]], 1.0);
    assert_eq!(map.data()[[0, 0]], 1.0);
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[test]
fn test_statistics_skip_nan() {
    let map = hpc_map(array![[1.0, 2.0], [3.0, f32::NAN]], 2.0);
    assert_abs_diff_eq!(map.mean().unwrap(), 2.0);
    assert_abs_diff_eq!(map.min().unwrap(), 1.0);
    assert_abs_diff_eq!(map.max().unwrap(), 3.0);
    assert_abs_diff_eq!(map.std().unwrap(), (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_statistics_of_all_nan_map() {
    let map = hpc_map(Array2::from_elem((4, 4), f32::NAN), 2.0);
    assert!(map.mean().is_none());
    assert!(map.min().is_none());
    assert!(map.max().is_none());
    assert!(map.std().is_none());
}
