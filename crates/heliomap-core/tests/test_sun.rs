#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use chrono::{Duration, TimeZone, Utc};

use heliomap_core::consts::{J2000_JD, RSUN_METERS};
use heliomap_core::coords::sun;
use heliomap_core::coords::time::{julian_centuries, julian_day, julian_ephemeris_day, parse_obstime};
use heliomap_core::error::HelioError;

use common::obstime;

// ---------------------------------------------------------------------------
// Time scales
// ---------------------------------------------------------------------------

#[test]
fn test_julian_day_at_j2000() {
    let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
    assert_abs_diff_eq!(julian_day(&t), J2000_JD, epsilon = 1e-9);
    assert_abs_diff_eq!(julian_ephemeris_day(&t) - julian_day(&t), 69.184 / 86_400.0, epsilon = 1e-9);
    assert!(julian_centuries(&t) > 0.0 && julian_centuries(&t) < 1e-7);
}

#[test]
fn test_parse_obstime_formats() {
    let expected = Utc.with_ymd_and_hms(2017, 8, 1, 12, 30, 0).unwrap();
    for s in [
        "2017-08-01T12:30:00",
        "2017-08-01T12:30:00.000",
        "2017-08-01T12:30:00Z",
        "2017-08-01 12:30:00",
        "2017-08-01T12:30",
    ] {
        assert_eq!(parse_obstime(s).unwrap(), expected, "{s}");
    }
    assert_eq!(parse_obstime("2017-08-01").unwrap(), obstime());

    let fractional = parse_obstime("2017-08-01T00:00:01.250").unwrap();
    assert_eq!(fractional - obstime(), Duration::milliseconds(1250));
}

#[test]
fn test_parse_obstime_rejects_garbage() {
    assert!(matches!(
        parse_obstime("yesterday"),
        Err(HelioError::UnsupportedFormat(_))
    ));
}

// ---------------------------------------------------------------------------
// Solar geometry
// ---------------------------------------------------------------------------

#[test]
fn test_disk_centre_angles_match_meeus_example() {
    // JDE 2448908.5 (1992 Oct 13.0 TD)
    let t = parse_obstime("1992-10-12T23:58:50.816").unwrap();
    assert_abs_diff_eq!(julian_ephemeris_day(&t), 2_448_908.5, epsilon = 1e-6);
    assert_abs_diff_eq!(sun::l0(&t).degrees(), 238.64, epsilon = 0.1);
    assert_abs_diff_eq!(sun::b0(&t).degrees(), 5.99, epsilon = 0.05);
}

#[test]
fn test_disk_centre_angles_on_reference_date() {
    let t = obstime();
    assert_abs_diff_eq!(sun::l0(&t).degrees(), 204.636, epsilon = 0.1);
    assert_abs_diff_eq!(sun::b0(&t).degrees(), 5.78, epsilon = 0.05);
    assert_abs_diff_eq!(sun::earth_distance(&t).au(), 1.015, epsilon = 1e-3);
}

#[test]
fn test_b0_has_yearly_extremes() {
    // the solar equator's node sits in early June and early December
    let june = Utc.with_ymd_and_hms(2017, 6, 6, 0, 0, 0).unwrap();
    let september = Utc.with_ymd_and_hms(2017, 9, 8, 0, 0, 0).unwrap();
    let march = Utc.with_ymd_and_hms(2017, 3, 6, 0, 0, 0).unwrap();
    assert!(sun::b0(&june).degrees().abs() < 0.5);
    assert_abs_diff_eq!(sun::b0(&september).degrees(), 7.25, epsilon = 0.1);
    assert_abs_diff_eq!(sun::b0(&march).degrees(), -7.25, epsilon = 0.1);
}

#[test]
fn test_l0_decreases_by_about_thirteen_degrees_a_day() {
    let t = obstime();
    let next = t + Duration::days(1);
    let step = (sun::l0(&next) - sun::l0(&t)).wrap_signed().degrees();
    assert_abs_diff_eq!(step, -13.2, epsilon = 0.1);
}

#[test]
fn test_earth_hci_longitude_advances_about_a_degree_a_day() {
    let t = obstime();
    let next = t + Duration::days(1);
    let step = (sun::earth_hci_longitude(&next) - sun::earth_hci_longitude(&t))
        .wrap_signed()
        .degrees();
    assert_abs_diff_eq!(step, 0.959, epsilon = 0.01);
}

#[test]
fn test_earth_position_is_about_one_au_out() {
    let p = sun::earth_position_hci(&obstime());
    assert!(p.norm() > 200.0 * RSUN_METERS);
    assert_abs_diff_eq!(p.norm(), sun::earth_distance(&obstime()).meters(), epsilon = 1e-3);
}

#[test]
fn test_carrington_rotation_number() {
    let t = obstime();
    let crn = sun::carrington_rotation_number(&t);
    assert_eq!(crn.floor(), 2193.0);
    assert_abs_diff_eq!(crn, 2193.43, epsilon = 0.01);

    // fractional part tracks L0
    let phase = 1.0 - sun::l0(&t).degrees() / 360.0;
    assert_abs_diff_eq!(crn.fract(), phase, epsilon = 1e-9);

    let later = sun::carrington_rotation_number(&(t + Duration::days(10)));
    assert!(later > crn);
}

#[test]
fn test_carrington_rotation_angle_is_positive() {
    for days in [0, 13, 101, 365] {
        let t = obstime() + Duration::days(days);
        let angle = sun::carrington_rotation_angle(&t).degrees();
        assert!((0.0..360.0).contains(&angle), "{angle}");
    }
}
