//! Analytic solar geometry: where Earth sits relative to the solar equator,
//! and how the Carrington meridian has turned, at a given instant.
//!
//! The heliocentric inertial (HCI) frame used throughout is centred on the
//! Sun with its z-axis along the solar rotation axis and its x-axis towards
//! the ascending node of the solar equator on the J2000 ecliptic.
//! Light travel time and aberration are not modelled.

use chrono::{DateTime, Utc};
use nalgebra::{Rotation3, Vector3};

use crate::consts::{
    CARRINGTON_EPOCH_JD, CARRINGTON_ROTATION_ONE_JD, CARRINGTON_SIDEREAL_PERIOD_DAYS,
    CARRINGTON_SYNODIC_PERIOD_DAYS, SOLAR_EQUATOR_INCLINATION_DEG, SOLAR_EQUATOR_NODE_DEG,
};
use crate::coords::orbit::EARTH;
use crate::coords::time::{julian_centuries, julian_ephemeris_day};
use crate::units::{Angle, Length};

/// Rotation from the J2000 ecliptic frame into the HCI frame.
pub fn ecliptic_to_hci() -> Rotation3<f64> {
    let node = Rotation3::from_axis_angle(&Vector3::z_axis(), -SOLAR_EQUATOR_NODE_DEG.to_radians());
    let tilt = Rotation3::from_axis_angle(
        &Vector3::x_axis(),
        -SOLAR_EQUATOR_INCLINATION_DEG.to_radians(),
    );
    tilt * node
}

/// Earth's position in the HCI frame, in metres.
pub fn earth_position_hci(t: &DateTime<Utc>) -> Vector3<f64> {
    ecliptic_to_hci() * EARTH.heliocentric_ecliptic(julian_centuries(t))
}

/// HCI longitude of Earth. This is the rotation between HCI and Stonyhurst.
pub fn earth_hci_longitude(t: &DateTime<Utc>) -> Angle {
    let p = earth_position_hci(t);
    Angle::from_radians(p.y.atan2(p.x))
}

/// Heliographic latitude of the centre of the disk as seen from Earth.
pub fn b0(t: &DateTime<Utc>) -> Angle {
    let p = earth_position_hci(t);
    Angle::from_radians((p.z / p.norm()).asin())
}

/// Sun-Earth distance.
pub fn earth_distance(t: &DateTime<Utc>) -> Length {
    Length::from_meters(earth_position_hci(t).norm())
}

/// Angle through which the Carrington prime meridian has turned past the
/// ascending node of the solar equator.
pub fn carrington_rotation_angle(t: &DateTime<Utc>) -> Angle {
    let days = julian_ephemeris_day(t) - CARRINGTON_EPOCH_JD;
    Angle::from_degrees(days * 360.0 / CARRINGTON_SIDEREAL_PERIOD_DAYS).wrap_positive()
}

/// Carrington longitude of the centre of the disk as seen from Earth.
///
/// This is also the offset between Stonyhurst and Carrington longitudes.
pub fn l0(t: &DateTime<Utc>) -> Angle {
    (earth_hci_longitude(t) - carrington_rotation_angle(t)).wrap_positive()
}

/// Fractional Carrington rotation number of the Earth-facing meridian.
///
/// Rotation 1 began on 1853-11-09; a new rotation starts each time L0
/// wraps back through 360°.
pub fn carrington_rotation_number(t: &DateTime<Utc>) -> f64 {
    let days = julian_ephemeris_day(t) - CARRINGTON_ROTATION_ONE_JD;
    // synodic turns elapsed, then snapped to the current L0 phase
    let approx = days / CARRINGTON_SYNODIC_PERIOD_DAYS + 1.0;
    let whole = approx.floor();
    let phase = 1.0 - l0(t).degrees() / 360.0;
    let mut number = whole + phase;
    if number - approx > 0.5 {
        number -= 1.0;
    } else if approx - number > 0.5 {
        number += 1.0;
    }
    number
}
