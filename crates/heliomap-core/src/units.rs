use std::f64::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Neg, Sub};

use crate::consts::{AU_METERS, RSUN_METERS};

const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// A plane angle. Stored in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn from_radians(rad: f64) -> Self {
        Self(rad)
    }

    pub fn from_degrees(deg: f64) -> Self {
        Self(deg.to_radians())
    }

    pub fn from_arcsec(arcsec: f64) -> Self {
        Self((arcsec / ARCSEC_PER_DEGREE).to_radians())
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    pub fn degrees(self) -> f64 {
        self.0.to_degrees()
    }

    pub fn arcsec(self) -> f64 {
        self.0.to_degrees() * ARCSEC_PER_DEGREE
    }

    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }

    /// Wrap into [-180°, 180°).
    pub fn wrap_signed(self) -> Self {
        let mut shifted = (self.0 + PI).rem_euclid(TAU);
        // same rounding hazard as wrap_positive, just below -PI
        if shifted >= TAU {
            shifted = 0.0;
        }
        Self(shifted - PI)
    }

    /// Wrap into [0°, 360°).
    pub fn wrap_positive(self) -> Self {
        let wrapped = self.0.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if wrapped >= TAU {
            Self(0.0)
        } else {
            Self(wrapped)
        }
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}°", self.degrees())
    }
}

/// A length. Stored in metres.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Length(f64);

impl Length {
    pub fn from_meters(m: f64) -> Self {
        Self(m)
    }

    pub fn from_km(km: f64) -> Self {
        Self(km * 1000.0)
    }

    pub fn from_au(au: f64) -> Self {
        Self(au * AU_METERS)
    }

    pub fn from_solar_radii(rsun: f64) -> Self {
        Self(rsun * RSUN_METERS)
    }

    pub fn solar_radius() -> Self {
        Self(RSUN_METERS)
    }

    pub fn meters(self) -> f64 {
        self.0
    }

    pub fn km(self) -> f64 {
        self.0 / 1000.0
    }

    pub fn au(self) -> f64 {
        self.0 / AU_METERS
    }

    pub fn solar_radii(self) -> f64 {
        self.0 / RSUN_METERS
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} km", self.km())
    }
}
