//! Keplerian mean orbital elements (J2000 ecliptic and equinox).
//!
//! Elements and rates per Julian century are from Standish, "Keplerian
//! Elements for Approximate Positions of the Major Planets", Table 1
//! (valid 1800 AD - 2050 AD). Accuracy is of order an arcminute for the
//! inner planets, which is ample for observer geometry.

use nalgebra::Vector3;

use crate::consts::{AU_METERS, KEPLER_MAX_ITERATIONS, KEPLER_TOLERANCE};

#[derive(Clone, Copy, Debug)]
pub struct OrbitalElements {
    /// Semi-major axis (AU) and rate (AU/century).
    pub a: (f64, f64),
    /// Eccentricity and rate.
    pub e: (f64, f64),
    /// Inclination (deg) and rate.
    pub i: (f64, f64),
    /// Mean longitude (deg) and rate.
    pub l: (f64, f64),
    /// Longitude of perihelion (deg) and rate.
    pub varpi: (f64, f64),
    /// Longitude of the ascending node (deg) and rate.
    pub node: (f64, f64),
}

pub const MERCURY: OrbitalElements = OrbitalElements {
    a: (0.387_099_27, 0.000_000_37),
    e: (0.205_635_93, 0.000_019_06),
    i: (7.004_979_02, -0.005_947_49),
    l: (252.250_323_50, 149_472.674_111_75),
    varpi: (77.457_796_28, 0.160_476_89),
    node: (48.330_765_93, -0.125_340_81),
};

pub const VENUS: OrbitalElements = OrbitalElements {
    a: (0.723_335_66, 0.000_003_90),
    e: (0.006_776_72, -0.000_041_07),
    i: (3.394_676_05, -0.000_788_90),
    l: (181.979_099_50, 58_517.815_387_29),
    varpi: (131.602_467_18, 0.002_683_29),
    node: (76.679_842_55, -0.277_694_18),
};

/// Earth-Moon barycentre.
pub const EARTH: OrbitalElements = OrbitalElements {
    a: (1.000_002_61, 0.000_005_62),
    e: (0.016_711_23, -0.000_043_92),
    i: (-0.000_015_31, -0.012_946_68),
    l: (100.464_571_66, 35_999.372_449_81),
    varpi: (102.937_681_93, 0.323_273_64),
    node: (0.0, 0.0),
};

pub const MARS: OrbitalElements = OrbitalElements {
    a: (1.523_710_34, 0.000_018_47),
    e: (0.093_394_10, 0.000_078_82),
    i: (1.849_691_42, -0.008_131_31),
    l: (-4.553_432_05, 19_140.302_684_99),
    varpi: (-23.943_629_59, 0.444_410_88),
    node: (49.559_538_91, -0.292_573_43),
};

pub const JUPITER: OrbitalElements = OrbitalElements {
    a: (5.202_887_00, -0.000_116_07),
    e: (0.048_386_24, -0.000_132_53),
    i: (1.304_396_95, -0.001_837_14),
    l: (34.396_440_51, 3_034.746_127_75),
    varpi: (14.728_479_83, 0.212_526_68),
    node: (100.473_909_09, 0.204_691_06),
};

pub const SATURN: OrbitalElements = OrbitalElements {
    a: (9.536_675_94, -0.001_250_60),
    e: (0.053_861_79, -0.000_509_91),
    i: (2.485_991_87, 0.001_936_09),
    l: (49.954_244_23, 1_222.493_622_01),
    varpi: (92.598_878_31, -0.418_972_16),
    node: (113.662_424_48, -0.288_677_94),
};

impl OrbitalElements {
    /// Heliocentric position in the J2000 ecliptic frame, in metres, at
    /// `t` Julian centuries (TT) past J2000.0.
    pub fn heliocentric_ecliptic(&self, t: f64) -> Vector3<f64> {
        let at = |(value, rate): (f64, f64)| value + rate * t;

        let a = at(self.a);
        let e = at(self.e);
        let inc = at(self.i).to_radians();
        let l = at(self.l);
        let varpi = at(self.varpi);
        let node = at(self.node);

        let mean_anomaly = (l - varpi).rem_euclid(360.0).to_radians();
        let arg_perihelion = (varpi - node).to_radians();
        let node = node.to_radians();

        let ecc_anomaly = solve_kepler(mean_anomaly, e);
        let xp = a * (ecc_anomaly.cos() - e);
        let yp = a * (1.0 - e * e).sqrt() * ecc_anomaly.sin();

        let (sw, cw) = arg_perihelion.sin_cos();
        let (so, co) = node.sin_cos();
        let (si, ci) = inc.sin_cos();

        let x = (cw * co - sw * so * ci) * xp + (-sw * co - cw * so * ci) * yp;
        let y = (cw * so + sw * co * ci) * xp + (-sw * so + cw * co * ci) * yp;
        let z = (sw * si) * xp + (cw * si) * yp;

        Vector3::new(x, y, z) * AU_METERS
    }
}

/// Solve `E - e sin E = M` by Newton iteration.
pub fn solve_kepler(mean_anomaly: f64, e: f64) -> f64 {
    let mut ecc = mean_anomaly;
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ecc - e * ecc.sin() - mean_anomaly) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ecc
}
