use nalgebra::Vector3;

use crate::coords::frame::{Frame, FrameKind};
use crate::coords::transform::TransformGraph;
use crate::error::{HelioError, Result};
use crate::units::{Angle, Length};

/// Numeric position in a frame's native representation.
///
/// Spherical `radius` is the distance from the frame origin; for
/// helioprojective frames that origin is the observer. A helioprojective
/// position may omit its radius, in which case it is a pure direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    Spherical {
        lon: Angle,
        lat: Angle,
        radius: Option<Length>,
    },
    Cartesian {
        x: Length,
        y: Length,
        z: Length,
    },
}

impl Position {
    pub fn spherical(lon: Angle, lat: Angle, radius: Length) -> Self {
        Position::Spherical {
            lon,
            lat,
            radius: Some(radius),
        }
    }

    pub fn cartesian(x: Length, y: Length, z: Length) -> Self {
        Position::Cartesian { x, y, z }
    }

    /// Cartesian vector in metres, if the position has a distance.
    pub fn vector(&self) -> Option<Vector3<f64>> {
        match *self {
            Position::Spherical {
                lon,
                lat,
                radius: Some(r),
            } => Some(spherical_to_vector(lon, lat, r.meters())),
            Position::Spherical { radius: None, .. } => None,
            Position::Cartesian { x, y, z } => Some(Vector3::new(x.meters(), y.meters(), z.meters())),
        }
    }

    /// Unit direction vector.
    pub fn direction(&self) -> Vector3<f64> {
        match *self {
            Position::Spherical { lon, lat, .. } => spherical_to_vector(lon, lat, 1.0),
            Position::Cartesian { x, y, z } => {
                Vector3::new(x.meters(), y.meters(), z.meters()).normalize()
            }
        }
    }

    fn from_vector(v: &Vector3<f64>) -> Self {
        let r = v.norm();
        let lat = if r > 0.0 { (v.z / r).asin() } else { 0.0 };
        Position::Spherical {
            lon: Angle::from_radians(v.y.atan2(v.x)),
            lat: Angle::from_radians(lat),
            radius: Some(Length::from_meters(r)),
        }
    }
}

pub(crate) fn spherical_to_vector(lon: Angle, lat: Angle, r: f64) -> Vector3<f64> {
    Vector3::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

/// An immutable position tagged with the frame it is expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinate {
    frame: Frame,
    position: Position,
}

impl Coordinate {
    /// Build a coordinate, converting `position` into the frame's native
    /// representation and canonicalising the longitude.
    pub fn new(frame: Frame, position: Position) -> Result<Self> {
        let kind = frame.kind();

        let position = match position {
            Position::Cartesian { .. } if kind.is_cartesian() => position,
            Position::Cartesian { .. } => {
                let v = position.vector().unwrap_or_else(Vector3::zeros);
                Position::from_vector(&v)
            }
            Position::Spherical { radius: None, .. } if kind != FrameKind::Helioprojective => {
                return Err(HelioError::InvalidCoordinate(format!(
                    "{kind} coordinates need a distance"
                )));
            }
            Position::Spherical { lon, lat, radius } => {
                if lat.radians().abs() > std::f64::consts::FRAC_PI_2 + 1e-12 {
                    return Err(HelioError::InvalidCoordinate(format!(
                        "latitude {lat} outside [-90°, 90°]"
                    )));
                }
                if kind.is_cartesian() {
                    let v = position.vector().unwrap_or_else(Vector3::zeros);
                    Position::Cartesian {
                        x: Length::from_meters(v.x),
                        y: Length::from_meters(v.y),
                        z: Length::from_meters(v.z),
                    }
                } else {
                    Position::Spherical { lon, lat, radius }
                }
            }
        };

        Ok(Coordinate::from_native(frame, position))
    }

    pub fn spherical(frame: Frame, lon: Angle, lat: Angle, radius: Length) -> Result<Self> {
        Coordinate::new(frame, Position::spherical(lon, lat, radius))
    }

    /// A helioprojective direction with unknown distance.
    pub fn direction(frame: Frame, lon: Angle, lat: Angle) -> Result<Self> {
        Coordinate::new(
            frame,
            Position::Spherical {
                lon,
                lat,
                radius: None,
            },
        )
    }

    pub fn cartesian(frame: Frame, x: Length, y: Length, z: Length) -> Result<Self> {
        Coordinate::new(frame, Position::cartesian(x, y, z))
    }

    /// Trusted constructor for positions already in native representation.
    pub(crate) fn from_native(frame: Frame, position: Position) -> Self {
        let position = match position {
            Position::Spherical { lon, lat, radius } => Position::Spherical {
                lon: canonical_lon(frame.kind(), lon),
                lat,
                radius,
            },
            cartesian => cartesian,
        };
        Self { frame, position }
    }

    /// Cartesian vector (metres) re-expressed as a native position.
    pub(crate) fn from_vector(frame: Frame, v: &Vector3<f64>) -> Self {
        let position = if frame.kind().is_cartesian() {
            Position::Cartesian {
                x: Length::from_meters(v.x),
                y: Length::from_meters(v.y),
                z: Length::from_meters(v.z),
            }
        } else {
            Position::from_vector(v)
        };
        Coordinate::from_native(frame, position)
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn lon(&self) -> Option<Angle> {
        match self.position {
            Position::Spherical { lon, .. } => Some(lon),
            Position::Cartesian { .. } => None,
        }
    }

    pub fn lat(&self) -> Option<Angle> {
        match self.position {
            Position::Spherical { lat, .. } => Some(lat),
            Position::Cartesian { .. } => None,
        }
    }

    pub fn radius(&self) -> Option<Length> {
        match self.position {
            Position::Spherical { radius, .. } => radius,
            Position::Cartesian { .. } => self.position.vector().map(|v| Length::from_meters(v.norm())),
        }
    }

    /// Cartesian components in metres, in the frame's own axes.
    pub fn vector(&self) -> Option<Vector3<f64>> {
        self.position.vector()
    }

    pub fn is_nan(&self) -> bool {
        match self.position {
            Position::Spherical { lon, lat, radius } => {
                lon.is_nan() || lat.is_nan() || radius.is_some_and(|r| r.meters().is_nan())
            }
            Position::Cartesian { x, y, z } => {
                x.meters().is_nan() || y.meters().is_nan() || z.meters().is_nan()
            }
        }
    }

    /// Convert into `target` using the built-in transform graph.
    pub fn transform_to(&self, target: &Frame) -> Result<Coordinate> {
        TransformGraph::builtin().convert(self, target)
    }

    /// Give a distance-less helioprojective direction a distance by placing
    /// it on the solar surface. Lines of sight that miss the Sun get a NaN
    /// distance. Any other coordinate is returned unchanged.
    pub fn make_3d(&self) -> Coordinate {
        match (&self.frame, self.position) {
            (
                Frame::Helioprojective { observer, .. },
                Position::Spherical {
                    lon,
                    lat,
                    radius: None,
                },
            ) => {
                let d_obs = observer.radius.meters();
                let rsun = Length::solar_radius().meters();
                let cos_alpha = lat.cos() * lon.cos();
                let disc = d_obs * d_obs * cos_alpha * cos_alpha - d_obs * d_obs + rsun * rsun;
                let distance = if disc < 0.0 {
                    f64::NAN
                } else {
                    d_obs * cos_alpha - disc.sqrt()
                };
                Coordinate::from_native(
                    self.frame.clone(),
                    Position::Spherical {
                        lon,
                        lat,
                        radius: Some(Length::from_meters(distance)),
                    },
                )
            }
            _ => self.clone(),
        }
    }

    /// Angular separation, measured in this coordinate's frame.
    pub fn separation(&self, other: &Coordinate) -> Result<Angle> {
        let other = if other.frame.same_as(&self.frame) {
            other.clone()
        } else {
            other.transform_to(&self.frame)?
        };
        let a = self.position.direction();
        let b = other.position.direction();
        Ok(Angle::from_radians(a.cross(&b).norm().atan2(a.dot(&b))))
    }

    /// Compare frame and position within tolerances.
    pub fn approx_eq(&self, other: &Coordinate, angle_tol: Angle, length_tol: Length) -> bool {
        if !self.frame.same_as(&other.frame) {
            return false;
        }
        let close_len = |a: Length, b: Length| (a.meters() - b.meters()).abs() <= length_tol.meters();

        match (self.position, other.position) {
            (
                Position::Spherical {
                    lon: lon_a,
                    lat: lat_a,
                    radius: r_a,
                },
                Position::Spherical {
                    lon: lon_b,
                    lat: lat_b,
                    radius: r_b,
                },
            ) => {
                let dlon = (lon_a - lon_b).wrap_signed().radians().abs() * lat_a.cos().max(0.0);
                let dlat = (lat_a - lat_b).radians().abs();
                let radius_ok = match (r_a, r_b) {
                    (Some(a), Some(b)) => close_len(a, b),
                    (None, None) => true,
                    _ => false,
                };
                dlon <= angle_tol.radians() && dlat <= angle_tol.radians() && radius_ok
            }
            (
                Position::Cartesian {
                    x: xa,
                    y: ya,
                    z: za,
                },
                Position::Cartesian {
                    x: xb,
                    y: yb,
                    z: zb,
                },
            ) => close_len(xa, xb) && close_len(ya, yb) && close_len(za, zb),
            _ => false,
        }
    }
}

/// Canonical longitude range for each frame kind.
pub(crate) fn canonical_lon(kind: FrameKind, lon: Angle) -> Angle {
    match kind {
        FrameKind::HeliographicCarrington => lon.wrap_positive(),
        _ => lon.wrap_signed(),
    }
}
