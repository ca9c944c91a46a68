//! World Coordinate System for 2D solar images, following the FITS WCS
//! papers (Greisen & Calabretta 2002, Calabretta & Greisen 2002) for the
//! gnomonic (TAN) and plate carrée (CAR) projections.
//!
//! Pixel coordinates exposed by this module are 0-based (pixel centres on
//! integers); `crpix` keeps the FITS 1-based convention.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::coords::coordinate::Coordinate;
use crate::coords::frame::{Frame, FrameKind, Observer};
use crate::coords::sun;
use crate::coords::time::parse_obstime;
use crate::error::{HelioError, Result};
use crate::map::generic::PixelCoord;
use crate::map::header::Header;
use crate::units::{Angle, Length};

const OBSTIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// Gnomonic (zenithal).
    Tan,
    /// Plate carrée (cylindrical). Only a reference latitude of 0 is accepted.
    Car,
}

impl Projection {
    pub fn code(self) -> &'static str {
        match self {
            Projection::Tan => "TAN",
            Projection::Car => "CAR",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "TAN" => Ok(Projection::Tan),
            "CAR" => Ok(Projection::Car),
            other => Err(HelioError::UnsupportedFormat(format!(
                "unsupported projection code '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// WCS axis name prefixes and the unit written to headers, per frame kind.
fn axis_names(kind: FrameKind) -> Option<(&'static str, &'static str, &'static str)> {
    match kind {
        FrameKind::Helioprojective => Some(("HPLN", "HPLT", "arcsec")),
        FrameKind::HeliographicStonyhurst => Some(("HGLN", "HGLT", "deg")),
        FrameKind::HeliographicCarrington => Some(("CRLN", "CRLT", "deg")),
        _ => None,
    }
}

fn kind_from_axes(axis1: &str, axis2: &str) -> Result<FrameKind> {
    FrameKind::ALL
        .into_iter()
        .find(|k| axis_names(*k).is_some_and(|(a1, a2, _)| a1 == axis1 && a2 == axis2))
        .ok_or_else(|| {
            HelioError::UnsupportedFormat(format!("unsupported axis pair {axis1}/{axis2}"))
        })
}

/// Degrees per unit of a `CUNITi` value. FITS defaults to degrees.
fn unit_to_degrees(unit: Option<&str>) -> Result<f64> {
    match unit.map(|u| u.trim().to_ascii_lowercase()) {
        None => Ok(1.0),
        Some(u) => match u.as_str() {
            "" | "deg" | "degree" | "degrees" => Ok(1.0),
            "arcmin" => Ok(1.0 / 60.0),
            "arcsec" => Ok(1.0 / 3600.0),
            "rad" => Ok(180.0 / PI),
            other => Err(HelioError::UnsupportedFormat(format!(
                "unsupported axis unit '{other}'"
            ))),
        },
    }
}

/// Split `HPLN-TAN` into `("HPLN", "TAN")`.
fn split_ctype(ctype: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = ctype.trim().split('-').filter(|p| !p.is_empty()).collect();
    match parts.as_slice() {
        [axis, proj] => Ok((axis.to_ascii_uppercase(), proj.to_ascii_uppercase())),
        _ => Err(HelioError::UnsupportedFormat(format!(
            "malformed CTYPE '{ctype}'"
        ))),
    }
}

/// Pixel-to-world mapping of a 2D image, tagged with its coordinate frame.
#[derive(Clone, Debug, PartialEq)]
pub struct WcsDescriptor {
    shape: (usize, usize),
    crpix: Vector2<f64>,
    crval: Vector2<f64>,
    cdelt: Vector2<f64>,
    pc: Matrix2<f64>,
    cd_inv: Matrix2<f64>,
    projection: Projection,
    frame: Frame,
}

impl WcsDescriptor {
    /// `shape` is `(rows, cols)`; `crval` and `cdelt` are in degrees.
    pub fn new(
        shape: (usize, usize),
        crpix: Vector2<f64>,
        crval: Vector2<f64>,
        cdelt: Vector2<f64>,
        pc: Matrix2<f64>,
        projection: Projection,
        frame: Frame,
    ) -> Result<Self> {
        let (h, w) = shape;
        if h == 0 || w == 0 {
            return Err(HelioError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        if axis_names(frame.kind()).is_none() {
            return Err(HelioError::UnsupportedFormat(format!(
                "no WCS axes defined for {} frames",
                frame.kind()
            )));
        }
        if projection == Projection::Car && crval.y.abs() > 1e-12 {
            return Err(HelioError::UnsupportedFormat(
                "CAR projection requires a reference latitude of 0".into(),
            ));
        }

        let cd = Matrix2::from_diagonal(&cdelt) * pc;
        let cd_inv = cd
            .try_inverse()
            .filter(|m| m.iter().all(|v| v.is_finite()))
            .ok_or_else(|| HelioError::UnsupportedFormat("singular WCS matrix".into()))?;

        Ok(Self {
            shape,
            crpix,
            crval,
            cdelt,
            pc,
            cd_inv,
            projection,
            frame,
        })
    }

    /// Parse the WCS keywords of a FITS header.
    pub fn from_header(header: &Header) -> Result<Self> {
        let nx = header.require_f64("NAXIS1")? as usize;
        let ny = header.require_f64("NAXIS2")? as usize;

        let (axis1, proj1) = split_ctype(header.require_str("CTYPE1")?)?;
        let (axis2, proj2) = split_ctype(header.require_str("CTYPE2")?)?;
        if proj1 != proj2 {
            return Err(HelioError::UnsupportedFormat(format!(
                "mismatched projections {proj1}/{proj2}"
            )));
        }
        let kind = kind_from_axes(&axis1, &axis2)?;
        let projection = Projection::from_code(&proj1)?;

        let units = Vector2::new(
            unit_to_degrees(header.get_str("CUNIT1"))?,
            unit_to_degrees(header.get_str("CUNIT2"))?,
        );

        let crpix = Vector2::new(header.require_f64("CRPIX1")?, header.require_f64("CRPIX2")?);
        let crval = Vector2::new(header.require_f64("CRVAL1")?, header.require_f64("CRVAL2")?)
            .component_mul(&units);

        let (cdelt, pc) = if header.contains("CD1_1") {
            let get = |k: &str| header.get_f64(k).unwrap_or(0.0);
            let cd = Matrix2::new(
                get("CD1_1") * units.x,
                get("CD1_2") * units.x,
                get("CD2_1") * units.y,
                get("CD2_2") * units.y,
            );
            decompose_cd(&cd, Vector2::new(1.0, 1.0))?
        } else {
            let cdelt = Vector2::new(header.require_f64("CDELT1")?, header.require_f64("CDELT2")?)
                .component_mul(&units);
            (cdelt, pc_from_header(header, &cdelt))
        };

        let date = header
            .get_str("DATE-OBS")
            .or_else(|| header.get_str("DATE_OBS"))
            .or_else(|| header.get_str("DATE-AVG"))
            .ok_or(HelioError::MissingTime { kind })?;
        let obstime = parse_obstime(date)?;

        let frame = if kind.is_observer_based() {
            let observer =
                observer_from_header(header, obstime).ok_or(HelioError::MissingObserver { kind })?;
            Frame::helioprojective(obstime, observer)
        } else {
            Frame::build(kind, &crate::coords::FrameParams::at(obstime))?
        };

        WcsDescriptor::new((ny, nx), crpix, crval, cdelt, pc, projection, frame)
    }

    /// A gnomonic helioprojective WCS centred on the array.
    pub fn helioprojective(
        frame: Frame,
        shape: (usize, usize),
        scale: (Angle, Angle),
        center: (Angle, Angle),
        rotation: Angle,
    ) -> Result<Self> {
        if frame.kind() != FrameKind::Helioprojective {
            return Err(HelioError::UnsupportedFormat(format!(
                "helioprojective WCS needs a helioprojective frame, got {}",
                frame.kind()
            )));
        }
        let (h, w) = shape;
        WcsDescriptor::new(
            shape,
            Vector2::new((w as f64 + 1.0) / 2.0, (h as f64 + 1.0) / 2.0),
            Vector2::new(center.0.degrees(), center.1.degrees()),
            Vector2::new(scale.0.degrees(), scale.1.degrees()),
            rotation_matrix(rotation),
            Projection::Tan,
            frame,
        )
    }

    /// A plate carrée WCS covering the whole solar sphere.
    pub fn heliographic(frame: Frame, shape: (usize, usize)) -> Result<Self> {
        let lon_ref = match frame.kind() {
            FrameKind::HeliographicStonyhurst => 0.0,
            FrameKind::HeliographicCarrington => 180.0,
            other => {
                return Err(HelioError::UnsupportedFormat(format!(
                    "heliographic WCS needs a heliographic frame, got {other}"
                )))
            }
        };
        let (h, w) = shape;
        WcsDescriptor::new(
            shape,
            Vector2::new((w as f64 + 1.0) / 2.0, (h as f64 + 1.0) / 2.0),
            Vector2::new(lon_ref, 0.0),
            Vector2::new(360.0 / w as f64, 180.0 / h.max(1) as f64),
            Matrix2::identity(),
            Projection::Car,
            frame,
        )
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn crpix(&self) -> Vector2<f64> {
        self.crpix
    }

    /// Reference world value in degrees.
    pub fn crval(&self) -> Vector2<f64> {
        self.crval
    }

    /// Pixel scale in degrees per pixel.
    pub fn cdelt(&self) -> Vector2<f64> {
        self.cdelt
    }

    pub fn pc(&self) -> Matrix2<f64> {
        self.pc
    }

    pub fn cd(&self) -> Matrix2<f64> {
        Matrix2::from_diagonal(&self.cdelt) * self.pc
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Rotation of the world axes relative to the pixel axes.
    pub fn rotation_angle(&self) -> Angle {
        Angle::from_radians(self.pc[(1, 0)].atan2(self.pc[(0, 0)]))
    }

    /// Same projection and frame with a new shape, reference pixel and CD
    /// matrix. CDELT keeps its signs and absorbs the row norms of `cd`.
    pub fn with_cd(&self, shape: (usize, usize), crpix: Vector2<f64>, cd: Matrix2<f64>) -> Result<Self> {
        let (cdelt, pc) = decompose_cd(&cd, self.cdelt)?;
        WcsDescriptor::new(shape, crpix, self.crval, cdelt, pc, self.projection, self.frame.clone())
    }

    /// Intermediate world coordinates (degrees) of a 0-based pixel.
    pub fn pixel_to_intermediate(&self, x: f64, y: f64) -> Vector2<f64> {
        self.cd() * (Vector2::new(x + 1.0, y + 1.0) - self.crpix)
    }

    pub fn intermediate_to_pixel(&self, v: &Vector2<f64>) -> PixelCoord {
        let p = self.cd_inv * v + self.crpix;
        PixelCoord {
            x: p.x - 1.0,
            y: p.y - 1.0,
        }
    }

    /// World longitude and latitude of a 0-based pixel, in this WCS's frame.
    pub fn pixel_to_world_angles(&self, x: f64, y: f64) -> (Angle, Angle) {
        let v = self.pixel_to_intermediate(x, y);
        let (lon, lat) = match self.projection {
            Projection::Tan => tan_deproject(&v, &self.crval),
            Projection::Car => (self.crval.x + v.x, v.y),
        };
        if lat.abs() > 90.0 {
            return (Angle::from_radians(f64::NAN), Angle::from_radians(f64::NAN));
        }
        (Angle::from_degrees(lon), Angle::from_degrees(lat))
    }

    /// 0-based pixel of a world position already expressed in this WCS's
    /// frame. Positions that cannot be projected give NaN.
    pub fn world_angles_to_pixel(&self, lon: Angle, lat: Angle) -> PixelCoord {
        let v = match self.projection {
            Projection::Tan => tan_project(lon.degrees(), lat.degrees(), &self.crval),
            Projection::Car => Vector2::new(
                Angle::from_degrees(lon.degrees() - self.crval.x)
                    .wrap_signed()
                    .degrees(),
                lat.degrees(),
            ),
        };
        self.intermediate_to_pixel(&v)
    }

    /// World coordinate of a 0-based pixel. Helioprojective pixels are
    /// directions without distance; heliographic pixels lie on the solar
    /// surface.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Result<Coordinate> {
        let (lon, lat) = self.pixel_to_world_angles(x, y);
        match self.frame.kind() {
            FrameKind::Helioprojective => Coordinate::direction(self.frame.clone(), lon, lat),
            _ => Coordinate::spherical(self.frame.clone(), lon, lat, Length::solar_radius()),
        }
    }

    /// 0-based pixel of any coordinate, converting it into this WCS's frame
    /// first. Out-of-bounds results are returned as-is.
    pub fn world_to_pixel(&self, coord: &Coordinate) -> Result<PixelCoord> {
        let local = if coord.frame().same_as(&self.frame) {
            coord.clone()
        } else {
            coord.transform_to(&self.frame)?
        };
        match (local.lon(), local.lat()) {
            (Some(lon), Some(lat)) => Ok(self.world_angles_to_pixel(lon, lat)),
            _ => Err(HelioError::InvalidCoordinate(
                "coordinate has no angular position in the map frame".into(),
            )),
        }
    }

    /// FITS keywords describing this WCS.
    pub fn to_header(&self) -> Header {
        let mut header = Header::new();
        let (h, w) = self.shape;
        header.set_int("NAXIS1", w as i64);
        header.set_int("NAXIS2", h as i64);

        if let Some((a1, a2, unit)) = axis_names(self.frame.kind()) {
            let per_unit = 1.0 / unit_to_degrees(Some(unit)).unwrap_or(1.0);
            let code = self.projection.code();
            header.set_str("CTYPE1", &format!("{a1}-{code}"));
            header.set_str("CTYPE2", &format!("{a2}-{code}"));
            header.set_str("CUNIT1", unit);
            header.set_str("CUNIT2", unit);
            header.set_float("CRVAL1", self.crval.x * per_unit);
            header.set_float("CRVAL2", self.crval.y * per_unit);
            header.set_float("CDELT1", self.cdelt.x * per_unit);
            header.set_float("CDELT2", self.cdelt.y * per_unit);
        }
        header.set_float("CRPIX1", self.crpix.x);
        header.set_float("CRPIX2", self.crpix.y);
        header.set_float("PC1_1", self.pc[(0, 0)]);
        header.set_float("PC1_2", self.pc[(0, 1)]);
        header.set_float("PC2_1", self.pc[(1, 0)]);
        header.set_float("PC2_2", self.pc[(1, 1)]);

        let obstime = self.frame.obstime();
        header.set_str("DATE-OBS", &obstime.format(OBSTIME_FORMAT).to_string());
        if let Some(obs) = self.frame.observer() {
            header.set_float("HGLN_OBS", obs.lon.degrees());
            header.set_float("HGLT_OBS", obs.lat.degrees());
            header.set_float("DSUN_OBS", obs.radius.meters());
        }
        header
    }
}

fn rotation_matrix(angle: Angle) -> Matrix2<f64> {
    let (s, c) = angle.radians().sin_cos();
    Matrix2::new(c, -s, s, c)
}

/// Split a CD matrix into CDELT (row norms, signs from `sign_from`) and PC.
fn decompose_cd(cd: &Matrix2<f64>, sign_from: Vector2<f64>) -> Result<(Vector2<f64>, Matrix2<f64>)> {
    let norm = |row: usize| (cd[(row, 0)].powi(2) + cd[(row, 1)].powi(2)).sqrt();
    let cdelt = Vector2::new(
        norm(0).copysign(sign_from.x),
        norm(1).copysign(sign_from.y),
    );
    if cdelt.x == 0.0 || cdelt.y == 0.0 {
        return Err(HelioError::UnsupportedFormat("singular WCS matrix".into()));
    }
    let pc = Matrix2::from_diagonal(&cdelt.map(|c| 1.0 / c)) * cd;
    Ok((cdelt, pc))
}

/// `PCi_j` keywords, else `CROTA2`, else identity.
fn pc_from_header(header: &Header, cdelt: &Vector2<f64>) -> Matrix2<f64> {
    if ["PC1_1", "PC1_2", "PC2_1", "PC2_2"]
        .iter()
        .any(|k| header.contains(k))
    {
        return Matrix2::new(
            header.get_f64("PC1_1").unwrap_or(1.0),
            header.get_f64("PC1_2").unwrap_or(0.0),
            header.get_f64("PC2_1").unwrap_or(0.0),
            header.get_f64("PC2_2").unwrap_or(1.0),
        );
    }
    if let Some(crota) = header.get_f64("CROTA2") {
        let (s, c) = crota.to_radians().sin_cos();
        let ratio = cdelt.y / cdelt.x;
        return Matrix2::new(c, -s * ratio, s / ratio, c);
    }
    Matrix2::identity()
}

/// Observer position from `HGLN_OBS`/`HGLT_OBS` or `CRLN_OBS`/`CRLT_OBS`,
/// together with `DSUN_OBS`.
pub(crate) fn observer_from_header(
    header: &Header,
    obstime: chrono::DateTime<chrono::Utc>,
) -> Option<Observer> {
    let dsun = Length::from_meters(header.get_f64("DSUN_OBS")?);
    let lat = Angle::from_degrees(
        header
            .get_f64("HGLT_OBS")
            .or_else(|| header.get_f64("CRLT_OBS"))?,
    );
    let lon = match header.get_f64("HGLN_OBS") {
        Some(hgln) => Angle::from_degrees(hgln),
        None => Angle::from_degrees(header.get_f64("CRLN_OBS")?) - sun::l0(&obstime),
    };
    Some(Observer::new(lon, lat, dsun))
}

/// Celestial pole offset for zenithal projections: (alpha_p, delta_p) is
/// the reference point and the native longitude of the celestial pole is
/// 180°.
const PHI_P: f64 = PI;

fn tan_deproject(v: &Vector2<f64>, crval: &Vector2<f64>) -> (f64, f64) {
    let (ap, dp) = (crval.x.to_radians(), crval.y.to_radians());
    let r = v.x.hypot(v.y).to_radians();
    let phi = v.x.atan2(-v.y);
    let theta = 1.0_f64.atan2(r);

    let dphi = phi - PHI_P;
    let lon = ap + (-theta.cos() * dphi.sin()).atan2(theta.sin() * dp.cos() - theta.cos() * dp.sin() * dphi.cos());
    let lat = (theta.sin() * dp.sin() + theta.cos() * dp.cos() * dphi.cos())
        .clamp(-1.0, 1.0)
        .asin();
    (lon.to_degrees(), lat.to_degrees())
}

fn tan_project(lon: f64, lat: f64, crval: &Vector2<f64>) -> Vector2<f64> {
    let (ap, dp) = (crval.x.to_radians(), crval.y.to_radians());
    let (a, d) = (lon.to_radians(), lat.to_radians());

    let da = a - ap;
    let phi = PHI_P + (-d.cos() * da.sin()).atan2(d.sin() * dp.cos() - d.cos() * dp.sin() * da.cos());
    let theta = (d.sin() * dp.sin() + d.cos() * dp.cos() * da.cos())
        .clamp(-1.0, 1.0)
        .asin();

    if theta <= 0.0 || theta.is_nan() {
        return Vector2::new(f64::NAN, f64::NAN);
    }
    let r = (theta.cos() / theta.sin()).to_degrees();
    Vector2::new(r * phi.sin(), -r * phi.cos())
}
