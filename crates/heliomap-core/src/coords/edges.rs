//! Primitive frame conversions. Each function converts a coordinate into
//! `target`, whose kind is adjacent to the coordinate's kind in the graph.
//! The planner guarantees that shared parameters (obstime, observer) agree
//! wherever an edge relies on them.
//!
//! Heliocentric and helioprojective geometry follows Thompson (2006),
//! A&A 449, 791.

use nalgebra::Vector3;

use crate::coords::coordinate::{Coordinate, Position};
use crate::coords::frame::{Frame, Observer};
use crate::coords::sun;
use crate::error::{HelioError, Result};
use crate::units::{Angle, Length};

fn spherical_parts(coord: &Coordinate) -> Result<(Angle, Angle, Option<Length>)> {
    match *coord.position() {
        Position::Spherical { lon, lat, radius } => Ok((lon, lat, radius)),
        Position::Cartesian { .. } => Err(HelioError::InvalidCoordinate(format!(
            "expected a spherical position in {}",
            coord.frame().kind()
        ))),
    }
}

fn observer_of(frame: &Frame) -> Result<&Observer> {
    frame
        .observer()
        .ok_or(HelioError::AmbiguousObserver { kind: frame.kind() })
}

fn rotate_lon(coord: &Coordinate, target: &Frame, by: Angle) -> Result<Coordinate> {
    let (lon, lat, radius) = spherical_parts(coord)?;
    Ok(Coordinate::from_native(
        target.clone(),
        Position::Spherical {
            lon: lon + by,
            lat,
            radius,
        },
    ))
}

pub fn hci_to_hgs(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    rotate_lon(coord, target, -sun::earth_hci_longitude(&target.obstime()))
}

pub fn hgs_to_hci(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    rotate_lon(coord, target, sun::earth_hci_longitude(&coord.frame().obstime()))
}

pub fn hgs_to_hgc(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    rotate_lon(coord, target, sun::l0(&coord.frame().obstime()))
}

pub fn hgc_to_hgs(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    rotate_lon(coord, target, -sun::l0(&coord.frame().obstime()))
}

pub fn hgs_to_hcc(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    let observer = observer_of(target)?;
    let (lon, lat, radius) = spherical_parts(coord)?;
    let r = radius
        .ok_or_else(|| HelioError::InvalidCoordinate("heliographic position without distance".into()))?
        .meters();

    let (l0, b0) = (observer.lon, observer.lat);
    let dlon = lon - l0;

    let x = r * lat.cos() * dlon.sin();
    let y = r * (lat.sin() * b0.cos() - lat.cos() * dlon.cos() * b0.sin());
    let z = r * (lat.sin() * b0.sin() + lat.cos() * dlon.cos() * b0.cos());

    Ok(Coordinate::from_vector(target.clone(), &Vector3::new(x, y, z)))
}

pub fn hcc_to_hgs(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    let observer = observer_of(coord.frame())?;
    let v = coord
        .vector()
        .ok_or_else(|| HelioError::InvalidCoordinate("heliocentric position without distance".into()))?;

    let (l0, b0) = (observer.lon, observer.lat);
    let r = v.norm();
    let lat = if r > 0.0 {
        ((v.y * b0.cos() + v.z * b0.sin()) / r).clamp(-1.0, 1.0).asin()
    } else {
        0.0
    };
    let lon = l0.radians() + v.x.atan2(v.z * b0.cos() - v.y * b0.sin());

    Ok(Coordinate::from_native(
        target.clone(),
        Position::spherical(
            Angle::from_radians(lon),
            Angle::from_radians(lat),
            Length::from_meters(r),
        ),
    ))
}

pub fn hcc_to_hpc(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    let observer = observer_of(target)?;
    let v = coord
        .vector()
        .ok_or_else(|| HelioError::InvalidCoordinate("heliocentric position without distance".into()))?;

    let d_obs = observer.radius.meters();
    let along = d_obs - v.z;
    let distance = (v.x * v.x + v.y * v.y + along * along).sqrt();
    let tx = v.x.atan2(along);
    let ty = if distance > 0.0 {
        (v.y / distance).clamp(-1.0, 1.0).asin()
    } else {
        0.0
    };

    Ok(Coordinate::from_native(
        target.clone(),
        Position::spherical(
            Angle::from_radians(tx),
            Angle::from_radians(ty),
            Length::from_meters(distance),
        ),
    ))
}

pub fn hpc_to_hcc(coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
    let coord = coord.make_3d();
    let observer = observer_of(coord.frame())?;
    let (tx, ty, distance) = spherical_parts(&coord)?;
    let d = distance.map(Length::meters).unwrap_or(f64::NAN);

    let x = d * ty.cos() * tx.sin();
    let y = d * ty.sin();
    let z = observer.radius.meters() - d * ty.cos() * tx.cos();

    Ok(Coordinate::from_vector(target.clone(), &Vector3::new(x, y, z)))
}
