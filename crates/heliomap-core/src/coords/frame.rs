use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::consts::OBSERVER_TOLERANCE_METERS;
use crate::coords::coordinate::{Coordinate, Position};
use crate::coords::ephemeris::{Body, EphemerisProvider};
use crate::error::{HelioError, Result};
use crate::units::{Angle, Length};

/// The kinds of coordinate frame known to the transform graph.
///
/// Declaration order is the preference order used to break ties between
/// equal-length transform paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    HeliographicStonyhurst,
    HeliographicCarrington,
    HeliocentricInertial,
    Heliocentric,
    Helioprojective,
}

impl FrameKind {
    pub const ALL: [FrameKind; 5] = [
        FrameKind::HeliographicStonyhurst,
        FrameKind::HeliographicCarrington,
        FrameKind::HeliocentricInertial,
        FrameKind::Heliocentric,
        FrameKind::Helioprojective,
    ];

    /// Whether values in this frame depend on an observer position.
    pub fn is_observer_based(self) -> bool {
        matches!(self, FrameKind::Heliocentric | FrameKind::Helioprojective)
    }

    /// Whether the native representation is Cartesian rather than spherical.
    pub fn is_cartesian(self) -> bool {
        matches!(self, FrameKind::Heliocentric)
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameKind::HeliographicStonyhurst => "heliographic_stonyhurst",
            FrameKind::HeliographicCarrington => "heliographic_carrington",
            FrameKind::HeliocentricInertial => "heliocentric_inertial",
            FrameKind::Heliocentric => "heliocentric",
            FrameKind::Helioprojective => "helioprojective",
        }
    }

    /// Position of this kind in the tie-break preference order.
    pub(crate) fn preference(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FrameKind {
    type Err = HelioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heliographic_stonyhurst" | "hgs" => Ok(FrameKind::HeliographicStonyhurst),
            "heliographic_carrington" | "hgc" => Ok(FrameKind::HeliographicCarrington),
            "heliocentric_inertial" | "hci" => Ok(FrameKind::HeliocentricInertial),
            "heliocentric" | "hcc" => Ok(FrameKind::Heliocentric),
            "helioprojective" | "hpc" => Ok(FrameKind::Helioprojective),
            _ => Err(HelioError::UnknownFrame(s.to_string())),
        }
    }
}

/// Observer location, held as a Stonyhurst position at the frame's obstime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observer {
    pub lon: Angle,
    pub lat: Angle,
    pub radius: Length,
}

impl Observer {
    pub fn new(lon: Angle, lat: Angle, radius: Length) -> Self {
        Self {
            lon: lon.wrap_signed(),
            lat,
            radius,
        }
    }

    /// Normalise any coordinate into an observer at `obstime`.
    pub fn from_coordinate(coord: &Coordinate, obstime: DateTime<Utc>) -> Result<Self> {
        let hgs = coord.transform_to(&Frame::stonyhurst(obstime))?;
        match hgs.position() {
            Position::Spherical {
                lon,
                lat,
                radius: Some(radius),
            } if radius.meters() > 0.0 => Ok(Observer::new(*lon, *lat, *radius)),
            Position::Spherical {
                radius: Some(_), ..
            } => Err(HelioError::InvalidCoordinate(
                "observer must be at a positive distance from the Sun".into(),
            )),
            _ => Err(HelioError::InvalidCoordinate(
                "observer position has no distance".into(),
            )),
        }
    }

    /// Stonyhurst Cartesian position in metres.
    pub fn cartesian(&self) -> Vector3<f64> {
        let r = self.radius.meters();
        Vector3::new(
            r * self.lat.cos() * self.lon.cos(),
            r * self.lat.cos() * self.lon.sin(),
            r * self.lat.sin(),
        )
    }

    /// Same physical location within [`OBSERVER_TOLERANCE_METERS`].
    pub fn same_as(&self, other: &Observer) -> bool {
        (self.cartesian() - other.cartesian()).norm() <= OBSERVER_TOLERANCE_METERS
    }
}

/// Parameters handed to the frame registry.
#[derive(Clone, Debug, Default)]
pub struct FrameParams {
    pub obstime: Option<DateTime<Utc>>,
    pub observer: Option<Coordinate>,
}

impl FrameParams {
    pub fn at(obstime: DateTime<Utc>) -> Self {
        Self {
            obstime: Some(obstime),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Coordinate) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// A fully parameterised coordinate frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    HeliographicStonyhurst {
        obstime: DateTime<Utc>,
    },
    HeliographicCarrington {
        obstime: DateTime<Utc>,
    },
    HeliocentricInertial {
        obstime: DateTime<Utc>,
    },
    Heliocentric {
        obstime: DateTime<Utc>,
        observer: Observer,
    },
    Helioprojective {
        obstime: DateTime<Utc>,
        observer: Observer,
    },
}

impl Frame {
    /// Build a frame of `kind`, validating that every required parameter is
    /// present. Missing parameters are rejected, never defaulted.
    pub fn build(kind: FrameKind, params: &FrameParams) -> Result<Frame> {
        let obstime = params.obstime.ok_or(HelioError::MissingTime { kind })?;

        if !kind.is_observer_based() {
            return Frame::from_parts(kind, obstime, None);
        }

        let observer = params
            .observer
            .as_ref()
            .ok_or(HelioError::MissingObserver { kind })?;
        let observer = Observer::from_coordinate(observer, obstime)?;
        Frame::from_parts(kind, obstime, Some(observer))
    }

    /// Build a frame from a kind name such as `"helioprojective"` or `"hgs"`.
    pub fn build_named(name: &str, params: &FrameParams) -> Result<Frame> {
        Frame::build(name.parse()?, params)
    }

    /// Build an observer-based frame whose observer is a solar-system body.
    pub fn with_body_observer(
        kind: FrameKind,
        obstime: DateTime<Utc>,
        body: Body,
        provider: &dyn EphemerisProvider,
    ) -> Result<Frame> {
        let observer = provider.position_of(body, obstime)?;
        Frame::build(kind, &FrameParams::at(obstime).with_observer(observer))
    }

    pub fn stonyhurst(obstime: DateTime<Utc>) -> Frame {
        Frame::HeliographicStonyhurst { obstime }
    }

    pub fn carrington(obstime: DateTime<Utc>) -> Frame {
        Frame::HeliographicCarrington { obstime }
    }

    pub fn inertial(obstime: DateTime<Utc>) -> Frame {
        Frame::HeliocentricInertial { obstime }
    }

    pub fn heliocentric(obstime: DateTime<Utc>, observer: Observer) -> Frame {
        Frame::Heliocentric { obstime, observer }
    }

    pub fn helioprojective(obstime: DateTime<Utc>, observer: Observer) -> Frame {
        Frame::Helioprojective { obstime, observer }
    }

    pub(crate) fn from_parts(
        kind: FrameKind,
        obstime: DateTime<Utc>,
        observer: Option<Observer>,
    ) -> Result<Frame> {
        let frame = match kind {
            FrameKind::HeliographicStonyhurst => Frame::stonyhurst(obstime),
            FrameKind::HeliographicCarrington => Frame::carrington(obstime),
            FrameKind::HeliocentricInertial => Frame::inertial(obstime),
            FrameKind::Heliocentric => Frame::heliocentric(
                obstime,
                observer.ok_or(HelioError::AmbiguousObserver { kind })?,
            ),
            FrameKind::Helioprojective => Frame::helioprojective(
                obstime,
                observer.ok_or(HelioError::AmbiguousObserver { kind })?,
            ),
        };
        Ok(frame)
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::HeliographicStonyhurst { .. } => FrameKind::HeliographicStonyhurst,
            Frame::HeliographicCarrington { .. } => FrameKind::HeliographicCarrington,
            Frame::HeliocentricInertial { .. } => FrameKind::HeliocentricInertial,
            Frame::Heliocentric { .. } => FrameKind::Heliocentric,
            Frame::Helioprojective { .. } => FrameKind::Helioprojective,
        }
    }

    pub fn obstime(&self) -> DateTime<Utc> {
        match self {
            Frame::HeliographicStonyhurst { obstime }
            | Frame::HeliographicCarrington { obstime }
            | Frame::HeliocentricInertial { obstime }
            | Frame::Heliocentric { obstime, .. }
            | Frame::Helioprojective { obstime, .. } => *obstime,
        }
    }

    pub fn observer(&self) -> Option<&Observer> {
        match self {
            Frame::Heliocentric { observer, .. } | Frame::Helioprojective { observer, .. } => {
                Some(observer)
            }
            _ => None,
        }
    }

    /// The observer as a Stonyhurst coordinate at this frame's obstime.
    pub fn observer_coordinate(&self) -> Option<Coordinate> {
        self.observer().map(|obs| {
            Coordinate::from_native(
                Frame::stonyhurst(self.obstime()),
                Position::Spherical {
                    lon: obs.lon,
                    lat: obs.lat,
                    radius: Some(obs.radius),
                },
            )
        })
    }

    /// Whether the two frames disagree on a shared parameter: a different
    /// obstime, or two observers at different locations.
    pub fn conflicts_with(&self, other: &Frame) -> bool {
        if self.obstime() != other.obstime() {
            return true;
        }
        match (self.observer(), other.observer()) {
            (Some(a), Some(b)) => !a.same_as(b),
            _ => false,
        }
    }

    /// Same kind and compatible parameters: conversion is the identity.
    pub fn same_as(&self, other: &Frame) -> bool {
        self.kind() == other.kind() && !self.conflicts_with(other)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(obstime={}", self.kind(), self.obstime().to_rfc3339())?;
        if let Some(obs) = self.observer() {
            write!(
                f,
                ", observer=[lon={}, lat={}, radius={}]",
                obs.lon, obs.lat, obs.radius
            )?;
        }
        write!(f, ")")
    }
}
