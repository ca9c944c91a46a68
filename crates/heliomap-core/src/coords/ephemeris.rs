use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coords::coordinate::Coordinate;
use crate::coords::frame::Frame;
use crate::coords::orbit::{self, OrbitalElements};
use crate::coords::sun;
use crate::coords::time::julian_centuries;
use crate::error::{HelioError, Result};
use crate::units::{Angle, Length};

/// Solar-system bodies the built-in ephemeris knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
}

impl Body {
    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Earth => "earth",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
        }
    }

    fn elements(self) -> Option<&'static OrbitalElements> {
        match self {
            Body::Sun => None,
            Body::Mercury => Some(&orbit::MERCURY),
            Body::Venus => Some(&orbit::VENUS),
            Body::Earth => Some(&orbit::EARTH),
            Body::Mars => Some(&orbit::MARS),
            Body::Jupiter => Some(&orbit::JUPITER),
            Body::Saturn => Some(&orbit::SATURN),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = HelioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sun" => Ok(Body::Sun),
            "mercury" => Ok(Body::Mercury),
            "venus" => Ok(Body::Venus),
            "earth" => Ok(Body::Earth),
            "mars" => Ok(Body::Mars),
            "jupiter" => Ok(Body::Jupiter),
            "saturn" => Ok(Body::Saturn),
            other => Err(HelioError::Ephemeris(format!("unknown body '{other}'"))),
        }
    }
}

/// Source of body positions, in heliographic Stonyhurst coordinates.
///
/// Implementations may block (for example on a network query). Callers do
/// not retry; any retry policy belongs to the implementation.
pub trait EphemerisProvider: Send + Sync {
    fn position_of(&self, body: Body, time: DateTime<Utc>) -> Result<Coordinate>;

    fn positions_of(&self, body: Body, times: &[DateTime<Utc>]) -> Result<Vec<Coordinate>> {
        times.iter().map(|t| self.position_of(body, *t)).collect()
    }
}

/// Low-precision analytic ephemeris from Keplerian mean elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeplerianEphemeris;

impl EphemerisProvider for KeplerianEphemeris {
    fn position_of(&self, body: Body, time: DateTime<Utc>) -> Result<Coordinate> {
        let hgs = Frame::stonyhurst(time);
        let Some(elements) = body.elements() else {
            return Coordinate::spherical(hgs, Angle::ZERO, Angle::ZERO, Length::from_meters(0.0));
        };

        let ecliptic = elements.heliocentric_ecliptic(julian_centuries(&time));
        let hci = sun::ecliptic_to_hci() * ecliptic;
        Coordinate::from_vector(Frame::inertial(time), &hci).transform_to(&hgs)
    }
}

/// Explicit cache of body positions keyed by (body, time).
///
/// The lock is only held while reading or writing the map, never while
/// the inner provider is computing.
pub struct CachedEphemeris<P> {
    inner: P,
    cache: RwLock<HashMap<(Body, DateTime<Utc>), Coordinate>>,
}

impl<P: EphemerisProvider> CachedEphemeris<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop a single cached entry. Returns whether it was present.
    pub fn invalidate(&self, body: Body, time: DateTime<Utc>) -> bool {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(body, time))
            .is_some()
    }

    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: EphemerisProvider> EphemerisProvider for CachedEphemeris<P> {
    fn position_of(&self, body: Body, time: DateTime<Utc>) -> Result<Coordinate> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(body, time))
            .cloned();
        if let Some(hit) = cached {
            debug!(%body, %time, "ephemeris cache hit");
            return Ok(hit);
        }

        debug!(%body, %time, "ephemeris cache miss");
        let position = self.inner.position_of(body, time)?;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((body, time), position.clone());
        Ok(position)
    }
}
