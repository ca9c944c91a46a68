pub mod coordinate;
pub mod edges;
pub mod ephemeris;
pub mod frame;
pub mod orbit;
pub mod sun;
pub mod time;
pub mod transform;

pub use coordinate::{Coordinate, Position};
pub use ephemeris::{Body, CachedEphemeris, EphemerisProvider, KeplerianEphemeris};
pub use frame::{Frame, FrameKind, FrameParams, Observer};
pub use transform::{TransformGraph, TransformPlan};
