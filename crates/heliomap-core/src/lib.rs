pub mod consts;
pub mod coords;
pub mod error;
pub mod interpolate;
pub mod io;
pub mod job;
pub mod map;
pub mod reproject;
pub mod units;
