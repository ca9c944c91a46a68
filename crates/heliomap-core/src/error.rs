use thiserror::Error;

use crate::coords::FrameKind;

#[derive(Error, Debug)]
pub enum HelioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} frame requires an observer")]
    MissingObserver { kind: FrameKind },

    #[error("{kind} frame requires an observation time")]
    MissingTime { kind: FrameKind },

    #[error("Unknown frame name: {0}")]
    UnknownFrame(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No transform path from {from} to {to}")]
    NoPath { from: FrameKind, to: FrameKind },

    #[error("{kind} frame on the transform path has no observer")]
    AmbiguousObserver { kind: FrameKind },

    #[error("Region has zero extent: {0}")]
    EmptyRegion(String),

    #[error("Cannot relate {source_kind} to {target_kind}: {reason}")]
    IncompatibleFrame {
        source_kind: FrameKind,
        target_kind: FrameKind,
        reason: String,
    },

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Empty map sequence")]
    EmptySequence,

    #[error("Ephemeris error: {0}")]
    Ephemeris(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HelioError>;
