pub mod generic;
pub mod header;
pub mod meta;
pub mod wcs;

pub use generic::{GenericMap, PixelCoord, PixelRect, SuperpixelReduction};
pub use header::{Header, HeaderValue};
pub use meta::MapMeta;
pub use wcs::{Projection, WcsDescriptor};
