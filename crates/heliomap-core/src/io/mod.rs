pub mod fits;

pub use fits::{read_fits, read_fits_from_bytes, read_map, write_fits, write_map, FitsFile};
