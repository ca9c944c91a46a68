use chrono::{DateTime, TimeZone, Utc};
use ndarray::Array2;

use heliomap_core::coords::{sun, Frame, Observer};
use heliomap_core::map::{GenericMap, Header, MapMeta, WcsDescriptor};
use heliomap_core::units::{Angle, Length};

/// 2017-08-01T00:00:00Z, the epoch most tests use.
pub fn obstime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 8, 1, 0, 0, 0).unwrap()
}

/// Earth as seen by the analytic solar geometry at `t`.
pub fn earth_observer(t: DateTime<Utc>) -> Observer {
    Observer::new(Angle::ZERO, sun::b0(&t), sun::earth_distance(&t))
}

pub fn earth_hpc_frame(t: DateTime<Utc>) -> Frame {
    Frame::helioprojective(t, earth_observer(t))
}

/// FITS header for a helioprojective TAN image centred on disk centre.
pub fn hpc_header(width: usize, height: usize, scale_arcsec: f64) -> Header {
    let t = obstime();
    let obs = earth_observer(t);
    let mut h = Header::new();
    h.set_int("NAXIS1", width as i64);
    h.set_int("NAXIS2", height as i64);
    h.set_str("CTYPE1", "HPLN-TAN");
    h.set_str("CTYPE2", "HPLT-TAN");
    h.set_str("CUNIT1", "arcsec");
    h.set_str("CUNIT2", "arcsec");
    h.set_float("CRPIX1", (width as f64 + 1.0) / 2.0);
    h.set_float("CRPIX2", (height as f64 + 1.0) / 2.0);
    h.set_float("CRVAL1", 0.0);
    h.set_float("CRVAL2", 0.0);
    h.set_float("CDELT1", scale_arcsec);
    h.set_float("CDELT2", scale_arcsec);
    h.set_str("DATE-OBS", "2017-08-01T00:00:00.000");
    h.set_float("HGLN_OBS", obs.lon.degrees());
    h.set_float("HGLT_OBS", obs.lat.degrees());
    h.set_float("DSUN_OBS", obs.radius.meters());
    h.set_str("INSTRUME", "SYNTH");
    h.set_float("WAVELNTH", 171.0);
    h.set_str("WAVEUNIT", "angstrom");
    h
}

/// Values increasing along x: `data[[row, col]] = col`.
pub fn ramp(width: usize, height: usize) -> Array2<f32> {
    Array2::from_shape_fn((height, width), |(_, col)| col as f32)
}

pub fn hpc_map(data: Array2<f32>, scale_arcsec: f64) -> GenericMap {
    let (h, w) = data.dim();
    GenericMap::load(&hpc_header(w, h, scale_arcsec), data).unwrap()
}

/// Earth-view map with the given rotation of world axes against pixel axes.
pub fn rotated_hpc_map(data: Array2<f32>, scale_arcsec: f64, rotation: Angle) -> GenericMap {
    let (h, w) = data.dim();
    let wcs = WcsDescriptor::helioprojective(
        earth_hpc_frame(obstime()),
        (h, w),
        (
            Angle::from_arcsec(scale_arcsec),
            Angle::from_arcsec(scale_arcsec),
        ),
        (Angle::ZERO, Angle::ZERO),
        rotation,
    )
    .unwrap();
    GenericMap::new(data, wcs, MapMeta::default()).unwrap()
}

/// Helioprojective frame for an observer 1 AU out at Stonyhurst longitude
/// `lon_deg` on the solar equator.
pub fn side_observer_frame(lon_deg: f64) -> Frame {
    Frame::helioprojective(
        obstime(),
        Observer::new(Angle::from_degrees(lon_deg), Angle::ZERO, Length::from_au(1.0)),
    )
}

/// One 80-byte FITS card with a raw value field.
pub fn card(key: &str, value: &str) -> String {
    format!("{:<80}", format!("{key:<8}= {value:>20}"))
}

/// Assemble header cards and big-endian data bytes into a FITS byte stream.
pub fn build_fits(cards: &[String], data: &[u8]) -> Vec<u8> {
    let mut buf = cards.concat().into_bytes();
    buf.extend_from_slice(format!("{:<80}", "END").as_bytes());
    let padded = buf.len().div_ceil(2880) * 2880;
    buf.resize(padded, b' ');
    buf.extend_from_slice(data);
    let padded = buf.len().div_ceil(2880) * 2880;
    buf.resize(padded, 0);
    buf
}
