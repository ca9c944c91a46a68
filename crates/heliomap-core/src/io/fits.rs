//! Minimal FITS support: the primary HDU of a single 2D image.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use memmap2::Mmap;
use ndarray::Array2;
use num_traits::AsPrimitive;
use tracing::{debug, info};

use crate::consts::{FITS_BLOCK_SIZE, FITS_CARD_SIZE};
use crate::error::{HelioError, Result};
use crate::map::generic::GenericMap;
use crate::map::header::{Header, HeaderValue};

/// Structural keywords owned by the reader/writer rather than the header.
const RESERVED_KEYS: [&str; 10] = [
    "SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "EXTEND", "BSCALE", "BZERO", "BLANK", "END",
];

#[derive(Clone, Copy, Debug)]
struct DataLayout {
    bitpix: i64,
    width: usize,
    height: usize,
    offset: usize,
}

impl DataLayout {
    fn bytes_per_value(&self) -> usize {
        (self.bitpix.unsigned_abs() / 8) as usize
    }

    /// `None` when the image size does not fit in `usize`.
    fn byte_size(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.bytes_per_value())
    }
}

/// Memory-mapped FITS file.
pub struct FitsFile {
    mmap: Mmap,
    pub header: Header,
    layout: DataLayout,
}

impl FitsFile {
    /// Open a FITS file and parse its primary header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let (header, layout) = parse_primary(&mmap)?;
        debug!(path = %path.display(), cards = header.len(), "Parsed FITS header");
        Ok(Self {
            mmap,
            header,
            layout,
        })
    }

    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    pub fn bitpix(&self) -> i64 {
        self.layout.bitpix
    }

    /// Decode the image into physical values (BSCALE/BZERO applied, BLANK
    /// pixels as NaN).
    pub fn read_data(&self) -> Result<Array2<f32>> {
        decode_data(&self.mmap, &self.header, &self.layout)
    }
}

pub fn read_fits(path: &Path) -> Result<(Header, Array2<f32>)> {
    let fits = FitsFile::open(path)?;
    let data = fits.read_data()?;
    Ok((fits.header, data))
}

pub fn read_fits_from_bytes(bytes: &[u8]) -> Result<(Header, Array2<f32>)> {
    let (header, layout) = parse_primary(bytes)?;
    let data = decode_data(bytes, &header, &layout)?;
    Ok((header, data))
}

/// Load a FITS file as a map.
pub fn read_map(path: &Path) -> Result<GenericMap> {
    let (header, data) = read_fits(path)?;
    GenericMap::load(&header, data)
}

pub fn write_map(path: &Path, map: &GenericMap) -> Result<()> {
    write_fits(path, &map.to_header(), map.data())
}

/// Write `data` as a BITPIX -32 primary image. Structural keywords in
/// `header` are replaced by ones matching `data`.
pub fn write_fits(path: &Path, header: &Header, data: &Array2<f32>) -> Result<()> {
    let (h, w) = data.dim();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut cards = vec![
        format_card("SIMPLE", &HeaderValue::Bool(true)),
        format_card("BITPIX", &HeaderValue::Int(-32)),
        format_card("NAXIS", &HeaderValue::Int(2)),
        format_card("NAXIS1", &HeaderValue::Int(w as i64)),
        format_card("NAXIS2", &HeaderValue::Int(h as i64)),
    ];
    cards.extend(
        header
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()) && key.len() <= 8)
            .map(|(key, value)| format_card(key, value)),
    );
    cards.push(format!("{:<width$}", "END", width = FITS_CARD_SIZE));

    let mut header_bytes: Vec<u8> = cards.concat().into_bytes();
    header_bytes.resize(padded_len(header_bytes.len()), b' ');
    writer.write_all(&header_bytes)?;

    for &v in data.iter() {
        writer.write_f32::<BigEndian>(v)?;
    }
    let data_len = h * w * 4;
    writer.write_all(&vec![0u8; padded_len(data_len) - data_len])?;
    writer.flush()?;

    info!(path = %path.display(), width = w, height = h, "Wrote FITS file");
    Ok(())
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(FITS_BLOCK_SIZE) * FITS_BLOCK_SIZE
}

fn format_card(key: &str, value: &HeaderValue) -> String {
    let value = match value {
        HeaderValue::Str(s) => {
            let quoted = format!("'{:<8}'", s.replace('\'', "''"));
            format!("{quoted:<20}")
        }
        HeaderValue::Int(i) => format!("{i:>20}"),
        HeaderValue::Float(f) => format!("{:>20}", format!("{f:.16E}")),
        HeaderValue::Bool(b) => format!("{:>20}", if *b { "T" } else { "F" }),
    };
    let mut card = format!("{key:<8}= {value}");
    card.truncate(FITS_CARD_SIZE);
    format!("{card:<width$}", width = FITS_CARD_SIZE)
}

fn parse_primary(bytes: &[u8]) -> Result<(Header, DataLayout)> {
    let mut header = Header::new();
    let mut end_card = None;

    for (index, card) in bytes.chunks_exact(FITS_CARD_SIZE).enumerate() {
        let card = std::str::from_utf8(card)
            .ok()
            .filter(|c| c.is_ascii())
            .ok_or_else(|| HelioError::InvalidFits(format!("card {index} is not ASCII")))?;
        let key = card[..8].trim();
        if key == "END" {
            end_card = Some(index);
            break;
        }
        if key.is_empty() || &card[8..10] != "= " {
            continue;
        }
        match parse_value(&card[10..]) {
            Some(value) => header.insert(key, value),
            None => debug!(key, "Skipping unparseable FITS card"),
        }
    }

    let end_card = end_card.ok_or_else(|| HelioError::InvalidFits("missing END card".into()))?;

    if header.get("SIMPLE").and_then(HeaderValue::as_bool) != Some(true) {
        return Err(HelioError::InvalidFits("not a SIMPLE FITS file".into()));
    }
    let int = |key: &str| {
        header
            .get_i64(key)
            .ok_or_else(|| HelioError::InvalidFits(format!("missing {key}")))
    };

    let naxis = int("NAXIS")?;
    if naxis != 2 {
        return Err(HelioError::UnsupportedFormat(format!(
            "expected a 2D image, got NAXIS = {naxis}"
        )));
    }
    let bitpix = int("BITPIX")?;
    if ![8, 16, 32, 64, -32, -64].contains(&bitpix) {
        return Err(HelioError::InvalidFits(format!("invalid BITPIX {bitpix}")));
    }
    let width = int("NAXIS1")?;
    let height = int("NAXIS2")?;
    if width <= 0 || height <= 0 {
        return Err(HelioError::InvalidDimensions {
            width: width.max(0) as usize,
            height: height.max(0) as usize,
        });
    }

    let layout = DataLayout {
        bitpix,
        width: usize::try_from(width).unwrap_or(usize::MAX),
        height: usize::try_from(height).unwrap_or(usize::MAX),
        offset: padded_len((end_card + 1) * FITS_CARD_SIZE),
    };
    let end = layout
        .byte_size()
        .and_then(|size| size.checked_add(layout.offset))
        .ok_or_else(|| HelioError::InvalidFits("image size overflows".into()))?;
    if bytes.len() < end {
        return Err(HelioError::InvalidFits(format!(
            "file truncated: expected at least {end} bytes, got {}",
            bytes.len()
        )));
    }

    Ok((header, layout))
}

fn parse_value(field: &str) -> Option<HeaderValue> {
    let field = field.trim_start();

    if let Some(rest) = field.strip_prefix('\'') {
        let mut value = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    value.push('\'');
                } else {
                    return Some(HeaderValue::Str(value.trim_end().to_string()));
                }
            } else {
                value.push(c);
            }
        }
        return None;
    }

    let raw = field.split('/').next().unwrap_or("").trim();
    match raw {
        "" => None,
        "T" => Some(HeaderValue::Bool(true)),
        "F" => Some(HeaderValue::Bool(false)),
        _ => raw
            .parse::<i64>()
            .map(HeaderValue::Int)
            .or_else(|_| raw.replace(['D', 'd'], "E").parse::<f64>().map(HeaderValue::Float))
            .ok(),
    }
}

fn decode_data(bytes: &[u8], header: &Header, layout: &DataLayout) -> Result<Array2<f32>> {
    let raw = layout
        .byte_size()
        .and_then(|size| bytes.get(layout.offset..layout.offset.checked_add(size)?))
        .ok_or_else(|| HelioError::InvalidFits("data section out of range".into()))?;
    let scale = Scaling {
        bscale: header.get_f64("BSCALE").unwrap_or(1.0),
        bzero: header.get_f64("BZERO").unwrap_or(0.0),
        blank: header.get_i64("BLANK"),
    };

    let values: Vec<f32> = match layout.bitpix {
        8 => scale.apply_ints(raw.iter().copied()),
        16 => scale.apply_ints(raw.chunks_exact(2).map(BigEndian::read_i16)),
        32 => scale.apply_ints(raw.chunks_exact(4).map(BigEndian::read_i32)),
        64 => scale.apply_ints(raw.chunks_exact(8).map(BigEndian::read_i64)),
        -32 => scale.apply_floats(raw.chunks_exact(4).map(BigEndian::read_f32)),
        -64 => scale.apply_floats(raw.chunks_exact(8).map(BigEndian::read_f64)),
        other => return Err(HelioError::InvalidFits(format!("invalid BITPIX {other}"))),
    };

    Array2::from_shape_vec((layout.height, layout.width), values)
        .map_err(|e| HelioError::InvalidFits(e.to_string()))
}

/// Linear scaling from stored to physical values.
struct Scaling {
    bscale: f64,
    bzero: f64,
    blank: Option<i64>,
}

impl Scaling {
    fn apply_ints<T>(&self, values: impl Iterator<Item = T>) -> Vec<f32>
    where
        T: AsPrimitive<i64> + AsPrimitive<f64>,
    {
        values
            .map(|v| {
                if self.blank == Some(AsPrimitive::<i64>::as_(v)) {
                    f32::NAN
                } else {
                    (self.bzero + self.bscale * AsPrimitive::<f64>::as_(v)) as f32
                }
            })
            .collect()
    }

    fn apply_floats<T: AsPrimitive<f64>>(&self, values: impl Iterator<Item = T>) -> Vec<f32> {
        values
            .map(|v| (self.bzero + self.bscale * v.as_()) as f32)
            .collect()
    }
}
