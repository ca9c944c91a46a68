use chrono::{DateTime, Utc};
use nalgebra::{Matrix2, Vector2};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coords::coordinate::Coordinate;
use crate::coords::frame::Frame;
use crate::error::{HelioError, Result};
use crate::interpolate::{self, Interpolation};
use crate::map::header::Header;
use crate::map::meta::MapMeta;
use crate::map::wcs::WcsDescriptor;
use crate::units::Angle;

/// Fractional 0-based pixel position; pixel centres sit on integers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelCoord {
    pub x: f64,
    pub y: f64,
}

impl PixelCoord {
    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

/// A rectangle of whole pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    /// Clip the rectangle to an image of `src_w x src_h` pixels.
    pub fn validated(&self, src_w: usize, src_h: usize) -> Result<PixelRect> {
        let x1 = (self.x + self.width).min(src_w);
        let y1 = (self.y + self.height).min(src_h);

        if self.x >= x1 || self.y >= y1 {
            return Err(HelioError::EmptyRegion(format!(
                "region ({},{} {}x{}) does not overlap the {src_w}x{src_h} image",
                self.x, self.y, self.width, self.height
            )));
        }

        Ok(PixelRect {
            x: self.x,
            y: self.y,
            width: x1 - self.x,
            height: y1 - self.y,
        })
    }
}

/// How `superpixel` combines each block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuperpixelReduction {
    #[default]
    Mean,
    Sum,
}

/// A 2D solar image with its WCS and descriptive metadata.
///
/// Every transformation returns a new map; the array of `self` is never
/// modified or shared.
#[derive(Clone, Debug)]
pub struct GenericMap {
    data: Array2<f32>,
    wcs: WcsDescriptor,
    meta: MapMeta,
}

impl GenericMap {
    pub fn new(data: Array2<f32>, wcs: WcsDescriptor, meta: MapMeta) -> Result<Self> {
        let (h, w) = data.dim();
        if h == 0 || w == 0 || (h, w) != wcs.shape() {
            return Err(HelioError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        Ok(Self { data, wcs, meta })
    }

    /// Build a map from a parsed header and its data array.
    pub fn load(header: &Header, data: Array2<f32>) -> Result<Self> {
        let wcs = WcsDescriptor::from_header(header)?;
        let meta = MapMeta::from_header(header);
        let map = GenericMap::new(data, wcs, meta)?;
        info!(
            frame = %map.wcs.frame().kind(),
            width = map.width(),
            height = map.height(),
            "Loaded map"
        );
        Ok(map)
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f32> {
        self.data
    }

    pub fn wcs(&self) -> &WcsDescriptor {
        &self.wcs
    }

    pub fn meta(&self) -> &MapMeta {
        &self.meta
    }

    pub fn frame(&self) -> &Frame {
        self.wcs.frame()
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.wcs.frame().obstime()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Pixel scale along x and y.
    pub fn scale(&self) -> (Angle, Angle) {
        let cdelt = self.wcs.cdelt();
        (Angle::from_degrees(cdelt.x), Angle::from_degrees(cdelt.y))
    }

    /// Observer as a Stonyhurst coordinate, for observer-based maps.
    pub fn observer_coordinate(&self) -> Option<Coordinate> {
        self.wcs.frame().observer_coordinate()
    }

    pub fn to_header(&self) -> Header {
        let mut header = self.wcs.to_header();
        self.meta.write_into(&mut header);
        header
    }

    pub fn world_to_pixel(&self, coord: &Coordinate) -> Result<PixelCoord> {
        self.wcs.world_to_pixel(coord)
    }

    pub fn pixel_to_world(&self, x: f64, y: f64) -> Result<Coordinate> {
        self.wcs.pixel_to_world(x, y)
    }

    pub fn center(&self) -> Result<Coordinate> {
        self.pixel_to_world(
            (self.width() as f64 - 1.0) / 2.0,
            (self.height() as f64 - 1.0) / 2.0,
        )
    }

    /// World coordinate of the outer corner of the first pixel.
    pub fn bottom_left_coord(&self) -> Result<Coordinate> {
        self.pixel_to_world(-0.5, -0.5)
    }

    /// World coordinate of the outer corner of the last pixel.
    pub fn top_right_coord(&self) -> Result<Coordinate> {
        self.pixel_to_world(self.width() as f64 - 0.5, self.height() as f64 - 0.5)
    }

    /// Rotate the image about its reference pixel.
    ///
    /// A positive `angle` turns the world axes counter-clockwise relative to
    /// the new pixel grid; `None` uses the map's own PC matrix so that the
    /// result has world axes aligned with pixel axes. The output grows to
    /// hold the whole rotated footprint and uncovered pixels get `missing`.
    pub fn rotate(
        &self,
        angle: Option<Angle>,
        missing: f32,
        interpolation: Interpolation,
    ) -> Result<GenericMap> {
        let r = match angle {
            Some(a) => {
                let (s, c) = a.radians().sin_cos();
                Matrix2::new(c, -s, s, c)
            }
            None => self.wcs.pc(),
        };
        let r_inv = r
            .try_inverse()
            .ok_or_else(|| HelioError::UnsupportedFormat("rotation matrix is singular".into()))?;

        let (w, h) = (self.width() as f64, self.height() as f64);
        let centre = self.wcs.crpix() - Vector2::new(1.0, 1.0);

        let corners = [(-0.5, -0.5), (w - 0.5, -0.5), (-0.5, h - 0.5), (w - 0.5, h - 0.5)]
            .map(|(x, y)| r * (Vector2::new(x, y) - centre));
        let min_x = corners.iter().map(|v| v.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|v| v.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|v| v.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|v| v.y).fold(f64::NEG_INFINITY, f64::max);

        let new_w = ((max_x - min_x - 1e-9).ceil() as usize).max(1);
        let new_h = ((max_y - min_y - 1e-9).ceil() as usize).max(1);
        let new_centre = Vector2::new(-0.5 - min_x, -0.5 - min_y);

        let data = interpolate::render((new_h, new_w), |row, col| {
            let p = r_inv * (Vector2::new(col as f64, row as f64) - new_centre) + centre;
            interpolate::sample(&self.data, p.x, p.y, interpolation).unwrap_or(missing)
        });

        let wcs = self.wcs.with_cd(
            (new_h, new_w),
            new_centre + Vector2::new(1.0, 1.0),
            self.wcs.cd() * r_inv,
        )?;
        GenericMap::new(data, wcs, self.meta.clone())
    }

    /// Cut out the region spanned by two world coordinates. Each corner
    /// selects the pixel that contains it; the range is clipped to the image.
    pub fn crop(&self, bottom_left: &Coordinate, top_right: &Coordinate) -> Result<GenericMap> {
        let a = self.world_to_pixel(bottom_left)?;
        let b = self.world_to_pixel(top_right)?;
        if a.is_nan() || b.is_nan() {
            return Err(HelioError::EmptyRegion(
                "a corner does not project onto the image plane".into(),
            ));
        }

        let index = |v: f64| (v + 0.5).floor() as i64;
        let x0 = index(a.x.min(b.x)).max(0);
        let x1 = index(a.x.max(b.x)).min(self.width() as i64 - 1);
        let y0 = index(a.y.min(b.y)).max(0);
        let y1 = index(a.y.max(b.y)).min(self.height() as i64 - 1);

        if x1 < x0 || y1 < y0 {
            return Err(HelioError::EmptyRegion(format!(
                "corners map to pixels ({:.1}, {:.1}) and ({:.1}, {:.1}), outside the image",
                a.x, a.y, b.x, b.y
            )));
        }

        self.crop_pixels(&PixelRect {
            x: x0 as usize,
            y: y0 as usize,
            width: (x1 - x0 + 1) as usize,
            height: (y1 - y0 + 1) as usize,
        })
    }

    pub fn crop_pixels(&self, rect: &PixelRect) -> Result<GenericMap> {
        let rect = rect.validated(self.width(), self.height())?;
        let data = self
            .data
            .slice(s![rect.y..rect.y + rect.height, rect.x..rect.x + rect.width])
            .to_owned();

        let crpix = self.wcs.crpix() - Vector2::new(rect.x as f64, rect.y as f64);
        let wcs = self
            .wcs
            .with_cd((rect.height, rect.width), crpix, self.wcs.cd())?;
        GenericMap::new(data, wcs, self.meta.clone())
    }

    /// Resample onto a `(rows, cols)` grid covering the same footprint.
    pub fn resample(&self, shape: (usize, usize), interpolation: Interpolation) -> Result<GenericMap> {
        let (new_h, new_w) = shape;
        if new_h == 0 || new_w == 0 {
            return Err(HelioError::InvalidDimensions {
                width: new_w,
                height: new_h,
            });
        }
        let kx = self.width() as f64 / new_w as f64;
        let ky = self.height() as f64 / new_h as f64;

        let data = interpolate::render(shape, |row, col| {
            let x = (col as f64 + 0.5) * kx - 0.5;
            let y = (row as f64 + 0.5) * ky - 0.5;
            interpolate::sample(&self.data, x, y, interpolation).unwrap_or(f32::NAN)
        });

        let wcs = self.scaled_wcs(shape, kx, ky)?;
        GenericMap::new(data, wcs, self.meta.clone())
    }

    /// Combine `factor x factor` blocks into single pixels. Trailing rows
    /// and columns that do not fill a block are dropped; NaN pixels are
    /// left out of each block.
    pub fn superpixel(&self, factor: usize, reduction: SuperpixelReduction) -> Result<GenericMap> {
        let new_w = self.width() / factor.max(1);
        let new_h = self.height() / factor.max(1);
        if factor == 0 || new_w == 0 || new_h == 0 {
            return Err(HelioError::InvalidDimensions {
                width: new_w,
                height: new_h,
            });
        }

        let data = interpolate::render((new_h, new_w), |row, col| {
            let block = self.data.slice(s![
                row * factor..(row + 1) * factor,
                col * factor..(col + 1) * factor
            ]);
            let (sum, n) = block
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0f64, 0usize), |(s, n), &v| (s + v as f64, n + 1));
            match (n, reduction) {
                (0, _) => f32::NAN,
                (_, SuperpixelReduction::Sum) => sum as f32,
                (_, SuperpixelReduction::Mean) => (sum / n as f64) as f32,
            }
        });

        let f = factor as f64;
        let wcs = self.scaled_wcs((new_h, new_w), f, f)?;
        GenericMap::new(data, wcs, self.meta.clone())
    }

    /// WCS for a grid whose pixels are `kx x ky` old pixels, sharing the
    /// outer edge of the footprint.
    fn scaled_wcs(&self, shape: (usize, usize), kx: f64, ky: f64) -> Result<WcsDescriptor> {
        let crpix = self.wcs.crpix();
        let new_crpix = Vector2::new((crpix.x - 0.5) / kx + 0.5, (crpix.y - 0.5) / ky + 0.5);
        let cd = self.wcs.cd() * Matrix2::from_diagonal(&Vector2::new(kx, ky));
        self.wcs.with_cd(shape, new_crpix, cd)
    }

    fn finite_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().filter(|v| v.is_finite()).map(|&v| v as f64)
    }

    pub fn mean(&self) -> Option<f64> {
        let (sum, n) = self
            .finite_values()
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.finite_values().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.finite_values().reduce(f64::max)
    }

    /// Population standard deviation.
    pub fn std(&self) -> Option<f64> {
        let mean = self.mean()?;
        let (sq, n) = self
            .finite_values()
            .fold((0.0, 0usize), |(s, n), v| (s + (v - mean).powi(2), n + 1));
        Some((sq / n as f64).sqrt())
    }
}
