use serde::{Deserialize, Serialize};

use crate::map::header::Header;

/// Auxiliary, non-WCS description of an image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapMeta {
    pub instrument: Option<String>,
    pub detector: Option<String>,
    pub observatory: Option<String>,
    /// Wavelength in `wavelength_unit`.
    pub wavelength: Option<f64>,
    pub wavelength_unit: Option<String>,
    /// Exposure time in seconds.
    pub exposure: Option<f64>,
    pub processing_level: Option<f64>,
    pub bunit: Option<String>,
}

impl MapMeta {
    pub fn from_header(header: &Header) -> Self {
        let string = |key: &str| header.get_str(key).map(|s| s.trim().to_string());
        Self {
            instrument: string("INSTRUME"),
            detector: string("DETECTOR"),
            observatory: string("OBSRVTRY").or_else(|| string("TELESCOP")),
            wavelength: header.get_f64("WAVELNTH"),
            wavelength_unit: string("WAVEUNIT"),
            exposure: header.get_f64("EXPTIME"),
            processing_level: header.get_f64("LVL_NUM"),
            bunit: string("BUNIT"),
        }
    }

    pub fn write_into(&self, header: &mut Header) {
        let pairs = [
            ("INSTRUME", &self.instrument),
            ("DETECTOR", &self.detector),
            ("OBSRVTRY", &self.observatory),
            ("WAVEUNIT", &self.wavelength_unit),
            ("BUNIT", &self.bunit),
        ];
        for (key, value) in pairs {
            if let Some(v) = value {
                header.set_str(key, v);
            }
        }
        if let Some(w) = self.wavelength {
            header.set_float("WAVELNTH", w);
        }
        if let Some(e) = self.exposure {
            header.set_float("EXPTIME", e);
        }
        if let Some(l) = self.processing_level {
            header.set_float("LVL_NUM", l);
        }
    }
}
