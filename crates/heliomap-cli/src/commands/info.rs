use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use heliomap_core::coords::sun;
use heliomap_core::io::fits::FitsFile;
use heliomap_core::map::GenericMap;

#[derive(Args)]
pub struct InfoArgs {
    /// Input FITS file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let fits = FitsFile::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", fits.width(), fits.height());
    println!("BITPIX:      {}", fits.bitpix());
    println!("Cards:       {}", fits.header.len());

    let data = fits.read_data()?;
    let map = match GenericMap::load(&fits.header, data) {
        Ok(map) => map,
        Err(e) => {
            println!("Map:         not loadable ({e})");
            return Ok(());
        }
    };

    let date = map.date();
    let (sx, sy) = map.scale();
    let wcs = map.wcs();
    println!("Frame:       {}", map.frame().kind());
    println!("Date:        {}", date.to_rfc3339());
    println!("Projection:  {}", wcs.projection());
    println!("Scale:       {:.4}\" x {:.4}\" per pixel", sx.arcsec(), sy.arcsec());
    println!("Rotation:    {}", wcs.rotation_angle());
    if let Some(obs) = map.frame().observer() {
        println!(
            "Observer:    lon {}  lat {}  distance {:.6} AU",
            obs.lon,
            obs.lat,
            obs.radius.au()
        );
    }

    let meta = map.meta();
    if let Some(ref inst) = meta.instrument {
        println!("Instrument:  {}", inst);
    }
    if let Some(ref obs) = meta.observatory {
        println!("Observatory: {}", obs);
    }
    if let Some(wl) = meta.wavelength {
        println!(
            "Wavelength:  {} {}",
            wl,
            meta.wavelength_unit.as_deref().unwrap_or("")
        );
    }
    if let Some(exp) = meta.exposure {
        println!("Exposure:    {:.3} s", exp);
    }

    match (map.mean(), map.min(), map.max(), map.std()) {
        (Some(mean), Some(min), Some(max), Some(std)) => println!(
            "Statistics:  mean {:.4}  min {:.4}  max {:.4}  std {:.4}",
            mean, min, max, std
        ),
        _ => println!("Statistics:  no valid pixels"),
    }

    println!("B0:          {}", sun::b0(&date));
    println!("L0:          {}", sun::l0(&date));
    println!("Carrington:  rotation {:.3}", sun::carrington_rotation_number(&date));

    Ok(())
}
