use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use heliomap_core::coords::time::parse_obstime;
use heliomap_core::coords::{
    Body, CachedEphemeris, Coordinate, Frame, FrameKind, KeplerianEphemeris, Position,
};
use heliomap_core::units::{Angle, Length};

#[derive(Args)]
pub struct ConvertArgs {
    /// Source frame (hgs, hgc, hci, hcc, hpc or full name)
    #[arg(long)]
    pub from: String,

    /// Target frame
    #[arg(long)]
    pub to: String,

    /// Longitude in degrees (arcseconds for helioprojective)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Latitude in degrees (arcseconds for helioprojective)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Distance in solar radii. Optional only for helioprojective input,
    /// which is then placed on the solar surface.
    #[arg(long)]
    pub radius: Option<f64>,

    /// Observation time of the source frame (ISO 8601)
    #[arg(long)]
    pub time: String,

    /// Observation time of the target frame, if different
    #[arg(long)]
    pub target_time: Option<String>,

    /// Observer of the source frame, for heliocentric/helioprojective
    #[arg(long, default_value = "earth")]
    pub observer: String,

    /// Observer of the target frame, if different
    #[arg(long)]
    pub target_observer: Option<String>,
}

pub fn run(args: &ConvertArgs) -> Result<()> {
    let provider = CachedEphemeris::new(KeplerianEphemeris);

    let from_kind: FrameKind = args.from.parse()?;
    let to_kind: FrameKind = args.to.parse()?;
    let time = parse_obstime(&args.time)?;
    let target_time = match args.target_time {
        Some(ref t) => parse_obstime(t)?,
        None => time,
    };
    let observer: Body = args.observer.parse()?;
    let target_observer: Body = match args.target_observer {
        Some(ref b) => b.parse()?,
        None => observer,
    };

    let source = frame_for(from_kind, time, observer, &provider)?;
    let target = frame_for(to_kind, target_time, target_observer, &provider)?;

    let angle = |v: f64| {
        if from_kind == FrameKind::Helioprojective {
            Angle::from_arcsec(v)
        } else {
            Angle::from_degrees(v)
        }
    };
    let position = Position::Spherical {
        lon: angle(args.lon),
        lat: angle(args.lat),
        radius: args.radius.map(Length::from_solar_radii),
    };
    let coord = Coordinate::new(source, position).context("Invalid input coordinate")?;
    let converted = coord
        .transform_to(&target)
        .with_context(|| format!("Failed to convert {} to {}", from_kind, to_kind))?;

    println!("Input:   {}", describe(&coord));
    println!("Output:  {}", describe(&converted));
    println!("Frame:   {}", converted.frame());
    Ok(())
}

fn frame_for(
    kind: FrameKind,
    time: DateTime<Utc>,
    observer: Body,
    provider: &CachedEphemeris<KeplerianEphemeris>,
) -> Result<Frame> {
    let frame = if kind.is_observer_based() {
        Frame::with_body_observer(kind, time, observer, provider)?
    } else {
        Frame::build(kind, &heliomap_core::coords::FrameParams::at(time))?
    };
    Ok(frame)
}

fn describe(coord: &Coordinate) -> String {
    match *coord.position() {
        Position::Spherical { lon, lat, radius } => {
            let angles = if coord.frame().kind() == FrameKind::Helioprojective {
                format!("Tx {:.3}\"  Ty {:.3}\"", lon.arcsec(), lat.arcsec())
            } else {
                format!("lon {}  lat {}", lon, lat)
            };
            match radius {
                Some(r) => format!("{angles}  distance {:.6} Rsun", r.solar_radii()),
                None => angles,
            }
        }
        Position::Cartesian { x, y, z } => format!(
            "x {:.6}  y {:.6}  z {:.6} Rsun",
            x.solar_radii(),
            y.solar_radii(),
            z.solar_radii()
        ),
    }
}
