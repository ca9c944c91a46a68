use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coords::ephemeris::{Body, EphemerisProvider};
use crate::coords::frame::{Frame, FrameKind};
use crate::coords::time::parse_obstime;
use crate::error::{HelioError, Result};
use crate::io::fits::{read_map, write_map};
use crate::map::generic::GenericMap;
use crate::map::wcs::WcsDescriptor;
use crate::reproject::{reproject, reproject_and_coadd_with_progress, ReprojectConfig};
use crate::units::Angle;

/// A reprojection run: read the inputs, reproject (and coadd when there is
/// more than one) onto the target grid, write the result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReprojectJob {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub target: TargetWcs,
    #[serde(default)]
    pub options: ReprojectConfig,
}

/// Destination grid description. `shape` is `[rows, cols]`. When `obstime`
/// is omitted the date of the first input map is used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum TargetWcs {
    Helioprojective {
        observer: Body,
        #[serde(default)]
        obstime: Option<String>,
        shape: [usize; 2],
        scale_arcsec: [f64; 2],
        #[serde(default)]
        center_arcsec: [f64; 2],
        #[serde(default)]
        rotation_deg: f64,
    },
    Heliographic {
        #[serde(default)]
        carrington: bool,
        #[serde(default)]
        obstime: Option<String>,
        shape: [usize; 2],
    },
}

impl TargetWcs {
    pub fn kind(&self) -> FrameKind {
        match self {
            TargetWcs::Helioprojective { .. } => FrameKind::Helioprojective,
            TargetWcs::Heliographic {
                carrington: true, ..
            } => FrameKind::HeliographicCarrington,
            TargetWcs::Heliographic { .. } => FrameKind::HeliographicStonyhurst,
        }
    }

    fn obstime(&self, fallback: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
        let explicit = match self {
            TargetWcs::Helioprojective { obstime, .. } | TargetWcs::Heliographic { obstime, .. } => {
                obstime.as_deref()
            }
        };
        match (explicit, fallback) {
            (Some(s), _) => parse_obstime(s),
            (None, Some(t)) => Ok(t),
            (None, None) => Err(HelioError::MissingTime { kind: self.kind() }),
        }
    }

    /// Resolve the description into a WCS, looking up the observer body
    /// with `provider`.
    pub fn build(
        &self,
        provider: &dyn EphemerisProvider,
        fallback_time: Option<DateTime<Utc>>,
    ) -> Result<WcsDescriptor> {
        let obstime = self.obstime(fallback_time)?;
        match self {
            TargetWcs::Helioprojective {
                observer,
                shape,
                scale_arcsec,
                center_arcsec,
                rotation_deg,
                ..
            } => {
                if scale_arcsec.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                    return Err(HelioError::Config(format!(
                        "pixel scale must be finite and non-zero, got {scale_arcsec:?}"
                    )));
                }
                let frame =
                    Frame::with_body_observer(FrameKind::Helioprojective, obstime, *observer, provider)?;
                WcsDescriptor::helioprojective(
                    frame,
                    (shape[0], shape[1]),
                    (
                        Angle::from_arcsec(scale_arcsec[0]),
                        Angle::from_arcsec(scale_arcsec[1]),
                    ),
                    (
                        Angle::from_arcsec(center_arcsec[0]),
                        Angle::from_arcsec(center_arcsec[1]),
                    ),
                    Angle::from_degrees(*rotation_deg),
                )
            }
            TargetWcs::Heliographic {
                carrington, shape, ..
            } => {
                let frame = if *carrington {
                    Frame::carrington(obstime)
                } else {
                    Frame::stonyhurst(obstime)
                };
                WcsDescriptor::heliographic(frame, (shape[0], shape[1]))
            }
        }
    }
}

impl Default for ReprojectJob {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("input.fits")],
            output: PathBuf::from("reprojected.fits"),
            target: TargetWcs::Helioprojective {
                observer: Body::Earth,
                obstime: None,
                shape: [1024, 1024],
                scale_arcsec: [2.4, 2.4],
                center_arcsec: [0.0, 0.0],
                rotation_deg: 0.0,
            },
            options: ReprojectConfig::default(),
        }
    }
}

impl ReprojectJob {
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(HelioError::Config("job has no input files".into()));
        }
        if let Some(fill) = self.options.fill {
            if fill.is_infinite() {
                return Err(HelioError::Config("fill value must not be infinite".into()));
            }
        }
        Ok(())
    }
}

/// Job stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStage {
    Reading,
    Reprojecting,
    Writing,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading maps"),
            Self::Reprojecting => write!(f, "Reprojecting"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Run a job. `progress(stage, fraction)` is called as work completes.
pub fn run_job(
    job: &ReprojectJob,
    provider: &dyn EphemerisProvider,
    progress: impl Fn(JobStage, f32) + Sync,
) -> Result<GenericMap> {
    job.validate()?;
    let total = job.inputs.len();

    progress(JobStage::Reading, 0.0);
    let mut maps = Vec::with_capacity(total);
    for (i, path) in job.inputs.iter().enumerate() {
        maps.push(read_map(path)?);
        progress(JobStage::Reading, (i + 1) as f32 / total as f32);
    }

    let dest = job.target.build(provider, maps.first().map(GenericMap::date))?;
    info!(
        inputs = total,
        frame = %dest.frame(),
        "Target grid resolved"
    );

    progress(JobStage::Reprojecting, 0.0);
    let result = if let [single] = maps.as_slice() {
        reproject(single, &dest, &job.options)?
    } else {
        reproject_and_coadd_with_progress(&maps, &dest, &job.options, |done| {
            progress(JobStage::Reprojecting, done as f32 / total as f32)
        })?
    };
    progress(JobStage::Reprojecting, 1.0);

    progress(JobStage::Writing, 0.0);
    write_map(&job.output, &result)?;
    progress(JobStage::Writing, 1.0);

    info!(output = %job.output.display(), "Job complete");
    Ok(result)
}
