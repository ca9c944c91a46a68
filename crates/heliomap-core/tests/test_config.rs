#[allow(dead_code)]
mod common;

use std::path::PathBuf;
use std::sync::Mutex;

use approx::assert_abs_diff_eq;
use tempfile::tempdir;

use heliomap_core::coords::{Body, FrameKind, KeplerianEphemeris};
use heliomap_core::error::HelioError;
use heliomap_core::interpolate::Interpolation;
use heliomap_core::io::{read_map, write_map};
use heliomap_core::job::{run_job, JobStage, ReprojectJob, TargetWcs};
use heliomap_core::map::Projection;
use heliomap_core::reproject::{CombineRule, ReprojectConfig};

use common::{hpc_map, obstime, ramp};

fn earth_target(obstime: Option<&str>) -> TargetWcs {
    TargetWcs::Helioprojective {
        observer: Body::Earth,
        obstime: obstime.map(str::to_string),
        shape: [24, 32],
        scale_arcsec: [4.0, 4.0],
        center_arcsec: [0.0, 0.0],
        rotation_deg: 0.0,
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn test_default_job_toml_round_trip() {
    let job = ReprojectJob::default();
    let text = toml::to_string(&job).unwrap();
    assert!(text.contains("frame = \"helioprojective\""));
    let parsed: ReprojectJob = toml::from_str(&text).unwrap();
    assert_eq!(parsed, job);
}

#[test]
fn test_job_json_round_trip() {
    let job = ReprojectJob {
        inputs: vec![PathBuf::from("a.fits"), PathBuf::from("b.fits")],
        output: PathBuf::from("out.fits"),
        target: TargetWcs::Heliographic {
            carrington: true,
            obstime: Some("2017-08-01T00:00:00".into()),
            shape: [180, 360],
        },
        options: ReprojectConfig {
            interpolation: Interpolation::Nearest,
            combine: CombineRule::Median,
            fill: Some(0.0),
        },
    };
    let text = serde_json::to_string(&job).unwrap();
    let parsed: ReprojectJob = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, job);
}

#[test]
fn test_hand_written_job_uses_defaults() {
    let text = r#"
inputs = ["aia.fits"]
output = "carrington.fits"

[target]
frame = "heliographic"
carrington = true
shape = [180, 360]
"#;
    let job: ReprojectJob = toml::from_str(text).unwrap();
    assert_eq!(job.target.kind(), FrameKind::HeliographicCarrington);
    assert_eq!(job.options, ReprojectConfig::default());
    assert_eq!(job.options.interpolation, Interpolation::Bilinear);
    assert_eq!(job.options.combine, CombineRule::Mean);
    assert!(job.options.fill_value().is_nan());

    let text = r#"
inputs = ["a.fits", "b.fits"]
output = "earth.fits"

[target]
frame = "helioprojective"
observer = "mars"
shape = [512, 512]
scale_arcsec = [1.2, 1.2]

[options]
combine = "Sum"
fill = -1.0
"#;
    let job: ReprojectJob = toml::from_str(text).unwrap();
    match &job.target {
        TargetWcs::Helioprojective {
            observer,
            center_arcsec,
            rotation_deg,
            ..
        } => {
            assert_eq!(*observer, Body::Mars);
            assert_eq!(*center_arcsec, [0.0, 0.0]);
            assert_eq!(*rotation_deg, 0.0);
        }
        other => panic!("unexpected target {other:?}"),
    }
    assert_eq!(job.options.combine, CombineRule::Sum);
    assert_eq!(job.options.fill_value(), -1.0);
}

#[test]
fn test_display_names() {
    assert_eq!(JobStage::Reading.to_string(), "Reading maps");
    assert_eq!(JobStage::Writing.to_string(), "Writing output");
    assert_eq!(CombineRule::Median.to_string(), "Median");
    assert_eq!(Interpolation::Nearest.to_string(), "Nearest");
}

// ---------------------------------------------------------------------------
// Target grids
// ---------------------------------------------------------------------------

#[test]
fn test_build_helioprojective_target() {
    let wcs = earth_target(Some("2017-08-01T00:00:00"))
        .build(&KeplerianEphemeris, None)
        .unwrap();
    assert_eq!(wcs.shape(), (24, 32));
    assert_eq!(wcs.projection(), Projection::Tan);
    assert_eq!(wcs.frame().obstime(), obstime());
    assert_abs_diff_eq!(wcs.cdelt().x * 3600.0, 4.0, epsilon = 1e-9);
    let obs = wcs.frame().observer().unwrap();
    assert_abs_diff_eq!(obs.lon.degrees(), 0.0, epsilon = 1e-9);
}

#[test]
fn test_build_rejects_sun_as_observer() {
    let target = TargetWcs::Helioprojective {
        observer: Body::Sun,
        obstime: Some("2017-08-01T00:00:00".into()),
        shape: [24, 32],
        scale_arcsec: [4.0, 4.0],
        center_arcsec: [0.0, 0.0],
        rotation_deg: 0.0,
    };
    let err = target.build(&KeplerianEphemeris, None).unwrap_err();
    assert!(matches!(err, HelioError::InvalidCoordinate(_)));
}

#[test]
fn test_build_uses_fallback_time() {
    let later = obstime() + chrono::Duration::days(3);
    let wcs = earth_target(None).build(&KeplerianEphemeris, Some(later)).unwrap();
    assert_eq!(wcs.frame().obstime(), later);

    let explicit = earth_target(Some("2017-08-01"))
        .build(&KeplerianEphemeris, Some(later))
        .unwrap();
    assert_eq!(explicit.frame().obstime(), obstime());
}

#[test]
fn test_build_errors() {
    assert!(matches!(
        earth_target(None).build(&KeplerianEphemeris, None),
        Err(HelioError::MissingTime {
            kind: FrameKind::Helioprojective
        })
    ));

    let bad_scale = TargetWcs::Helioprojective {
        observer: Body::Earth,
        obstime: None,
        shape: [8, 8],
        scale_arcsec: [0.0, 1.0],
        center_arcsec: [0.0, 0.0],
        rotation_deg: 0.0,
    };
    assert!(matches!(
        bad_scale.build(&KeplerianEphemeris, Some(obstime())),
        Err(HelioError::Config(_))
    ));
}

#[test]
fn test_build_heliographic_target() {
    let target = TargetWcs::Heliographic {
        carrington: false,
        obstime: None,
        shape: [90, 180],
    };
    let wcs = target.build(&KeplerianEphemeris, Some(obstime())).unwrap();
    assert_eq!(wcs.frame().kind(), FrameKind::HeliographicStonyhurst);
    assert_eq!(wcs.projection(), Projection::Car);
    assert_abs_diff_eq!(wcs.cdelt().x, 2.0, epsilon = 1e-12);
}

// ---------------------------------------------------------------------------
// Running jobs
// ---------------------------------------------------------------------------

#[test]
fn test_validate() {
    let mut job = ReprojectJob::default();
    assert!(job.validate().is_ok());

    job.options.fill = Some(f32::INFINITY);
    assert!(matches!(job.validate(), Err(HelioError::Config(_))));

    job.options.fill = None;
    job.inputs.clear();
    assert!(matches!(job.validate(), Err(HelioError::Config(_))));
}

#[test]
fn test_run_job_single_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.fits");
    write_map(&input, &hpc_map(ramp(32, 32), 4.0)).unwrap();

    let job = ReprojectJob {
        inputs: vec![input],
        output: dir.path().join("out.fits"),
        target: earth_target(None),
        options: ReprojectConfig::default(),
    };
    let stages = Mutex::new(Vec::new());
    let result = run_job(&job, &KeplerianEphemeris, |stage, fraction| {
        stages.lock().unwrap().push((stage, fraction));
    })
    .unwrap();

    assert_eq!(result.dimensions(), (32, 24));
    assert_eq!(result.date(), obstime());
    assert!(result.data().iter().any(|v| v.is_finite()));

    let written = read_map(&job.output).unwrap();
    assert_eq!(written.dimensions(), (32, 24));

    let stages = stages.into_inner().unwrap();
    assert_eq!(stages.first(), Some(&(JobStage::Reading, 0.0)));
    assert_eq!(stages.last(), Some(&(JobStage::Writing, 1.0)));
    assert!(stages.contains(&(JobStage::Reprojecting, 1.0)));
}

#[test]
fn test_run_job_coadds_several_inputs() {
    let dir = tempdir().unwrap();
    let mut inputs = Vec::new();
    for (i, value) in [1.0f32, 3.0].into_iter().enumerate() {
        let path = dir.path().join(format!("in{i}.fits"));
        let map = hpc_map(ndarray::Array2::from_elem((32, 32), value), 4.0);
        write_map(&path, &map).unwrap();
        inputs.push(path);
    }

    let job = ReprojectJob {
        inputs,
        output: dir.path().join("coadd.fits"),
        target: earth_target(None),
        options: ReprojectConfig::default(),
    };
    let result = run_job(&job, &KeplerianEphemeris, |_, _| {}).unwrap();
    let centre = result.data()[[12, 16]];
    assert_abs_diff_eq!(centre, 2.0, epsilon = 1e-4);
}

#[test]
fn test_run_job_reports_missing_input() {
    let dir = tempdir().unwrap();
    let job = ReprojectJob {
        inputs: vec![dir.path().join("nope.fits")],
        output: dir.path().join("out.fits"),
        target: earth_target(None),
        options: ReprojectConfig::default(),
    };
    assert!(matches!(
        run_job(&job, &KeplerianEphemeris, |_, _| {}),
        Err(HelioError::Io(_))
    ));
    assert!(!job.output.exists());
}
