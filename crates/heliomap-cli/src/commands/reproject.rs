use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use heliomap_core::coords::{CachedEphemeris, KeplerianEphemeris};
use heliomap_core::job::{run_job, ReprojectJob};
use indicatif::{ProgressBar, ProgressStyle};

use crate::summary::print_job_summary;

#[derive(Args)]
pub struct ReprojectArgs {
    /// Reprojection job file (TOML)
    #[arg(long)]
    pub config: PathBuf,

    /// Override the output path from the job file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ReprojectArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read config {}", args.config.display()))?;
    let mut job: ReprojectJob = toml::from_str(&contents).context("Invalid reprojection job")?;
    if let Some(ref output) = args.output {
        job.output = output.clone();
    }

    print_job_summary(&job);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}%")?
            .progress_chars("=> "),
    );

    let provider = CachedEphemeris::new(KeplerianEphemeris);
    let map = run_job(&job, &provider, |stage, progress| {
        pb.set_message(stage.to_string());
        pb.set_position((progress * 100.0) as u64);
    })?;

    pb.finish_with_message("Done");
    let (w, h) = map.dimensions();
    println!("\nOutput saved to {} ({}x{})", job.output.display(), w, h);

    Ok(())
}
