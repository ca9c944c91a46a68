use console::Style;
use heliomap_core::job::{ReprojectJob, TargetWcs};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_job_summary(job: &ReprojectJob) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Heliomap Reprojection"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(21)));
    println!();

    for (i, input) in job.inputs.iter().enumerate() {
        let label = if i == 0 { "Input" } else { "" };
        println!(
            "  {:<14}{}",
            s.label.apply_to(label),
            s.path.apply_to(input.display())
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(job.output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Target"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frame"),
        s.method.apply_to(job.target.kind())
    );
    match &job.target {
        TargetWcs::Helioprojective {
            observer,
            shape,
            scale_arcsec,
            center_arcsec,
            rotation_deg,
            ..
        } => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Observer"),
                s.value.apply_to(observer)
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Shape"),
                s.value.apply_to(format!("{}x{}", shape[1], shape[0]))
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Scale"),
                s.value
                    .apply_to(format!("{}\" x {}\"", scale_arcsec[0], scale_arcsec[1]))
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Centre"),
                s.value
                    .apply_to(format!("({}\", {}\")", center_arcsec[0], center_arcsec[1]))
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Rotation"),
                s.value.apply_to(format!("{rotation_deg}\u{b0}"))
            );
        }
        TargetWcs::Heliographic { shape, .. } => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Shape"),
                s.value.apply_to(format!("{}x{}", shape[1], shape[0]))
            );
        }
    }
    let obstime = match &job.target {
        TargetWcs::Helioprojective { obstime, .. } | TargetWcs::Heliographic { obstime, .. } => {
            obstime
        }
    };
    match obstime {
        Some(t) => println!("    {:<12}{}", s.label.apply_to("Time"), s.value.apply_to(t)),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Time"),
            s.disabled.apply_to("from first input")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Resampling"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Kernel"),
        s.method.apply_to(job.options.interpolation)
    );
    if job.inputs.len() > 1 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Combine"),
            s.method.apply_to(job.options.combine)
        );
    }
    match job.options.fill {
        Some(fill) => println!("    {:<12}{}", s.label.apply_to("Fill"), s.value.apply_to(fill)),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Fill"),
            s.disabled.apply_to("NaN")
        ),
    }
    println!();
}
