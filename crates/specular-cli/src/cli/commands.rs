use super::CliError;
use super::helpers::{
    artifact_file_stem, contrast_matcher, format_scientific_f64, load_setup, write_text_artifact,
};
use anyhow::Context;
use serde::Serialize;
use specular_core::domain::CalcStrategy;
use specular_core::modules::dispatch::{ContrastResult, Evaluation};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct CheckArgs {
    /// Experiment setup JSON path
    setup: PathBuf,

    /// Maximum tolerated relative chi-squared divergence between strategies
    #[arg(long, default_value_t = 1.0e-9)]
    tolerance: f64,
}

#[derive(clap::Args)]
pub(super) struct EvaluateArgs {
    /// Experiment setup JSON path
    setup: PathBuf,

    /// Override the setup's dispatch strategy (sequential, points, contrasts)
    #[arg(long)]
    strategy: Option<String>,

    /// JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SimulateArgs {
    /// Experiment setup JSON path
    setup: PathBuf,

    /// Output directory for curve artifacts
    #[arg(long, default_value = "artifacts/simulation")]
    out_dir: PathBuf,

    /// Only simulate contrasts whose name matches this glob
    #[arg(long)]
    contrast: Option<String>,

    /// Also write SLD depth profiles
    #[arg(long)]
    profiles: bool,
}

pub(super) fn run_check_command(args: CheckArgs) -> Result<i32, CliError> {
    let setup = load_setup(&args.setup)?;

    let fitted: usize = setup
        .parameters
        .groups()
        .iter()
        .map(|(_, group)| group.fitted_count())
        .sum();
    println!(
        "Setup '{}' is consistent: {} layers, {} contrasts, {} fitted parameters.",
        args.setup.display(),
        setup.layers.len(),
        setup.contrasts.len(),
        fitted
    );
    for contrast in &setup.contrasts {
        match &contrast.data {
            Some(data) => println!(
                "  {}: {} layers, {} data points",
                contrast.name,
                contrast.layer_order.len(),
                data.q.len()
            ),
            None => println!(
                "  {}: {} layers, no data (simulation only)",
                contrast.name,
                contrast.layer_order.len()
            ),
        }
    }

    let mut totals = Vec::new();
    for strategy in [
        CalcStrategy::Sequential,
        CalcStrategy::PointsParallel,
        CalcStrategy::ContrastsParallel,
    ] {
        let mut candidate = setup.clone();
        candidate.controls.strategy = strategy;
        let mut evaluator = candidate.into_evaluator().map_err(CliError::Compute)?;
        let total = evaluator.evaluate_current().map_err(CliError::Compute)?;
        println!("  strategy {strategy}: total chi-squared {}", format_scientific_f64(total));
        totals.push(total);
    }

    let reference = totals[0];
    let divergence = totals[1..]
        .iter()
        .map(|total| ((total - reference) / reference.abs().max(1.0)).abs())
        .fold(0.0_f64, f64::max);
    println!("max strategy divergence {}", format_scientific_f64(divergence));
    if divergence > args.tolerance {
        eprintln!(
            "error: strategy divergence {} exceeds tolerance {}",
            format_scientific_f64(divergence),
            format_scientific_f64(args.tolerance)
        );
        return Ok(1);
    }
    Ok(0)
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    total_chi_squared: f64,
    contrasts: Vec<ContrastReport>,
}

#[derive(Debug, Serialize)]
struct ContrastReport {
    name: String,
    chi_squared: Option<f64>,
    points: usize,
}

impl EvaluationReport {
    fn from_evaluation(evaluation: &Evaluation) -> Self {
        Self {
            total_chi_squared: evaluation.total_chi_squared,
            contrasts: evaluation
                .contrasts
                .iter()
                .map(|result| ContrastReport {
                    name: result.name.clone(),
                    chi_squared: result.chi_squared,
                    points: result.simulated_q.len(),
                })
                .collect(),
        }
    }
}

pub(super) fn run_evaluate_command(args: EvaluateArgs) -> Result<i32, CliError> {
    let mut setup = load_setup(&args.setup)?;
    if let Some(strategy) = args.strategy.as_deref() {
        setup.controls.strategy = CalcStrategy::resolve(strategy);
    }
    let mut evaluator = setup.into_evaluator().map_err(CliError::Compute)?;
    evaluator.evaluate_current().map_err(CliError::Compute)?;

    let evaluation = evaluator
        .take_last_evaluation()
        .expect("evaluation is retained after a successful run");

    for result in &evaluation.contrasts {
        match result.chi_squared {
            Some(chi) => println!("{}: chi-squared {}", result.name, format_scientific_f64(chi)),
            None => println!("{}: no data", result.name),
        }
    }
    println!(
        "total chi-squared {}",
        format_scientific_f64(evaluation.total_chi_squared)
    );

    if let Some(report_path) = &args.report {
        let report = EvaluationReport::from_evaluation(&evaluation);
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        let rendered = serde_json::to_string_pretty(&report)
            .context("failed to serialize evaluation report")?;
        fs::write(report_path, rendered)
            .with_context(|| format!("failed to write '{}'", report_path.display()))?;
        println!("JSON report: {}", report_path.display());
    }

    Ok(0)
}

pub(super) fn run_simulate_command(args: SimulateArgs) -> Result<i32, CliError> {
    let mut setup = load_setup(&args.setup)?;
    if args.profiles {
        setup.controls.compute_sld_profile = true;
    }
    let matcher = contrast_matcher(args.contrast.as_deref())?;

    let mut evaluator = setup.into_evaluator().map_err(CliError::Compute)?;
    evaluator.evaluate_current().map_err(CliError::Compute)?;
    let evaluation = evaluator
        .take_last_evaluation()
        .expect("evaluation is retained after a successful run");

    let selected: Vec<&ContrastResult> = evaluation
        .contrasts
        .iter()
        .filter(|result| {
            matcher
                .as_ref()
                .is_none_or(|matcher| matcher.is_match(&result.name))
        })
        .collect();
    if selected.is_empty() {
        return Err(CliError::Usage(format!(
            "no contrast matches '{}'",
            args.contrast.as_deref().unwrap_or("*")
        )));
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create '{}'", args.out_dir.display()))?;

    let mut written = 0_usize;
    for result in selected {
        let stem = artifact_file_stem(&result.name);
        let curve_path = args.out_dir.join(format!("{stem}.dat"));
        write_text_artifact(&curve_path, &render_curve(result))
            .with_context(|| format!("failed to write '{}'", curve_path.display()))?;
        written += 1;

        if let Some(profile) = &result.sld_profile {
            let profile_path = args.out_dir.join(format!("{stem}-sld.dat"));
            let mut content = String::from("# depth sld\n");
            for (&depth, &sld) in profile.depth.iter().zip(&profile.sld) {
                let _ = writeln!(
                    content,
                    "{} {}",
                    format_scientific_f64(depth),
                    format_scientific_f64(sld)
                );
            }
            write_text_artifact(&profile_path, &content)
                .with_context(|| format!("failed to write '{}'", profile_path.display()))?;
            written += 1;
        }
    }

    println!(
        "Wrote {} artifacts to '{}'.",
        written,
        args.out_dir.display()
    );
    Ok(0)
}

fn render_curve(result: &ContrastResult) -> String {
    let mut content = String::from("# q reflectivity\n");
    for (&q, &reflectivity) in result.simulated_q.iter().zip(&result.simulated) {
        let _ = writeln!(
            content,
            "{} {}",
            format_scientific_f64(q),
            format_scientific_f64(reflectivity)
        );
    }
    content
}
