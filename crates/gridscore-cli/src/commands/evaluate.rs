use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use gridscore_algo::{Evaluation, InfeasibilitySummary, SolutionEvaluator, Summary};
use gridscore_cli::{InputArgs, OutputFormat};
use gridscore_core::{Diagnostics, EvalConfig};
use serde::Serialize;
use tabwriter::TabWriter;
use tracing::info;

use super::load_inputs;

/// What `--out` writes.
#[derive(Serialize)]
struct EvaluationReport<'a> {
    summary: &'a Summary,
    infeasibility: &'a InfeasibilitySummary,
    diagnostics: &'a Diagnostics,
}

pub fn handle(
    inputs: &InputArgs,
    config: Option<&Path>,
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = match config {
        Some(path) => EvalConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EvalConfig::default(),
    };
    let (problem, solution) = load_inputs(inputs)?;

    let start = Instant::now();
    let evaluation = SolutionEvaluator::new(&problem, &solution, config)
        .context("solution does not match problem")?
        .run()
        .context("evaluating solution")?;
    info!(
        "Evaluated in {:.1} ms: z = {:.6}, infeasible = {}",
        start.elapsed().as_secs_f64() * 1e3,
        evaluation.objective(),
        evaluation.infeasible()
    );

    match format {
        OutputFormat::Table => println!("{}", render_table(&evaluation)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(evaluation.summary())?),
    }

    if let Some(path) = out {
        let report = EvaluationReport {
            summary: evaluation.summary(),
            infeasibility: evaluation.infeasibility_summary(),
            diagnostics: evaluation.diagnostics(),
        };
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn render_table(evaluation: &Evaluation) -> Result<String> {
    let summary = evaluation.summary();
    let mut writer = TabWriter::new(Vec::new()).padding(2);

    writeln!(writer, "Objective\tValue")?;
    writeln!(writer, "z\t{:.6}", summary.z)?;
    writeln!(writer, "z_base\t{:.6}", summary.z_base)?;
    writeln!(writer, "z_k_worst_case\t{:.6}", summary.z_k_worst_case)?;
    writeln!(writer, "z_k_average_case\t{:.6}", summary.z_k_average_case)?;
    writeln!(writer, "infeas\t{}", summary.infeas)?;
    writeln!(writer)?;

    writeln!(writer, "Violation\tValue\tLocation\tHard")?;
    let infeasibility = evaluation.infeasibility_summary();
    let mut any = false;
    for (key, viol) in summary.violations() {
        let Some(viol) = viol.filter(|v| v.is_violation()) else {
            continue;
        };
        any = true;
        let hard = if infeasibility.get(key).is_some() { "yes" } else { "" };
        writeln!(writer, "{key}\t{:.6e}\t{}\t{hard}", viol.val, viol.location())?;
    }
    if !any {
        writeln!(writer, "(none)\t\t\t")?;
    }

    writer.flush()?;
    Ok(String::from_utf8(writer.into_inner()?)?)
}
