use anyhow::{bail, Context, Result};
use gridscore_algo::SolutionEvaluator;
use gridscore_cli::InputArgs;
use gridscore_core::{EvalConfig, Severity};

use super::load_inputs;

pub fn handle(inputs: &InputArgs) -> Result<()> {
    let (problem, solution) = load_inputs(inputs)?;
    let evaluator = SolutionEvaluator::new(&problem, &solution, EvalConfig::default())
        .context("solution does not match problem")?;

    println!(
        "Inputs OK: {} intervals, {} buses, {} devices",
        problem.num_t(),
        problem.buses.len(),
        problem.devices.len()
    );
    let diagnostics = evaluator.diagnostics();
    if !diagnostics.is_empty() {
        print!("{diagnostics}");
    }
    if diagnostics.has_errors() {
        bail!(
            "{} input error(s) would make the evaluation non-finite",
            diagnostics.count(Severity::Error)
        );
    }
    Ok(())
}
