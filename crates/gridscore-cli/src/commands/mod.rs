pub mod check;
pub mod evaluate;

use anyhow::{Context, Result};
use gridscore_cli::InputArgs;
use gridscore_core::{Problem, Solution};
use tracing::info;

/// Load the problem, then the solution on the problem's horizon.
pub fn load_inputs(inputs: &InputArgs) -> Result<(Problem, Solution)> {
    let problem = Problem::load(&inputs.problem)
        .with_context(|| format!("loading problem {}", inputs.problem.display()))?;
    let solution = Solution::load(&inputs.solution, problem.num_t())
        .with_context(|| format!("loading solution {}", inputs.solution.display()))?;
    info!(
        "Loaded {} buses, {} devices, {} branches over {} intervals",
        problem.buses.len(),
        problem.devices.len(),
        problem.ac_lines.len() + problem.transformers.len() + problem.dc_lines.len(),
        problem.num_t()
    );
    Ok((problem, solution))
}
