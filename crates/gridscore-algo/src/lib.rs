//! # gridscore-algo: Multi-period AC solution evaluation
//!
//! Scores a candidate operating plan against a [`Problem`](gridscore_core::Problem):
//! every violation with its location, the net market surplus objective and a
//! single feasibility verdict.
//!
//! ## Pipeline
//!
//! | Stage | Module | Outcome |
//! |-------|--------|---------|
//! | Commitment | [`device`] | startup/shutdown, up/down time, startup windows and states |
//! | Bounds | [`bounds`] | voltage, shunt, DC line and transformer control limits, projected |
//! | Branches | [`branch`] | switching, π-model terminal flows, overload |
//! | Balance | [`balance`] | bus p/q shortfall, zonal reserves, offer costs |
//! | Topology | [`topology`] | islands and contingency-exposed bridges |
//! | Objective | [`objective`] | base and contingency surplus, hard violations |
//!
//! [`SolutionEvaluator`] runs the stages in their fixed order and returns an
//! [`Evaluation`] holding the flat [`Summary`] and the derived arrays.
//!
//! ## Feasibility
//!
//! Only integer and topological requirements make a solution infeasible:
//! commitment bounds, minimum up/down time, startup windows, shunt steps,
//! forbidden switching and connectivity. Continuous quantities (balance,
//! overload, reserves) are priced into the objective, and continuous bounds
//! (voltage, DC lines, transformer controls) are projected before use.
//!
//! ## Example
//!
//! ```ignore
//! use gridscore_algo::SolutionEvaluator;
//! use gridscore_core::{EvalConfig, Problem, Solution};
//!
//! let problem = Problem::load("problem.json")?;
//! let solution = Solution::load("solution.json", problem.num_t())?;
//!
//! let evaluation = SolutionEvaluator::new(&problem, &solution, EvalConfig::default())?.run()?;
//! println!("z = {}, infeasible = {}", evaluation.objective(), evaluation.infeasible());
//! ```

pub mod balance;
pub mod bounds;
pub mod branch;
pub mod device;
pub mod evaluator;
pub mod numeric;
pub mod objective;
pub mod summary;
pub mod topology;

pub use evaluator::{Evaluation, SolutionEvaluator};
pub use numeric::{Extremum, Label};
pub use objective::{InfeasibilitySummary, HARD_VIOLATION_KEYS};
pub use summary::Summary;
