//! Branch power flow and apparent power limits.
//!
//! Computes terminal flows of AC lines and transformers from the bus voltage
//! solution using the π-equivalent model with an off-nominal tap `τ` and a
//! phase shift `φ` on the from side.
//!
//! ## Branch Flow Equations
//!
//! With series admittance `g + jb = 1/(r + jx)`, terminal shunts `g_fr + jb_fr`,
//! `g_to + jb_to`, charging `b_ch` and `δ = θ_f − θ_t − φ`:
//!
//! ```text
//! P_fr = u·[(g + g_fr)·V_f²/τ² − (g·cos δ + b·sin δ)·V_f·V_t/τ]
//! Q_fr = u·[−(b + b_fr + b_ch/2)·V_f²/τ² + (b·cos δ − g·sin δ)·V_f·V_t/τ]
//! P_to = u·[(g + g_to)·V_t² − (g·cos δ − b·sin δ)·V_f·V_t/τ]
//! Q_to = u·[−(b + b_to + b_ch/2)·V_t² + (b·cos δ + g·sin δ)·V_f·V_t/τ]
//! ```
//!
//! `u` is the branch on/off state. AC lines use `τ = 1`, `φ = 0`. All flows
//! are per unit and leave the bus they are measured at.

use gridscore_core::{AcBranch, Problem, TimeMatrix};

use crate::numeric::{max_with_location, nan_max, positive_part, Extremum, Label};

/// Admittance parameters of one branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchParams {
    pub g_sr: f64,
    pub b_sr: f64,
    pub b_ch: f64,
    pub g_fr: f64,
    pub b_fr: f64,
    pub g_to: f64,
    pub b_to: f64,
}

impl BranchParams {
    pub fn from_branch(branch: &AcBranch) -> Self {
        let y = branch.series_admittance();
        Self {
            g_sr: y.re,
            b_sr: y.im,
            b_ch: branch.b_ch,
            g_fr: branch.g_fr,
            b_fr: branch.b_fr,
            g_to: branch.g_to,
            b_to: branch.b_to,
        }
    }
}

/// Terminal flows of one branch at one interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BranchFlow {
    pub p_fr: f64,
    pub q_fr: f64,
    pub p_to: f64,
    pub q_to: f64,
}

impl BranchFlow {
    pub fn apparent_fr(&self) -> f64 {
        self.p_fr.hypot(self.q_fr)
    }

    pub fn apparent_to(&self) -> f64 {
        self.p_to.hypot(self.q_to)
    }
}

/// Evaluate the π-model at one operating point.
#[allow(clippy::too_many_arguments)]
pub fn compute_branch_flow(
    params: &BranchParams,
    vf: f64,
    vt: f64,
    theta_f: f64,
    theta_t: f64,
    tau: f64,
    phi: f64,
    on: f64,
) -> BranchFlow {
    let BranchParams {
        g_sr: g,
        b_sr: b,
        b_ch,
        g_fr,
        b_fr,
        g_to,
        b_to,
    } = *params;

    let delta = theta_f - theta_t - phi;
    let (sin_d, cos_d) = delta.sin_cos();
    let vf_sq = vf * vf / (tau * tau);
    let vt_sq = vt * vt;
    let cross = vf * vt / tau;

    let p_fr = (g + g_fr) * vf_sq - (g * cos_d + b * sin_d) * cross;
    let q_fr = -(b + b_fr + 0.5 * b_ch) * vf_sq + (b * cos_d - g * sin_d) * cross;
    let p_to = (g + g_to) * vt_sq - (g * cos_d - b * sin_d) * cross;
    let q_to = -(b + b_to + 0.5 * b_ch) * vt_sq + (b * cos_d + g * sin_d) * cross;

    BranchFlow {
        p_fr: on * p_fr,
        q_fr: on * q_fr,
        p_to: on * p_to,
        q_to: on * q_to,
    }
}

/// Terminal flows of a set of branches, each `(num_branch, num_t)`.
#[derive(Debug, Clone)]
pub struct BranchFlows {
    pub p_fr: TimeMatrix<f64>,
    pub q_fr: TimeMatrix<f64>,
    pub p_to: TimeMatrix<f64>,
    pub q_to: TimeMatrix<f64>,
}

impl BranchFlows {
    fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            p_fr: TimeMatrix::zeros(rows, cols),
            q_fr: TimeMatrix::zeros(rows, cols),
            p_to: TimeMatrix::zeros(rows, cols),
            q_to: TimeMatrix::zeros(rows, cols),
        }
    }

    fn set(&mut self, j: usize, t: usize, flow: BranchFlow) {
        self.p_fr.set(j, t, flow.p_fr);
        self.q_fr.set(j, t, flow.q_fr);
        self.p_to.set(j, t, flow.p_to);
        self.q_to.set(j, t, flow.q_to);
    }

    pub fn get(&self, j: usize, t: usize) -> BranchFlow {
        BranchFlow {
            p_fr: self.p_fr.get(j, t),
            q_fr: self.q_fr.get(j, t),
            p_to: self.p_to.get(j, t),
            q_to: self.q_to.get(j, t),
        }
    }

    pub fn num_branches(&self) -> usize {
        self.p_fr.rows()
    }
}

fn evaluate_flows<'a>(
    branches: impl ExactSizeIterator<Item = &'a AcBranch>,
    v: &TimeMatrix<f64>,
    theta: &TimeMatrix<f64>,
    on: &TimeMatrix<i64>,
    control: impl Fn(usize, usize) -> (f64, f64),
) -> BranchFlows {
    let num_t = v.cols();
    let mut flows = BranchFlows::zeros(branches.len(), num_t);
    for (j, branch) in branches.enumerate() {
        let params = BranchParams::from_branch(branch);
        let (f, k) = (branch.fr_bus.value(), branch.to_bus.value());
        for t in 0..num_t {
            let (tau, phi) = control(j, t);
            let flow = compute_branch_flow(
                &params,
                v.get(f, t),
                v.get(k, t),
                theta.get(f, t),
                theta.get(k, t),
                tau,
                phi,
                on.get(j, t) as f64,
            );
            flows.set(j, t, flow);
        }
    }
    flows
}

/// AC line flows (`τ = 1`, `φ = 0`).
pub fn line_flows(
    problem: &Problem,
    v: &TimeMatrix<f64>,
    theta: &TimeMatrix<f64>,
    on: &TimeMatrix<i64>,
) -> BranchFlows {
    evaluate_flows(problem.ac_lines.iter(), v, theta, on, |_, _| (1.0, 0.0))
}

/// Transformer flows at the given tap ratio and phase shift.
pub fn transformer_flows(
    problem: &Problem,
    v: &TimeMatrix<f64>,
    theta: &TimeMatrix<f64>,
    on: &TimeMatrix<i64>,
    tau: &TimeMatrix<f64>,
    phi: &TimeMatrix<f64>,
) -> BranchFlows {
    evaluate_flows(
        problem.transformers.iter().map(|x| &x.branch),
        v,
        theta,
        on,
        |j, t| (tau.get(j, t), phi.get(j, t)),
    )
}

/// `max(0, max(|S_fr|, |S_to|) − s_max)` per branch and interval.
pub fn overload(flows: &BranchFlows, s_max: &[f64]) -> TimeMatrix<f64> {
    let rows = flows.num_branches();
    let cols = flows.p_fr.cols();
    TimeMatrix::from_fn(rows, cols, |j, t| {
        let flow = flows.get(j, t);
        positive_part(nan_max(flow.apparent_fr(), flow.apparent_to()) - s_max[j])
    })
}

/// Overload violation and its duration-weighted penalty.
#[derive(Debug, Clone)]
pub struct OverloadReport {
    pub viol: Option<Extremum>,
    /// `c_s · Σ_j d_t · overload[j, t]` per interval
    pub cost_by_interval: Vec<f64>,
}

impl OverloadReport {
    pub fn total_cost(&self) -> f64 {
        self.cost_by_interval.iter().sum()
    }
}

pub fn overload_report(
    overload: &TimeMatrix<f64>,
    uids: &[Label],
    durations: &[f64],
    c_s: f64,
) -> OverloadReport {
    let viol = max_with_location(overload, uids, &Label::indices(durations.len()));
    let cost_by_interval = overload
        .scale_columns(durations)
        .column_sums()
        .into_iter()
        .map(|s| c_s * s)
        .collect();
    OverloadReport {
        viol,
        cost_by_interval,
    }
}
