//! Simple bound checks and their projections.
//!
//! Bus voltage, DC line flows and transformer controls are each checked
//! against their static limits and then clamped onto them, so that the
//! network equations downstream see a point inside the box. Their violations
//! are reported but never make a solution infeasible: any mismatch left over
//! by the clamp surfaces in bus balance instead. Shunt steps are integers and
//! are checked without projection.

use gridscore_core::{DcLine, DcLineSolution, Problem, TimeMatrix, TransformerSolution};
use serde::Serialize;
use tracing::debug;

use crate::numeric::{clamp_hi_lo, max_with_location, positive_part, Extremum, Label};

/// Worst excess over the upper and the lower bound.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoundViolations {
    pub max: Option<Extremum>,
    pub min: Option<Extremum>,
}

/// `max(x − hi, 0)` with a per-row upper bound.
pub fn upper_excess(x: &TimeMatrix<f64>, hi: &[f64]) -> TimeMatrix<f64> {
    x.map_indexed(|i, _, v| positive_part(v - hi[i]))
}

/// `max(lo − x, 0)` with a per-row lower bound.
pub fn lower_excess(x: &TimeMatrix<f64>, lo: &[f64]) -> TimeMatrix<f64> {
    x.map_indexed(|i, _, v| positive_part(lo[i] - v))
}

/// Clamp to `hi` first and then to `lo`, so `lo` wins an inverted range.
pub fn project(x: &TimeMatrix<f64>, lo: &[f64], hi: &[f64]) -> TimeMatrix<f64> {
    x.map_indexed(|i, _, v| clamp_hi_lo(v, lo[i], hi[i]))
}

fn check(
    x: &TimeMatrix<f64>,
    lo: &[f64],
    hi: &[f64],
    rows: &[Label],
    cols: &[Label],
) -> BoundViolations {
    BoundViolations {
        max: max_with_location(&upper_excess(x, hi), rows, cols),
        min: max_with_location(&lower_excess(x, lo), rows, cols),
    }
}

fn interval_labels(problem: &Problem) -> Vec<Label> {
    Label::indices(problem.num_t())
}

/// Bus voltage magnitude check; returns the violations and the projected voltage.
pub fn evaluate_voltage(
    problem: &Problem,
    v: &TimeMatrix<f64>,
) -> (BoundViolations, TimeMatrix<f64>) {
    let rows = Label::uids(problem.buses.iter().map(|b| b.uid.as_str()));
    let lo: Vec<f64> = problem.buses.iter().map(|b| b.v_min).collect();
    let hi: Vec<f64> = problem.buses.iter().map(|b| b.v_max).collect();
    let viol = check(v, &lo, &hi, &rows, &interval_labels(problem));
    (viol, project(v, &lo, &hi))
}

#[derive(Debug, Clone)]
pub struct ShuntReport {
    pub steps: BoundViolations,
    /// `g_st · u_st · v²`
    pub p: TimeMatrix<f64>,
    /// `−b_st · u_st · v²`
    pub q: TimeMatrix<f64>,
}

/// Shunt step bounds and the shunt consumption at the (projected) bus voltage.
pub fn evaluate_shunts(
    problem: &Problem,
    u_st: &TimeMatrix<i64>,
    v: &TimeMatrix<f64>,
) -> ShuntReport {
    let shunts = &problem.shunts;
    let rows = Label::uids(shunts.iter().map(|s| s.uid.as_str()));
    let cols = interval_labels(problem);
    let over = u_st.map_indexed(|i, _, u| (u - shunts[i].u_st_max).max(0));
    let under = u_st.map_indexed(|i, _, u| (shunts[i].u_st_min - u).max(0));

    let v_sq = |i: usize, t: usize| {
        let vb = v.get(shunts[i].bus.value(), t);
        vb * vb
    };
    let p = u_st.map_indexed(|i, t, u| shunts[i].g_st * u as f64 * v_sq(i, t));
    let q = u_st.map_indexed(|i, t, u| -shunts[i].b_st * u as f64 * v_sq(i, t));

    ShuntReport {
        steps: BoundViolations {
            max: max_with_location(&over.to_f64(), &rows, &cols),
            min: max_with_location(&under.to_f64(), &rows, &cols),
        },
        p,
        q,
    }
}

#[derive(Debug, Clone)]
pub struct DcLineReport {
    pub p: BoundViolations,
    pub q_fr: BoundViolations,
    pub q_to: BoundViolations,
    /// Projected flows
    pub flows: DcLineSolution,
}

/// DC line bounds: `p ∈ [−p_max, p_max]` and the terminal reactive ranges.
pub fn evaluate_dc_lines(problem: &Problem, dcl: &DcLineSolution) -> DcLineReport {
    let lines = &problem.dc_lines;
    let rows = Label::uids(lines.iter().map(|l| l.uid.as_str()));
    let cols = interval_labels(problem);
    let column = |f: fn(&DcLine) -> f64| lines.iter().map(f).collect::<Vec<_>>();

    let p_hi = column(|l| l.p_max);
    let p_lo = column(|l| -l.p_max);
    let q_fr_lo = column(|l| l.q_fr_min);
    let q_fr_hi = column(|l| l.q_fr_max);
    let q_to_lo = column(|l| l.q_to_min);
    let q_to_hi = column(|l| l.q_to_max);

    DcLineReport {
        p: check(&dcl.p, &p_lo, &p_hi, &rows, &cols),
        q_fr: check(&dcl.q_fr, &q_fr_lo, &q_fr_hi, &rows, &cols),
        q_to: check(&dcl.q_to, &q_to_lo, &q_to_hi, &rows, &cols),
        flows: DcLineSolution {
            p: project(&dcl.p, &p_lo, &p_hi),
            q_fr: project(&dcl.q_fr, &q_fr_lo, &q_fr_hi),
            q_to: project(&dcl.q_to, &q_to_lo, &q_to_hi),
        },
    }
}

#[derive(Debug, Clone)]
pub struct TransformerControlReport {
    pub tau: BoundViolations,
    pub phi: BoundViolations,
    /// Settings used by the flow equations (projected unless disabled)
    pub tau_used: TimeMatrix<f64>,
    pub phi_used: TimeMatrix<f64>,
}

/// Tap ratio and phase shift bounds.
pub fn evaluate_transformer_controls(
    problem: &Problem,
    xfr: &TransformerSolution,
    project_controls: bool,
) -> TransformerControlReport {
    let xfrs = &problem.transformers;
    let rows = Label::uids(xfrs.iter().map(|x| x.branch.uid.as_str()));
    let cols = interval_labels(problem);
    let tau_lo: Vec<f64> = xfrs.iter().map(|x| x.tau_min).collect();
    let tau_hi: Vec<f64> = xfrs.iter().map(|x| x.tau_max).collect();
    let phi_lo: Vec<f64> = xfrs.iter().map(|x| x.phi_min).collect();
    let phi_hi: Vec<f64> = xfrs.iter().map(|x| x.phi_max).collect();

    let report = TransformerControlReport {
        tau: check(&xfr.tau, &tau_lo, &tau_hi, &rows, &cols),
        phi: check(&xfr.phi, &phi_lo, &phi_hi, &rows, &cols),
        tau_used: if project_controls {
            project(&xfr.tau, &tau_lo, &tau_hi)
        } else {
            xfr.tau.clone()
        },
        phi_used: if project_controls {
            project(&xfr.phi, &phi_lo, &phi_hi)
        } else {
            xfr.phi.clone()
        },
    };
    debug!(
        num_xfr = xfrs.len(),
        projected = project_controls,
        "transformer controls checked"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscore_core::{Bus, BusId, Intervals, Shunt};

    fn problem() -> Problem {
        Problem {
            intervals: Intervals {
                durations: vec![1.0, 1.0],
            },
            buses: vec![
                Bus {
                    uid: "b0".into(),
                    v_min: 0.95,
                    v_max: 1.05,
                },
                Bus {
                    uid: "b1".into(),
                    v_min: 0.9,
                    v_max: 1.1,
                },
            ],
            ..Problem::default()
        }
    }

    #[test]
    fn voltage_is_checked_then_clamped() {
        let p = problem();
        let v = TimeMatrix::from_rows(vec![vec![1.10, 1.0], vec![0.85, 1.0]]).unwrap();
        let (viol, projected) = evaluate_voltage(&p, &v);
        let max = viol.max.unwrap();
        assert!((max.val - 0.05).abs() < 1e-12);
        assert_eq!(max.idx, vec![Label::Uid("b0".into()), Label::Index(0)]);
        assert!((viol.min.unwrap().val - 0.05).abs() < 1e-12);
        assert_eq!(projected.row(0), &[1.05, 1.0]);
        assert_eq!(projected.row(1), &[0.9, 1.0]);
    }

    #[test]
    fn shunt_flows_scale_with_steps_and_voltage() {
        let mut p = problem();
        p.shunts = vec![Shunt {
            uid: "sh0".into(),
            bus: BusId::new(1),
            g_st: 0.1,
            b_st: 0.5,
            u_st_min: 0,
            u_st_max: 2,
        }];
        let u_st = TimeMatrix::from_rows(vec![vec![1, 3]]).unwrap();
        let v = TimeMatrix::from_rows(vec![vec![1.0, 1.0], vec![1.0, 0.9]]).unwrap();
        let report = evaluate_shunts(&p, &u_st, &v);
        assert!((report.p.get(0, 0) - 0.1).abs() < 1e-12);
        assert!((report.q.get(0, 0) + 0.5).abs() < 1e-12);
        assert!((report.p.get(0, 1) - 0.3 * 0.81).abs() < 1e-12);
        let over = report.steps.max.unwrap();
        assert_eq!(over.val, 1.0);
        assert_eq!(over.idx_int, vec![0, 1]);
        assert_eq!(report.steps.min.unwrap().val, 0.0);
    }

    #[test]
    fn dc_line_limits_are_symmetric_in_p() {
        let mut p = problem();
        p.dc_lines = vec![DcLine {
            uid: "dc0".into(),
            fr_bus: BusId::new(0),
            to_bus: BusId::new(1),
            p_max: 1.0,
            q_fr_min: -0.5,
            q_fr_max: 0.5,
            q_to_min: -0.5,
            q_to_max: 0.5,
        }];
        let dcl = DcLineSolution {
            p: TimeMatrix::from_rows(vec![vec![-1.5, 0.5]]).unwrap(),
            q_fr: TimeMatrix::from_rows(vec![vec![0.0, 0.7]]).unwrap(),
            q_to: TimeMatrix::zeros(1, 2),
        };
        let report = evaluate_dc_lines(&p, &dcl);
        assert!((report.p.min.as_ref().unwrap().val - 0.5).abs() < 1e-12);
        assert_eq!(report.p.max.as_ref().unwrap().val, 0.0);
        assert!((report.q_fr.max.as_ref().unwrap().val - 0.2).abs() < 1e-12);
        assert_eq!(report.flows.p.row(0), &[-1.0, 0.5]);
        assert_eq!(report.flows.q_fr.row(0), &[0.0, 0.5]);
    }

    #[test]
    fn projection_prefers_lower_bound_when_inverted() {
        let x = TimeMatrix::from_rows(vec![vec![0.5]]).unwrap();
        let out = project(&x, &[1.0], &[0.0]);
        assert_eq!(out.get(0, 0), 1.0);
    }
}
