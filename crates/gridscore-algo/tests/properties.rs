//! Structural properties of the evaluation stages

use gridscore_algo::branch::{line_flows, overload, overload_report, transformer_flows};
use gridscore_algo::device::{startup_shutdown, up_down_time_at_start};
use gridscore_algo::numeric::{piecewise_convex_cost, Label};
use gridscore_algo::topology::{bridges, component_count};
use gridscore_core::{
    AcBranch, Bus, BusId, CostBlock, Intervals, Problem, TimeMatrix, Transformer,
};

const NUM_T: usize = 4;

/// Every on/off trajectory over `NUM_T` intervals, one row each.
fn all_trajectories() -> TimeMatrix<i64> {
    let rows = 1 << NUM_T;
    TimeMatrix::from_fn(rows, NUM_T, |pattern, t| ((pattern >> t) & 1) as i64)
}

#[test]
fn startup_shutdown_track_status_changes() {
    let on = all_trajectories();
    for on_0 in [0, 1] {
        let initial = vec![on_0; on.rows()];
        let (su, sd) = startup_shutdown(&on, &initial);
        for i in 0..on.rows() {
            for t in 0..NUM_T {
                let prev = if t == 0 { on_0 } else { on.get(i, t - 1) };
                assert_eq!(su.get(i, t) - sd.get(i, t), on.get(i, t) - prev);
                assert_eq!(su.get(i, t) * sd.get(i, t), 0, "su and sd at ({i}, {t})");
            }
        }
    }
}

#[test]
fn up_and_down_counters_reset_on_transitions() {
    let on = all_trajectories();
    let durations = [0.5, 1.0, 2.0, 0.25];
    let up_0 = vec![3.0; on.rows()];
    let down_0 = vec![0.0; on.rows()];
    let (up, down) = up_down_time_at_start(&on, &up_0, &down_0, &durations);

    for i in 0..on.rows() {
        assert_eq!(up.get(i, 0), 3.0);
        for t in 0..NUM_T - 1 {
            if on.get(i, t) == 1 {
                assert!((up.get(i, t + 1) - up.get(i, t) - durations[t]).abs() < 1e-12);
                assert_eq!(down.get(i, t + 1), 0.0, "downtime resets after on ({i}, {t})");
            } else {
                assert!((down.get(i, t + 1) - down.get(i, t) - durations[t]).abs() < 1e-12);
                assert_eq!(up.get(i, t + 1), 0.0, "uptime resets after off ({i}, {t})");
            }
        }
    }
}

#[test]
fn chord_protects_the_cycle_it_closes() {
    // path 0-1-2-3-4 plus chord 1-3: edges 1, 2 and the chord form a cycle
    let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (1, 3)];
    assert_eq!(component_count(5, &edges), 1);
    assert_eq!(bridges(5, &edges), vec![0, 3]);

    for pos in 0..edges.len() {
        let remaining: Vec<(usize, usize)> = edges
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != pos)
            .map(|(_, &e)| e)
            .collect();
        let expected = if pos == 0 || pos == 3 { 2 } else { 1 };
        assert_eq!(component_count(5, &remaining), expected, "removing edge {pos}");
    }
}

#[test]
fn parallel_branches_are_not_bridges() {
    let edges = [(0, 1), (0, 1), (1, 2)];
    assert_eq!(bridges(3, &edges), vec![2]);
}

#[test]
fn energy_cost_is_additive_over_duration() {
    let blocks = [
        CostBlock { p_max: 4.0, cost: 1.5 },
        CostBlock { p_max: 6.0, cost: 3.0 },
        CostBlock { p_max: 5.0, cost: 7.0 },
    ];
    let partition = [0.25, 0.5, 0.125, 0.125];
    let total: f64 = partition.iter().sum();
    for p in [0.0, 2.0, 4.0, 9.5, 15.0, 18.0] {
        let whole = piecewise_convex_cost(&blocks, p) * total;
        let split: f64 = partition
            .iter()
            .map(|d| piecewise_convex_cost(&blocks, p) * d)
            .sum();
        assert!((whole - split).abs() < 1e-10, "p = {p}");
    }
}

fn lossy_branch(fr: usize, to: usize) -> AcBranch {
    AcBranch {
        uid: "l0".into(),
        fr_bus: BusId::new(fr),
        to_bus: BusId::new(to),
        r: 0.02,
        x: 0.2,
        b_ch: 0.1,
        g_fr: 0.01,
        b_fr: 0.02,
        g_to: 0.0,
        b_to: 0.03,
        s_max: 1.0,
        startup_cost: 0.0,
        shutdown_cost: 0.0,
        on_status_0: 1,
    }
}

fn two_bus_with(branch: AcBranch) -> Problem {
    Problem {
        intervals: Intervals {
            durations: vec![1.0, 0.5],
        },
        buses: vec![
            Bus {
                uid: "b0".into(),
                v_min: 0.9,
                v_max: 1.1,
            },
            Bus {
                uid: "b1".into(),
                v_min: 0.9,
                v_max: 1.1,
            },
        ],
        ac_lines: vec![branch],
        ..Problem::default()
    }
}

#[test]
fn overload_is_symmetric_in_branch_orientation() {
    let forward = two_bus_with(lossy_branch(0, 1));
    let mut reversed_branch = lossy_branch(1, 0);
    reversed_branch.g_fr = forward.ac_lines[0].g_to;
    reversed_branch.b_fr = forward.ac_lines[0].b_to;
    reversed_branch.g_to = forward.ac_lines[0].g_fr;
    reversed_branch.b_to = forward.ac_lines[0].b_fr;
    let reversed = two_bus_with(reversed_branch);

    let v = TimeMatrix::from_rows(vec![vec![1.05, 0.98], vec![0.97, 1.02]]).unwrap();
    let theta = TimeMatrix::from_rows(vec![vec![0.3, -0.1], vec![0.0, 0.25]]).unwrap();
    let on = TimeMatrix::filled(1, 2, 1_i64);

    let fwd = line_flows(&forward, &v, &theta, &on);
    let rev = line_flows(&reversed, &v, &theta, &on);
    for t in 0..2 {
        let (a, b) = (fwd.get(0, t), rev.get(0, t));
        assert!((a.p_fr - b.p_to).abs() < 1e-10);
        assert!((a.q_fr - b.q_to).abs() < 1e-10);
        assert!((a.p_to - b.p_fr).abs() < 1e-10);
        assert!((a.q_to - b.q_fr).abs() < 1e-10);
    }

    let uids = Label::uids(["l0"]);
    let durations = forward.durations();
    let fwd_report = overload_report(&overload(&fwd, &[1.0]), &uids, durations, 50.0);
    let rev_report = overload_report(&overload(&rev, &[1.0]), &uids, durations, 50.0);
    let fwd_viol = fwd_report.viol.as_ref().unwrap();
    let rev_viol = rev_report.viol.as_ref().unwrap();
    assert!((fwd_viol.val - rev_viol.val).abs() < 1e-10);
    assert_eq!(fwd_viol.idx_int, rev_viol.idx_int);
    assert!((fwd_report.total_cost() - rev_report.total_cost()).abs() < 1e-9);
}

#[test]
fn degenerate_branches_surface_in_overload() {
    let uids = Label::uids(["l0"]);
    let v = TimeMatrix::filled(2, 2, 1.0);
    let theta = TimeMatrix::from_rows(vec![vec![0.1, 0.0], vec![0.0, 0.0]]).unwrap();
    let on = TimeMatrix::filled(1, 2, 1_i64);

    // zero series impedance
    let mut shorted = lossy_branch(0, 1);
    shorted.r = 0.0;
    shorted.x = 0.0;
    let problem = two_bus_with(shorted);
    let flows = line_flows(&problem, &v, &theta, &on);
    assert!(flows.get(0, 0).p_fr.is_nan());
    let report = overload_report(&overload(&flows, &[1.0]), &uids, problem.durations(), 50.0);
    let viol = report.viol.as_ref().unwrap();
    assert!(viol.val.is_nan());
    assert_eq!(viol.idx_int, vec![0, 0]);
    assert!(viol.is_violation());

    // zero tap ratio
    let mut problem = two_bus_with(lossy_branch(0, 1));
    problem.transformers = vec![Transformer {
        branch: problem.ac_lines.remove(0),
        tau_min: 0.0,
        tau_max: 1.1,
        phi_min: 0.0,
        phi_max: 0.0,
    }];
    let tau = TimeMatrix::from_rows(vec![vec![1.0, 0.0]]).unwrap();
    let phi = TimeMatrix::filled(1, 2, 0.0);
    let flows = transformer_flows(&problem, &v, &theta, &on, &tau, &phi);
    assert!(flows.get(0, 0).p_fr.is_finite());
    assert!(!flows.get(0, 1).p_fr.is_finite());
    let report = overload_report(&overload(&flows, &[1.0]), &uids, problem.durations(), 50.0);
    let viol = report.viol.as_ref().unwrap();
    assert!(!viol.val.is_finite());
    assert_eq!(viol.idx_int, vec![0, 1]);
}
