//! Commitment trajectories of simple dispatchable devices.
//!
//! From the on/off matrix `u_on` (plus the pre-horizon state) this module
//! derives startup/shutdown indicators and the uptime/downtime accumulated at
//! the *start* of every interval, then checks the time-coupled commitment
//! rules and prices the commitment decisions:
//!
//! ```text
//! su[t] = max(u[t] − u[t−1], 0)        sd[t] = max(u[t−1] − u[t], 0)
//! up_start[t+1]   = up_start[t] + d[t]   if u[t] = 1, else 0
//! down_start[t+1] = down_start[t] + d[t] if u[t] = 0, else 0
//! ```
//!
//! Every time comparison carries the configured equality tolerance.

use gridscore_core::{Device, Problem, TimeMatrix};
use tracing::debug;

use crate::numeric::{max_with_location, Extremum, Label};

/// Per-interval lower and upper on/off bounds as matrices.
pub fn on_status_limits(devices: &[Device], num_t: usize) -> (TimeMatrix<i64>, TimeMatrix<i64>) {
    let min = TimeMatrix::from_fn(devices.len(), num_t, |i, t| devices[i].on_status_min[t]);
    let max = TimeMatrix::from_fn(devices.len(), num_t, |i, t| devices[i].on_status_max[t]);
    (min, max)
}

/// `(max(u − u_max, 0), max(u_min − u, 0))`.
pub fn on_status_bound_violations(
    on: &TimeMatrix<i64>,
    min: &TimeMatrix<i64>,
    max: &TimeMatrix<i64>,
) -> (TimeMatrix<i64>, TimeMatrix<i64>) {
    let over = on.zip_map(max, |u, hi| (u - hi).max(0));
    let under = min.zip_map(on, |lo, u| (lo - u).max(0));
    (over, under)
}

/// Startup and shutdown indicators, with `on_0` standing in for interval −1.
pub fn startup_shutdown(on: &TimeMatrix<i64>, on_0: &[i64]) -> (TimeMatrix<i64>, TimeMatrix<i64>) {
    let delta = on.map_indexed(|i, t, u| {
        let prev = if t == 0 { on_0[i] } else { on.get(i, t - 1) };
        u - prev
    });
    (delta.map(|d| d.max(0)), delta.map(|d| (-d).max(0)))
}

/// Uptime and downtime accumulated at the start of each interval.
pub fn up_down_time_at_start(
    on: &TimeMatrix<i64>,
    up_0: &[f64],
    down_0: &[f64],
    durations: &[f64],
) -> (TimeMatrix<f64>, TimeMatrix<f64>) {
    let (rows, cols) = on.shape();
    let mut up_start = TimeMatrix::zeros(rows, cols);
    let mut down_start = TimeMatrix::zeros(rows, cols);
    for i in 0..rows {
        let mut up = up_0[i];
        let mut down = down_0[i];
        for (t, &d) in durations.iter().enumerate().take(cols) {
            up_start.set(i, t, up);
            down_start.set(i, t, down);
            if on.get(i, t) == 1 {
                up += d;
                down = 0.0;
            } else {
                down += d;
                up = 0.0;
            }
        }
    }
    (up_start, down_start)
}

/// A transition at `t` is disallowed when the elapsed time is short of the
/// minimum by more than `tol`.
fn min_time_violations(
    elapsed: &TimeMatrix<f64>,
    transitions: &TimeMatrix<i64>,
    min_time: &[f64],
    tol: f64,
) -> TimeMatrix<i64> {
    elapsed.map_indexed(|i, t, e| {
        if min_time[i] - e - tol > 0.0 {
            transitions.get(i, t).min(1)
        } else {
            0
        }
    })
}

/// 1 where a shutdown happens before the minimum uptime has elapsed.
pub fn min_up_time_violations(
    up_start: &TimeMatrix<f64>,
    sd: &TimeMatrix<i64>,
    min_up: &[f64],
    tol: f64,
) -> TimeMatrix<i64> {
    min_time_violations(up_start, sd, min_up, tol)
}

/// 1 where a startup happens before the minimum downtime has elapsed.
pub fn min_down_time_violations(
    down_start: &TimeMatrix<f64>,
    su: &TimeMatrix<i64>,
    min_down: &[f64],
    tol: f64,
) -> TimeMatrix<i64> {
    min_time_violations(down_start, su, min_down, tol)
}

/// Worst excess of startups over any device's window limit.
///
/// A startup at `t` counts toward a window when the start time of `t` lies in
/// `[start − tol, end − tol)`. Only a strictly larger excess replaces the
/// current record, so the first (device, window) wins ties. The record is
/// located by `(device uid, window index)` and has no linear index. `None`
/// when no device defines a window.
pub fn max_startup_violation(
    devices: &[Device],
    su: &TimeMatrix<i64>,
    start_times: &[f64],
    tol: f64,
) -> Option<Extremum> {
    let mut worst: Option<(i64, usize, usize)> = None;
    for (i, device) in devices.iter().enumerate() {
        for (j, window) in device.startup_windows.iter().enumerate() {
            let startups: i64 = start_times
                .iter()
                .enumerate()
                .filter(|&(_, &a)| window.start - tol <= a && a < window.end - tol)
                .map(|(t, _)| su.get(i, t))
                .sum();
            let excess = (startups - window.max_startups).max(0);
            match worst {
                Some((best, _, _)) if excess <= best => {}
                _ => worst = Some((excess, i, j)),
            }
        }
    }
    worst.map(|(excess, i, j)| {
        Extremum::at(
            excess as f64,
            vec![Label::Uid(devices[i].uid.clone()), Label::Index(j)],
            vec![i, j],
        )
    })
}

/// Downtime-dependent startup cost adjustment, charged where `su = 1`.
///
/// A state qualifies when the downtime at the start of the interval is at most
/// its `max_downtime` (plus `tol`). The cheapest qualifying cost applies;
/// choosing no state (adjustment 0) is always allowed.
pub fn startup_state_costs(
    devices: &[Device],
    su: &TimeMatrix<i64>,
    down_start: &TimeMatrix<f64>,
    tol: f64,
) -> TimeMatrix<f64> {
    down_start.map_indexed(|i, t, down| {
        let adjustment = devices[i]
            .startup_states
            .iter()
            .filter(|state| down <= state.max_downtime + tol)
            .map(|state| state.cost)
            .fold(0.0, f64::min);
        su.get(i, t) as f64 * adjustment
    })
}

/// Commitment cost components, each `(num_sd, num_t)`.
#[derive(Debug, Clone)]
pub struct CommitmentCosts {
    /// `c_on · u · d`
    pub on: TimeMatrix<f64>,
    /// `c_su · su`
    pub su: TimeMatrix<f64>,
    /// `c_sd · sd`
    pub sd: TimeMatrix<f64>,
    /// `on + su + sd`
    pub total: TimeMatrix<f64>,
}

pub fn commitment_costs(
    devices: &[Device],
    on: &TimeMatrix<i64>,
    su: &TimeMatrix<i64>,
    sd: &TimeMatrix<i64>,
    durations: &[f64],
) -> CommitmentCosts {
    let on_cost = on.map_indexed(|i, t, u| devices[i].on_cost * u as f64 * durations[t]);
    let su_cost = su.map_indexed(|i, _, s| devices[i].startup_cost * s as f64);
    let sd_cost = sd.map_indexed(|i, _, s| devices[i].shutdown_cost * s as f64);
    let total = on_cost
        .zip_map(&su_cost, |a, b| a + b)
        .zip_map(&sd_cost, |a, b| a + b);
    CommitmentCosts {
        on: on_cost,
        su: su_cost,
        sd: sd_cost,
        total,
    }
}

/// Everything derived from the device commitment stage.
#[derive(Debug, Clone)]
pub struct CommitmentReport {
    pub startup: TimeMatrix<i64>,
    pub shutdown: TimeMatrix<i64>,
    pub up_time_at_start: TimeMatrix<f64>,
    pub down_time_at_start: TimeMatrix<f64>,
    pub viol_on_max: Option<Extremum>,
    pub viol_on_min: Option<Extremum>,
    pub viol_up_min: Option<Extremum>,
    pub viol_down_min: Option<Extremum>,
    pub viol_max_startup: Option<Extremum>,
    pub costs: CommitmentCosts,
    pub startup_state_cost: TimeMatrix<f64>,
}

impl CommitmentReport {
    pub fn num_startups(&self) -> i64 {
        self.startup.sum()
    }

    pub fn num_shutdowns(&self) -> i64 {
        self.shutdown.sum()
    }
}

/// Run the commitment stage in dependency order: bounds, indicators,
/// up/down counters, minimum time rules, costs, startup windows, startup states.
pub fn evaluate_commitment(problem: &Problem, on: &TimeMatrix<i64>, tol: f64) -> CommitmentReport {
    let devices = &problem.devices;
    let num_t = problem.num_t();
    let rows = Label::uids(devices.iter().map(|d| d.uid.as_str()));
    let cols = Label::indices(num_t);
    let locate = |m: &TimeMatrix<i64>| max_with_location(&m.to_f64(), &rows, &cols);

    let (min, max) = on_status_limits(devices, num_t);
    let (over, under) = on_status_bound_violations(on, &min, &max);

    let on_0: Vec<i64> = devices.iter().map(|d| d.on_status_0).collect();
    let up_0: Vec<f64> = devices.iter().map(|d| d.up_time_0).collect();
    let down_0: Vec<f64> = devices.iter().map(|d| d.down_time_0).collect();
    let (up_start, down_start) = up_down_time_at_start(on, &up_0, &down_0, problem.durations());
    let (su, sd) = startup_shutdown(on, &on_0);

    let min_up: Vec<f64> = devices.iter().map(|d| d.min_up_time).collect();
    let min_down: Vec<f64> = devices.iter().map(|d| d.min_down_time).collect();
    let up_viol = min_up_time_violations(&up_start, &sd, &min_up, tol);
    let down_viol = min_down_time_violations(&down_start, &su, &min_down, tol);

    let costs = commitment_costs(devices, on, &su, &sd, problem.durations());
    let viol_max_startup =
        max_startup_violation(devices, &su, &problem.intervals.start_times(), tol);
    let startup_state_cost = startup_state_costs(devices, &su, &down_start, tol);

    let report = CommitmentReport {
        viol_on_max: locate(&over),
        viol_on_min: locate(&under),
        viol_up_min: locate(&up_viol),
        viol_down_min: locate(&down_viol),
        viol_max_startup,
        startup: su,
        shutdown: sd,
        up_time_at_start: up_start,
        down_time_at_start: down_start,
        costs,
        startup_state_cost,
    };
    debug!(
        num_sd = devices.len(),
        startups = report.num_startups(),
        shutdowns = report.num_shutdowns(),
        on_cost = report.costs.on.sum(),
        "device commitment evaluated"
    );
    report
}
