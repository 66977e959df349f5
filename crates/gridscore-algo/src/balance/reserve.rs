//! Zonal reserve requirements.
//!
//! Requirements are either fixed per interval (ramping and reactive
//! products) or endogenous: regulation scales with zonal consumption and
//! the contingency products scale with the largest single producer in the
//! zone. Regulation up, synchronized and non-synchronized contingency
//! reserve share one running requirement evaluated in that order: surplus
//! provision of an earlier product counts toward a later one, but never the
//! other way around.

use gridscore_core::{
    ActiveReserveZone, DeviceId, DeviceSolution, GridResult, Problem, TimeMatrix,
};

use crate::numeric::{self, max_with_location, Extremum, Incidence, Label};

/// Device membership of the active and reactive reserve zones.
#[derive(Debug, Clone)]
pub struct ZoneIncidence {
    pub active: Incidence,
    pub reactive: Incidence,
}

impl ZoneIncidence {
    pub fn new(problem: &Problem) -> Self {
        let num_sd = problem.devices.len();
        let members = |devices: &[DeviceId]| {
            devices.iter().map(|d| d.value()).collect::<Vec<_>>()
        };
        let active: Vec<Vec<usize>> = problem
            .active_zones
            .iter()
            .map(|z| members(&z.devices))
            .collect();
        let reactive: Vec<Vec<usize>> = problem
            .reactive_zones
            .iter()
            .map(|z| members(&z.devices))
            .collect();
        Self {
            active: Incidence::from_members(num_sd, &active),
            reactive: Incidence::from_members(num_sd, &reactive),
        }
    }

    /// Uids of zones without members; their requirement can never be met.
    pub fn empty_zones<'a>(&self, problem: &'a Problem) -> Vec<&'a str> {
        let active = problem
            .active_zones
            .iter()
            .enumerate()
            .filter(|(z, _)| self.active.group_size(*z) == 0)
            .map(|(_, zone)| zone.uid.as_str());
        let reactive = problem
            .reactive_zones
            .iter()
            .enumerate()
            .filter(|(z, _)| self.reactive.group_size(*z) == 0)
            .map(|(_, zone)| zone.uid.as_str());
        active.chain(reactive).collect()
    }
}

/// Shortfall of one reserve product across its zones.
#[derive(Debug, Clone)]
pub struct ReserveShortfall {
    /// `max(requirement − provision, 0)`, zones × intervals
    pub shortfall: TimeMatrix<f64>,
    pub viol: Option<Extremum>,
    /// `c_z · d_t · shortfall` summed over zones, per interval
    pub cost_by_interval: Vec<f64>,
}

impl ReserveShortfall {
    fn new(
        shortfall: TimeMatrix<f64>,
        zone_costs: &[f64],
        rows: &[Label],
        durations: &[f64],
    ) -> Self {
        let cols = Label::indices(durations.len());
        Self {
            viol: max_with_location(&shortfall, rows, &cols),
            cost_by_interval: shortfall
                .scale_rows(zone_costs)
                .scale_columns(durations)
                .column_sums(),
            shortfall,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.cost_by_interval.iter().sum()
    }
}

/// Per-product reserve shortfalls.
#[derive(Debug, Clone)]
pub struct ReserveBalance {
    pub rgu: ReserveShortfall,
    pub rgd: ReserveShortfall,
    pub scr: ReserveShortfall,
    pub nsc: ReserveShortfall,
    pub rru: ReserveShortfall,
    pub rrd: ReserveShortfall,
    pub qru: ReserveShortfall,
    pub qrd: ReserveShortfall,
}

impl ReserveBalance {
    /// Penalty of the six active products, per interval.
    pub fn active_cost_by_interval(&self) -> Vec<f64> {
        sum_by_interval(&[&self.rgu, &self.rgd, &self.scr, &self.nsc, &self.rru, &self.rrd])
    }

    /// Penalty of the two reactive products, per interval.
    pub fn reactive_cost_by_interval(&self) -> Vec<f64> {
        sum_by_interval(&[&self.qru, &self.qrd])
    }

    /// Penalty of all eight products, per interval.
    pub fn cost_by_interval(&self) -> Vec<f64> {
        self.active_cost_by_interval()
            .iter()
            .zip(self.reactive_cost_by_interval())
            .map(|(a, r)| a + r)
            .collect()
    }
}

fn sum_by_interval(products: &[&ReserveShortfall]) -> Vec<f64> {
    let num_t = products.first().map_or(0, |r| r.cost_by_interval.len());
    (0..num_t)
        .map(|t| products.iter().map(|r| r.cost_by_interval[t]).sum())
        .collect()
}

fn positive_part(x: &TimeMatrix<f64>) -> TimeMatrix<f64> {
    x.map(numeric::positive_part)
}

/// Evaluate every zonal reserve requirement against device provision.
///
/// `p` is the device real power used for the endogenous requirements.
pub fn evaluate_reserves(
    problem: &Problem,
    zones: &ZoneIncidence,
    p: &TimeMatrix<f64>,
    device: &DeviceSolution,
) -> GridResult<ReserveBalance> {
    let num_t = problem.num_t();
    let durations = problem.durations();
    let prz = &problem.active_zones;
    let qrz = &problem.reactive_zones;
    let num_prz = prz.len();
    let num_qrz = qrz.len();
    let prz_rows = Label::uids(prz.iter().map(|z| z.uid.as_str()));
    let qrz_rows = Label::uids(qrz.iter().map(|z| z.uid.as_str()));
    let prz_cost = |f: fn(&ActiveReserveZone) -> f64| {
        prz.iter().map(f).collect::<Vec<_>>()
    };

    let producer_p = p.map_indexed(|i, _, v| {
        if problem.devices[i].is_producer() {
            v
        } else {
            0.0
        }
    });
    let consumer_p = p.map_indexed(|i, _, v| {
        if problem.devices[i].is_consumer() {
            v
        } else {
            0.0
        }
    });

    let zone_sum = |x: &TimeMatrix<f64>| -> GridResult<TimeMatrix<f64>> {
        let mut out = TimeMatrix::zeros(num_prz, num_t);
        zones.active.aggregate_sum(x, &mut out)?;
        Ok(out)
    };
    let reactive_zone_sum = |x: &TimeMatrix<f64>| -> GridResult<TimeMatrix<f64>> {
        let mut out = TimeMatrix::zeros(num_qrz, num_t);
        zones.reactive.aggregate_sum(x, &mut out)?;
        Ok(out)
    };

    // regulation up seeds the running requirement shared with scr and nsc
    let zone_load = zone_sum(&consumer_p)?;
    let rgu_running = zone_load
        .map_indexed(|z, _, v| prz[z].sigma_rgu * v)
        .zip_map(&zone_sum(&device.p_rgu)?, |r, s| r - s);
    let rgd = zone_load
        .map_indexed(|z, _, v| prz[z].sigma_rgd * v)
        .zip_map(&zone_sum(&device.p_rgd)?, |r, s| r - s);

    let mut largest = TimeMatrix::zeros(num_prz, num_t);
    zones.active.aggregate_max(&producer_p, &mut largest)?;
    let scr_running = rgu_running
        .map_indexed(|z, t, acc| acc + prz[z].sigma_scr * largest.get(z, t))
        .zip_map(&zone_sum(&device.p_scr)?, |r, s| r - s);
    let nsc_running = scr_running
        .map_indexed(|z, t, acc| acc + prz[z].sigma_nsc * largest.get(z, t))
        .zip_map(&zone_sum(&device.p_nsc)?, |r, s| r - s);

    // ramping
    let rru_min = TimeMatrix::from_fn(num_prz, num_t, |z, t| prz[z].rru_min[t]);
    let rrd_min = TimeMatrix::from_fn(num_prz, num_t, |z, t| prz[z].rrd_min[t]);
    let rru_provided = zone_sum(&device.p_rru_on)?
        .zip_map(&zone_sum(&device.p_rru_off)?, |on, off| on + off);
    let rrd_provided = zone_sum(&device.p_rrd_on)?
        .zip_map(&zone_sum(&device.p_rrd_off)?, |on, off| on + off);
    let rru = rru_min.zip_map(&rru_provided, |r, s| r - s);
    let rrd = rrd_min.zip_map(&rrd_provided, |r, s| r - s);

    // reactive
    let qru_min = TimeMatrix::from_fn(num_qrz, num_t, |z, t| qrz[z].qru_min[t]);
    let qrd_min = TimeMatrix::from_fn(num_qrz, num_t, |z, t| qrz[z].qrd_min[t]);
    let qru = qru_min.zip_map(&reactive_zone_sum(&device.q_qru)?, |r, s| r - s);
    let qrd = qrd_min.zip_map(&reactive_zone_sum(&device.q_qrd)?, |r, s| r - s);

    let qrz_cost_qru: Vec<f64> = qrz.iter().map(|z| z.c_qru).collect();
    let qrz_cost_qrd: Vec<f64> = qrz.iter().map(|z| z.c_qrd).collect();

    Ok(ReserveBalance {
        rgu: ReserveShortfall::new(
            positive_part(&rgu_running),
            &prz_cost(|z| z.c_rgu),
            &prz_rows,
            durations,
        ),
        rgd: ReserveShortfall::new(
            positive_part(&rgd),
            &prz_cost(|z| z.c_rgd),
            &prz_rows,
            durations,
        ),
        scr: ReserveShortfall::new(
            positive_part(&scr_running),
            &prz_cost(|z| z.c_scr),
            &prz_rows,
            durations,
        ),
        nsc: ReserveShortfall::new(
            positive_part(&nsc_running),
            &prz_cost(|z| z.c_nsc),
            &prz_rows,
            durations,
        ),
        rru: ReserveShortfall::new(
            positive_part(&rru),
            &prz_cost(|z| z.c_rru),
            &prz_rows,
            durations,
        ),
        rrd: ReserveShortfall::new(
            positive_part(&rrd),
            &prz_cost(|z| z.c_rrd),
            &prz_rows,
            durations,
        ),
        qru: ReserveShortfall::new(positive_part(&qru), &qrz_cost_qru, &qrz_rows, durations),
        qrd: ReserveShortfall::new(positive_part(&qrd), &qrz_cost_qrd, &qrz_rows, durations),
    })
}
