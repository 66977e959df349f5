//! Bus real and reactive power balance.
//!
//! The signed injection at each bus is assembled from sparse bus-to-entity
//! incidence matrices built once per problem:
//!
//! | Matrix | Coefficient |
//! |--------|-------------|
//! | bus × device | +1 producer, −1 consumer |
//! | bus × shunt | −1 |
//! | bus × branch (from and to terminal, lines, transformers and DC lines) | −1 |
//!
//! The shortfall is the negated net injection: positive means the bus is
//! short of power, negative means a surplus.

use gridscore_core::{GridResult, Problem, TimeMatrix};

use crate::branch::BranchFlows;
use crate::numeric::{max_with_location, min_with_location, Extremum, Incidence, Label};

#[derive(Debug, Clone)]
pub struct BusInjections {
    device: Incidence,
    shunt: Incidence,
    acl_fr: Incidence,
    acl_to: Incidence,
    xfr_fr: Incidence,
    xfr_to: Incidence,
    dcl_fr: Incidence,
    dcl_to: Incidence,
}

impl BusInjections {
    pub fn new(problem: &Problem) -> Self {
        let num_bus = problem.buses.len();
        let leaving = |buses: Vec<usize>| {
            let coefficients = vec![-1.0; buses.len()];
            Incidence::from_assignment(num_bus, &buses, &coefficients)
        };

        let device_bus: Vec<usize> = problem.devices.iter().map(|d| d.bus.value()).collect();
        let device_sign: Vec<f64> = problem
            .devices
            .iter()
            .map(|d| d.kind.injection_sign())
            .collect();

        Self {
            device: Incidence::from_assignment(num_bus, &device_bus, &device_sign),
            shunt: leaving(problem.shunts.iter().map(|s| s.bus.value()).collect()),
            acl_fr: leaving(problem.ac_lines.iter().map(|l| l.fr_bus.value()).collect()),
            acl_to: leaving(problem.ac_lines.iter().map(|l| l.to_bus.value()).collect()),
            xfr_fr: leaving(
                problem
                    .transformers
                    .iter()
                    .map(|x| x.branch.fr_bus.value())
                    .collect(),
            ),
            xfr_to: leaving(
                problem
                    .transformers
                    .iter()
                    .map(|x| x.branch.to_bus.value())
                    .collect(),
            ),
            dcl_fr: leaving(problem.dc_lines.iter().map(|l| l.fr_bus.value()).collect()),
            dcl_to: leaving(problem.dc_lines.iter().map(|l| l.to_bus.value()).collect()),
        }
    }

    pub fn num_buses(&self) -> usize {
        self.device.num_groups()
    }

    /// Real power shortfall. The DC line carries `p` out of its from bus and
    /// into its to bus.
    pub fn real_shortfall(
        &self,
        device_p: &TimeMatrix<f64>,
        shunt_p: &TimeMatrix<f64>,
        acl: &BranchFlows,
        xfr: &BranchFlows,
        dcl_p: &TimeMatrix<f64>,
    ) -> GridResult<TimeMatrix<f64>> {
        let mut net = TimeMatrix::zeros(self.num_buses(), device_p.cols());
        self.device.aggregate_sum(device_p, &mut net)?;
        self.shunt.aggregate_sum(shunt_p, &mut net)?;
        self.acl_fr.aggregate_sum(&acl.p_fr, &mut net)?;
        self.acl_to.aggregate_sum(&acl.p_to, &mut net)?;
        self.dcl_fr.aggregate_sum(dcl_p, &mut net)?;
        self.dcl_to.aggregate_sum(&dcl_p.map(|p| -p), &mut net)?;
        self.xfr_fr.aggregate_sum(&xfr.p_fr, &mut net)?;
        self.xfr_to.aggregate_sum(&xfr.p_to, &mut net)?;
        Ok(net.map(|v| -v))
    }

    /// Reactive power shortfall. Each DC line terminal has its own `q`.
    #[allow(clippy::too_many_arguments)]
    pub fn reactive_shortfall(
        &self,
        device_q: &TimeMatrix<f64>,
        shunt_q: &TimeMatrix<f64>,
        acl: &BranchFlows,
        xfr: &BranchFlows,
        dcl_q_fr: &TimeMatrix<f64>,
        dcl_q_to: &TimeMatrix<f64>,
    ) -> GridResult<TimeMatrix<f64>> {
        let mut net = TimeMatrix::zeros(self.num_buses(), device_q.cols());
        self.device.aggregate_sum(device_q, &mut net)?;
        self.shunt.aggregate_sum(shunt_q, &mut net)?;
        self.acl_fr.aggregate_sum(&acl.q_fr, &mut net)?;
        self.acl_to.aggregate_sum(&acl.q_to, &mut net)?;
        self.dcl_fr.aggregate_sum(dcl_q_fr, &mut net)?;
        self.dcl_to.aggregate_sum(dcl_q_to, &mut net)?;
        self.xfr_fr.aggregate_sum(&xfr.q_fr, &mut net)?;
        self.xfr_to.aggregate_sum(&xfr.q_to, &mut net)?;
        Ok(net.map(|v| -v))
    }
}

/// Located extremes of a bus shortfall and its absolute-value penalty.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    pub shortfall: TimeMatrix<f64>,
    pub viol_max: Option<Extremum>,
    pub viol_min: Option<Extremum>,
    /// `c · Σ_i d_t · |shortfall[i, t]|` per interval
    pub cost_by_interval: Vec<f64>,
}

impl BalanceReport {
    pub fn new(
        shortfall: TimeMatrix<f64>,
        bus_uids: &[Label],
        durations: &[f64],
        unit_cost: f64,
    ) -> Self {
        let cols = Label::indices(durations.len());
        let cost_by_interval = shortfall
            .map(f64::abs)
            .scale_columns(durations)
            .column_sums()
            .into_iter()
            .map(|s| unit_cost * s)
            .collect();
        Self {
            viol_max: max_with_location(&shortfall, bus_uids, &cols),
            viol_min: min_with_location(&shortfall, bus_uids, &cols),
            cost_by_interval,
            shortfall,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.cost_by_interval.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscore_core::{
        Bus, BusId, CostBlock, DcLine, Device, DeviceKind, Intervals, ReservePrices, Shunt,
    };

    fn device(bus: usize, kind: DeviceKind) -> Device {
        Device {
            uid: format!("sd_{bus}"),
            bus: BusId::new(bus),
            kind,
            on_status_0: 1,
            up_time_0: 0.0,
            down_time_0: 0.0,
            min_up_time: 0.0,
            min_down_time: 0.0,
            on_cost: 0.0,
            startup_cost: 0.0,
            shutdown_cost: 0.0,
            on_status_min: vec![0],
            on_status_max: vec![1],
            startup_states: vec![],
            startup_windows: vec![],
            energy_blocks: vec![vec![CostBlock { p_max: 1.0, cost: 0.0 }]],
            reserve_prices: ReservePrices::zeros(1),
        }
    }

    fn problem() -> Problem {
        Problem {
            intervals: Intervals {
                durations: vec![1.0],
            },
            buses: (0..2)
                .map(|i| Bus {
                    uid: format!("b{i}"),
                    v_min: 0.9,
                    v_max: 1.1,
                })
                .collect(),
            devices: vec![
                device(0, DeviceKind::Producer),
                device(1, DeviceKind::Consumer),
            ],
            shunts: vec![Shunt {
                uid: "sh".into(),
                bus: BusId::new(1),
                g_st: 0.0,
                b_st: 0.0,
                u_st_min: 0,
                u_st_max: 1,
            }],
            dc_lines: vec![DcLine {
                uid: "dc".into(),
                fr_bus: BusId::new(0),
                to_bus: BusId::new(1),
                p_max: 10.0,
                q_fr_min: -1.0,
                q_fr_max: 1.0,
                q_to_min: -1.0,
                q_to_max: 1.0,
            }],
            ..Problem::default()
        }
    }

    fn no_flows() -> BranchFlows {
        BranchFlows {
            p_fr: TimeMatrix::zeros(0, 1),
            q_fr: TimeMatrix::zeros(0, 1),
            p_to: TimeMatrix::zeros(0, 1),
            q_to: TimeMatrix::zeros(0, 1),
        }
    }

    #[test]
    fn dc_line_moves_power_between_buses() {
        let inj = BusInjections::new(&problem());
        let device_p = TimeMatrix::from_rows(vec![vec![5.0], vec![3.0]]).unwrap();
        let shunt_p = TimeMatrix::from_rows(vec![vec![0.5]]).unwrap();
        let dcl_p = TimeMatrix::from_rows(vec![vec![4.0]]).unwrap();
        let short = inj
            .real_shortfall(&device_p, &shunt_p, &no_flows(), &no_flows(), &dcl_p)
            .unwrap();
        // bus 0: 5 produced, 4 exported -> surplus 1
        assert!((short.get(0, 0) + 1.0).abs() < 1e-12);
        // bus 1: 4 imported, 3 consumed, 0.5 shunt -> surplus 0.5
        assert!((short.get(1, 0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn balance_penalty_uses_absolute_shortfall() {
        let short = TimeMatrix::from_rows(vec![vec![-1.0, 2.0], vec![0.5, 0.0]]).unwrap();
        let report = BalanceReport::new(short, &Label::uids(["b0", "b1"]), &[1.0, 0.5], 100.0);
        assert_eq!(report.cost_by_interval, vec![150.0, 100.0]);
        assert_eq!(report.viol_max.as_ref().unwrap().val, 2.0);
        assert_eq!(report.viol_min.as_ref().unwrap().val, -1.0);
        assert!((report.total_cost() - 250.0).abs() < 1e-12);
    }
}
