//! Energy and reserve offer costs of the simple dispatchable devices.

use gridscore_core::{DeviceSolution, Problem, ReservePrices, TimeMatrix};
use serde::Serialize;

use crate::numeric::piecewise_convex_cost;

/// Reserve offer cost `c_x[t] · x · d_t` summed over devices, per interval.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReserveOfferCosts {
    pub rgu: Vec<f64>,
    pub rgd: Vec<f64>,
    pub scr: Vec<f64>,
    pub nsc: Vec<f64>,
    pub rru_on: Vec<f64>,
    pub rrd_on: Vec<f64>,
    pub rru_off: Vec<f64>,
    pub rrd_off: Vec<f64>,
    pub qru: Vec<f64>,
    pub qrd: Vec<f64>,
}

impl ReserveOfferCosts {
    fn products(&self) -> [&Vec<f64>; 10] {
        [
            &self.rgu,
            &self.rgd,
            &self.scr,
            &self.nsc,
            &self.rru_on,
            &self.rrd_on,
            &self.rru_off,
            &self.rrd_off,
            &self.qru,
            &self.qrd,
        ]
    }

    /// All ten products, per interval.
    pub fn by_interval(&self) -> Vec<f64> {
        let products = self.products();
        (0..self.rgu.len())
            .map(|t| products.iter().map(|c| c[t]).sum())
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.products().iter().map(|c| c.iter().sum::<f64>()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct OfferCosts {
    /// Duration-weighted energy cost per device and interval
    pub energy: TimeMatrix<f64>,
    /// Producer energy cost, per interval
    pub producer_cost: Vec<f64>,
    /// Consumer energy benefit (the negated consumer cost), per interval
    pub consumer_benefit: Vec<f64>,
    pub reserve: ReserveOfferCosts,
}

impl OfferCosts {
    pub fn total_producer_cost(&self) -> f64 {
        self.producer_cost.iter().sum()
    }

    pub fn total_consumer_benefit(&self) -> f64 {
        self.consumer_benefit.iter().sum()
    }
}

/// Price the device dispatch `p` and the reserve awards in `device`.
pub fn evaluate_offers(
    problem: &Problem,
    p: &TimeMatrix<f64>,
    device: &DeviceSolution,
) -> OfferCosts {
    let devices = &problem.devices;
    let durations = problem.durations();

    let energy = p.map_indexed(|i, t, p| {
        piecewise_convex_cost(&devices[i].energy_blocks[t], p) * durations[t]
    });
    let producer_cost = energy
        .map_indexed(|i, _, c| if devices[i].is_producer() { c } else { 0.0 })
        .column_sums();
    let consumer_benefit = energy
        .map_indexed(|i, _, c| if devices[i].is_consumer() { -c } else { 0.0 })
        .column_sums();

    let offer = |award: &TimeMatrix<f64>, price: fn(&ReservePrices) -> &Vec<f64>| {
        award
            .map_indexed(|i, t, x| price(&devices[i].reserve_prices)[t] * x)
            .scale_columns(durations)
            .column_sums()
    };
    let reserve = ReserveOfferCosts {
        rgu: offer(&device.p_rgu, |c| &c.rgu),
        rgd: offer(&device.p_rgd, |c| &c.rgd),
        scr: offer(&device.p_scr, |c| &c.scr),
        nsc: offer(&device.p_nsc, |c| &c.nsc),
        rru_on: offer(&device.p_rru_on, |c| &c.rru_on),
        rrd_on: offer(&device.p_rrd_on, |c| &c.rrd_on),
        rru_off: offer(&device.p_rru_off, |c| &c.rru_off),
        rrd_off: offer(&device.p_rrd_off, |c| &c.rrd_off),
        qru: offer(&device.q_qru, |c| &c.qru),
        qrd: offer(&device.q_qrd, |c| &c.qrd),
    };

    OfferCosts {
        energy,
        producer_cost,
        consumer_benefit,
        reserve,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscore_core::{BusId, CostBlock, Device, DeviceKind, Intervals};

    fn device(kind: DeviceKind, blocks: Vec<CostBlock>) -> Device {
        let mut prices = ReservePrices::zeros(2);
        prices.rgu = vec![1.0, 2.0];
        prices.qrd = vec![0.5, 0.5];
        Device {
            uid: "sd".into(),
            bus: BusId::new(0),
            kind,
            on_status_0: 1,
            up_time_0: 0.0,
            down_time_0: 0.0,
            min_up_time: 0.0,
            min_down_time: 0.0,
            on_cost: 0.0,
            startup_cost: 0.0,
            shutdown_cost: 0.0,
            on_status_min: vec![0, 0],
            on_status_max: vec![1, 1],
            startup_states: vec![],
            startup_windows: vec![],
            energy_blocks: vec![blocks.clone(), blocks],
            reserve_prices: prices,
        }
    }

    fn problem() -> Problem {
        Problem {
            intervals: Intervals {
                durations: vec![1.0, 0.5],
            },
            devices: vec![
                device(
                    DeviceKind::Producer,
                    vec![
                        CostBlock { p_max: 5.0, cost: 2.0 },
                        CostBlock { p_max: 5.0, cost: 4.0 },
                    ],
                ),
                device(DeviceKind::Consumer, vec![CostBlock { p_max: 10.0, cost: -5.0 }]),
            ],
            ..Problem::default()
        }
    }

    #[test]
    fn energy_is_split_into_cost_and_benefit() {
        let p = TimeMatrix::from_rows(vec![vec![8.0, 8.0], vec![8.0, 8.0]]).unwrap();
        let costs = evaluate_offers(&problem(), &p, &DeviceSolution::zeros(2, 2));
        // 5 * 2 + 3 * 4 = 22
        assert_eq!(costs.producer_cost, vec![22.0, 11.0]);
        assert_eq!(costs.consumer_benefit, vec![40.0, 20.0]);
        assert_eq!(costs.total_producer_cost(), 33.0);
        assert_eq!(costs.total_consumer_benefit(), 60.0);
        assert_eq!(costs.reserve.total(), 0.0);
    }

    #[test]
    fn reserve_offers_are_duration_weighted() {
        let p = TimeMatrix::zeros(2, 2);
        let mut device = DeviceSolution::zeros(2, 2);
        device.p_rgu = TimeMatrix::from_rows(vec![vec![1.0, 1.0], vec![0.0, 2.0]]).unwrap();
        device.q_qrd = TimeMatrix::from_rows(vec![vec![0.0, 0.0], vec![4.0, 0.0]]).unwrap();
        let costs = evaluate_offers(&problem(), &p, &device);
        assert_eq!(costs.reserve.rgu, vec![1.0, 3.0]);
        assert_eq!(costs.reserve.qrd, vec![2.0, 0.0]);
        assert_eq!(costs.reserve.by_interval(), vec![3.0, 3.0]);
        assert_eq!(costs.reserve.total(), 6.0);
    }
}
