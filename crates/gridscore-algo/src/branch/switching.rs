//! Branch switching: energize/de-energize events, their costs, and whether
//! they are allowed at all.

use gridscore_core::{AcBranch, TimeMatrix};

use crate::device::startup_shutdown;
use crate::numeric::{max_with_location, Extremum, Label};

#[derive(Debug, Clone)]
pub struct SwitchingReport {
    /// Energize indicators
    pub su: TimeMatrix<i64>,
    /// De-energize indicators
    pub sd: TimeMatrix<i64>,
    pub viol_su: Option<Extremum>,
    pub viol_sd: Option<Extremum>,
    /// `c_su · su` summed over branches, per interval
    pub su_cost_by_interval: Vec<f64>,
    /// `c_sd · sd` summed over branches, per interval
    pub sd_cost_by_interval: Vec<f64>,
}

impl SwitchingReport {
    pub fn num_su(&self) -> i64 {
        self.su.sum()
    }

    pub fn num_sd(&self) -> i64 {
        self.sd.sum()
    }

    pub fn su_cost(&self) -> f64 {
        self.su_cost_by_interval.iter().sum()
    }

    pub fn sd_cost(&self) -> f64 {
        self.sd_cost_by_interval.iter().sum()
    }
}

/// Evaluate switching of one branch table.
///
/// When switching in a direction is allowed its violation is the all-zero
/// matrix; otherwise every event in that direction is a violation.
pub fn evaluate_switching<'a>(
    branches: impl Iterator<Item = &'a AcBranch> + Clone,
    on: &TimeMatrix<i64>,
    up_allowed: bool,
    down_allowed: bool,
) -> SwitchingReport {
    let on_0: Vec<i64> = branches.clone().map(|b| b.on_status_0).collect();
    let su_price: Vec<f64> = branches.clone().map(|b| b.startup_cost).collect();
    let sd_price: Vec<f64> = branches.clone().map(|b| b.shutdown_cost).collect();
    let rows = Label::uids(branches.map(|b| b.uid.as_str()));
    let cols = Label::indices(on.cols());

    let (su, sd) = startup_shutdown(on, &on_0);
    let (num_rows, num_t) = on.shape();
    let zeros = TimeMatrix::<f64>::zeros(num_rows, num_t);
    let locate = |allowed: bool, events: &TimeMatrix<i64>| {
        if allowed {
            max_with_location(&zeros, &rows, &cols)
        } else {
            max_with_location(&events.to_f64(), &rows, &cols)
        }
    };

    SwitchingReport {
        viol_su: locate(up_allowed, &su),
        viol_sd: locate(down_allowed, &sd),
        su_cost_by_interval: su.to_f64().scale_rows(&su_price).column_sums(),
        sd_cost_by_interval: sd.to_f64().scale_rows(&sd_price).column_sums(),
        su,
        sd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscore_core::BusId;

    fn branch(on_0: i64) -> AcBranch {
        AcBranch {
            uid: format!("l_{on_0}"),
            fr_bus: BusId::new(0),
            to_bus: BusId::new(1),
            r: 0.0,
            x: 0.1,
            b_ch: 0.0,
            g_fr: 0.0,
            b_fr: 0.0,
            g_to: 0.0,
            b_to: 0.0,
            s_max: 1.0,
            startup_cost: 4.0,
            shutdown_cost: 1.5,
            on_status_0: on_0,
        }
    }

    #[test]
    fn allowed_switching_is_priced_not_violated() {
        let lines = [branch(1), branch(0)];
        let on = TimeMatrix::from_rows(vec![vec![0, 1], vec![1, 1]]).unwrap();
        let report = evaluate_switching(lines.iter(), &on, true, true);
        assert_eq!(report.num_su(), 2);
        assert_eq!(report.num_sd(), 1);
        assert_eq!(report.viol_su.as_ref().unwrap().val, 0.0);
        assert_eq!(report.viol_su.as_ref().unwrap().idx_int, vec![0, 0]);
        assert_eq!(report.su_cost_by_interval, vec![4.0, 4.0]);
        assert_eq!(report.sd_cost_by_interval, vec![1.5, 0.0]);
    }

    #[test]
    fn forbidden_switching_is_a_violation() {
        let lines = [branch(1), branch(0)];
        let on = TimeMatrix::from_rows(vec![vec![0, 1], vec![1, 1]]).unwrap();
        let report = evaluate_switching(lines.iter(), &on, false, false);
        let su = report.viol_su.unwrap();
        assert_eq!(su.val, 1.0);
        // first startup in row-major order: line 0 at t=1 precedes line 1 at t=0
        assert_eq!(su.idx_int, vec![0, 1]);
        assert_eq!(report.viol_sd.unwrap().idx_int, vec![0, 0]);
    }
}
