//! Net market surplus and feasibility.
//!
//! Every term is a per-interval sum. Costs enter the base-case surplus with a
//! minus sign and the consumer energy benefit with a plus sign:
//!
//! ```text
//! z_base[t] = cs[t] − (on + su + sd + sus + acl su/sd/s + xfr su/sd/s
//!                      + bus p/q + pr + reserve offers + zonal shortfalls)[t]
//! z[t]      = z_base[t] + z_k_worst_case[t] + z_k_average_case[t]
//! ```
//!
//! The contingency surplus matrix is all zeros: post-contingency AC power
//! flow is not modeled, only the connectivity screen.

use gridscore_core::TimeMatrix;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::numeric::{min_of_series, Extremum, Label};

/// Per-interval cost and benefit terms of the base case.
#[derive(Debug, Clone, Default)]
pub struct SurplusTerms {
    pub on: Vec<f64>,
    pub su: Vec<f64>,
    pub sd: Vec<f64>,
    pub sus: Vec<f64>,
    pub acl_su: Vec<f64>,
    pub acl_sd: Vec<f64>,
    pub acl_s: Vec<f64>,
    pub xfr_su: Vec<f64>,
    pub xfr_sd: Vec<f64>,
    pub xfr_s: Vec<f64>,
    pub bus_p: Vec<f64>,
    pub bus_q: Vec<f64>,
    /// Producer energy cost
    pub pr: Vec<f64>,
    /// Consumer energy benefit
    pub cs: Vec<f64>,
    /// The ten device reserve offer products
    pub reserve_offers: Vec<f64>,
    /// The six active zonal reserve shortfall products
    pub prz: Vec<f64>,
    /// The two reactive zonal reserve shortfall products
    pub qrz: Vec<f64>,
}

impl SurplusTerms {
    fn costs(&self) -> [&Vec<f64>; 16] {
        [
            &self.on,
            &self.su,
            &self.sd,
            &self.sus,
            &self.acl_su,
            &self.acl_sd,
            &self.acl_s,
            &self.xfr_su,
            &self.xfr_sd,
            &self.xfr_s,
            &self.bus_p,
            &self.bus_q,
            &self.pr,
            &self.reserve_offers,
            &self.prz,
            &self.qrz,
        ]
    }

    /// Base-case net surplus per interval.
    pub fn base_by_interval(&self) -> Vec<f64> {
        let costs = self.costs();
        self.cs
            .iter()
            .enumerate()
            .map(|(t, benefit)| benefit - costs.iter().map(|c| c[t]).sum::<f64>())
            .collect()
    }
}

/// Post-contingency surplus, intervals × contingencies.
#[derive(Debug, Clone)]
pub struct ContingencySurplus {
    pub by_ctg: TimeMatrix<f64>,
    pub worst_case: Vec<f64>,
    pub average_case: Vec<f64>,
    /// Worst contingency of each interval, `None` without contingencies
    pub worst_location: Vec<Option<Extremum>>,
}

impl ContingencySurplus {
    pub fn new(by_ctg: TimeMatrix<f64>, ctg_uids: &[Label]) -> Self {
        let (num_t, num_k) = by_ctg.shape();
        let worst_location: Vec<Option<Extremum>> = (0..num_t)
            .map(|t| min_of_series(by_ctg.row(t), ctg_uids))
            .collect();
        let worst_case = worst_location
            .iter()
            .map(|w| w.as_ref().map_or(0.0, |e| e.val))
            .collect();
        let average_case = (0..num_t)
            .map(|t| {
                if num_k == 0 {
                    0.0
                } else {
                    by_ctg.row(t).iter().sum::<f64>() / num_k as f64
                }
            })
            .collect();
        Self {
            by_ctg,
            worst_case,
            average_case,
            worst_location,
        }
    }

    /// No post-contingency physics: every entry is zero.
    pub fn zeros(num_t: usize, ctg_uids: &[Label]) -> Self {
        Self::new(TimeMatrix::zeros(num_t, ctg_uids.len()), ctg_uids)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct ObjectiveTotals {
    pub z: f64,
    pub z_base: f64,
    pub z_k_worst_case: f64,
    pub z_k_average_case: f64,
}

#[derive(Debug, Clone)]
pub struct Objective {
    pub base: Vec<f64>,
    pub worst_case: Vec<f64>,
    pub average_case: Vec<f64>,
    pub by_interval: Vec<f64>,
    pub totals: ObjectiveTotals,
}

pub fn aggregate_objective(terms: &SurplusTerms, ctg: &ContingencySurplus) -> Objective {
    let base = terms.base_by_interval();
    let by_interval: Vec<f64> = base
        .iter()
        .zip(&ctg.worst_case)
        .zip(&ctg.average_case)
        .map(|((b, w), a)| b + w + a)
        .collect();
    let totals = ObjectiveTotals {
        z: by_interval.iter().sum(),
        z_base: base.iter().sum(),
        z_k_worst_case: ctg.worst_case.iter().sum(),
        z_k_average_case: ctg.average_case.iter().sum(),
    };
    Objective {
        base,
        worst_case: ctg.worst_case.clone(),
        average_case: ctg.average_case.clone(),
        by_interval,
        totals,
    }
}

/// Summary keys whose positive value makes a solution infeasible.
///
/// Projected bounds (voltage, DC line, transformer controls) and penalized
/// quantities (balance, overload, reserves) only affect the objective.
pub const HARD_VIOLATION_KEYS: [&str; 13] = [
    "viol_sd_t_u_on_max",
    "viol_sd_t_u_on_min",
    "viol_sd_t_d_up_min",
    "viol_sd_t_d_dn_min",
    "viol_sd_max_startup_constr",
    "viol_sh_t_u_st_max",
    "viol_sh_t_u_st_min",
    "viol_acl_t_u_su_max",
    "viol_acl_t_u_sd_max",
    "viol_xfr_t_u_su_max",
    "viol_xfr_t_u_sd_max",
    "viol_t_connected_base",
    "viol_t_connected_ctg",
];

/// The hard violations that are present and strictly positive, in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfeasibilitySummary {
    entries: Vec<(&'static str, Extremum)>,
}

impl InfeasibilitySummary {
    pub fn from_violations<'a>(
        violations: impl IntoIterator<Item = (&'static str, Option<&'a Extremum>)>,
    ) -> Self {
        let entries = violations
            .into_iter()
            .filter_map(|(key, viol)| match viol {
                Some(e) if e.is_violation() => Some((key, e.clone())),
                _ => None,
            })
            .collect();
        Self { entries }
    }

    pub fn is_infeasible(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Extremum> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, e)| e)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Extremum)> {
        self.entries.iter().map(|(k, e)| (*k, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for InfeasibilitySummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, viol) in &self.entries {
            map.serialize_entry(key, viol)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(v: f64, n: usize) -> Vec<f64> {
        vec![v; n]
    }

    fn terms(n: usize) -> SurplusTerms {
        let zero = flat(0.0, n);
        SurplusTerms {
            on: zero.clone(),
            su: zero.clone(),
            sd: zero.clone(),
            sus: zero.clone(),
            acl_su: zero.clone(),
            acl_sd: zero.clone(),
            acl_s: zero.clone(),
            xfr_su: zero.clone(),
            xfr_sd: zero.clone(),
            xfr_s: zero.clone(),
            bus_p: zero.clone(),
            bus_q: zero.clone(),
            pr: zero.clone(),
            cs: zero.clone(),
            reserve_offers: zero.clone(),
            prz: zero.clone(),
            qrz: zero,
        }
    }

    #[test]
    fn base_surplus_is_benefit_less_costs() {
        let mut t = terms(2);
        t.cs = vec![50.0, 50.0];
        t.pr = vec![20.0, 10.0];
        t.bus_p = vec![1.0, 0.0];
        t.sus = vec![-2.0, 0.0];
        t.qrz = vec![0.0, 4.0];
        let base = t.base_by_interval();
        assert!((base[0] - 31.0).abs() < 1e-10);
        assert!((base[1] - 36.0).abs() < 1e-10);
    }

    #[test]
    fn no_contingencies_contribute_nothing() {
        let ctg = ContingencySurplus::zeros(3, &[]);
        assert_eq!(ctg.worst_case, vec![0.0; 3]);
        assert_eq!(ctg.average_case, vec![0.0; 3]);
        assert!(ctg.worst_location.iter().all(Option::is_none));
    }

    #[test]
    fn worst_and_average_case_reduce_over_contingencies() {
        let by_ctg = TimeMatrix::from_rows(vec![vec![-1.0, -3.0], vec![0.0, 2.0]]).unwrap();
        let ctg = ContingencySurplus::new(by_ctg, &Label::uids(["k0", "k1"]));
        assert_eq!(ctg.worst_case, vec![-3.0, 0.0]);
        assert_eq!(ctg.average_case, vec![-2.0, 1.0]);
        let worst = ctg.worst_location[0].as_ref().unwrap();
        assert_eq!(worst.idx, vec![Label::Uid("k1".into())]);

        let mut t = terms(2);
        t.cs = vec![10.0, 10.0];
        let obj = aggregate_objective(&t, &ctg);
        assert_eq!(obj.by_interval, vec![5.0, 11.0]);
        assert_eq!(obj.totals.z, 16.0);
        assert_eq!(obj.totals.z_base, 20.0);
        assert_eq!(obj.totals.z_k_worst_case, -3.0);
        assert_eq!(obj.totals.z_k_average_case, -1.0);
    }

    #[test]
    fn only_positive_hard_violations_count() {
        let zero = Extremum::at(0.0, vec![], vec![]);
        let hit = Extremum::at(1.0, vec![Label::Index(2)], vec![2]);
        let summary = InfeasibilitySummary::from_violations([
            ("viol_sd_t_u_on_max", Some(&zero)),
            ("viol_sh_t_u_st_max", None),
            ("viol_t_connected_base", Some(&hit)),
        ]);
        assert!(summary.is_infeasible());
        assert_eq!(summary.keys().collect::<Vec<_>>(), vec!["viol_t_connected_base"]);
        assert_eq!(summary.get("viol_t_connected_base").unwrap().val, 1.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["viol_t_connected_base"]["val"], 1.0);

        let feasible = InfeasibilitySummary::from_violations([("viol_sd_t_u_on_max", Some(&zero))]);
        assert!(!feasible.is_infeasible());
    }
}
