//! Flat evaluation summary.
//!
//! Field order is the serialized key order. Violations are `None` when the
//! underlying array is empty (e.g. no shunts), `sum_*_t_z_*` fields are
//! costs or benefits, and the remaining `sum_*` fields count events.

use serde::Serialize;

use crate::numeric::Extremum;
use crate::objective::{InfeasibilitySummary, HARD_VIOLATION_KEYS};
use crate::topology::{BaseConnectivityInfo, ContingencyConnectivityInfo};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub viol_sd_t_u_on_max: Option<Extremum>,
    pub viol_sd_t_u_on_min: Option<Extremum>,
    pub sum_sd_t_su: i64,
    pub sum_sd_t_sd: i64,
    pub viol_sd_t_d_up_min: Option<Extremum>,
    pub viol_sd_t_d_dn_min: Option<Extremum>,
    pub viol_sd_max_startup_constr: Option<Extremum>,
    pub sum_sd_t_z_on: f64,
    pub sum_sd_t_z_su: f64,
    pub sum_sd_t_z_sd: f64,
    pub sum_sd_t_z_sus: f64,

    pub viol_bus_t_v_max: Option<Extremum>,
    pub viol_bus_t_v_min: Option<Extremum>,
    pub viol_sh_t_u_st_max: Option<Extremum>,
    pub viol_sh_t_u_st_min: Option<Extremum>,
    pub viol_dcl_t_p_max: Option<Extremum>,
    pub viol_dcl_t_p_min: Option<Extremum>,
    pub viol_dcl_t_q_fr_max: Option<Extremum>,
    pub viol_dcl_t_q_fr_min: Option<Extremum>,
    pub viol_dcl_t_q_to_max: Option<Extremum>,
    pub viol_dcl_t_q_to_min: Option<Extremum>,
    pub viol_xfr_t_tau_max: Option<Extremum>,
    pub viol_xfr_t_tau_min: Option<Extremum>,
    pub viol_xfr_t_phi_max: Option<Extremum>,
    pub viol_xfr_t_phi_min: Option<Extremum>,

    pub viol_acl_t_u_su_max: Option<Extremum>,
    pub viol_acl_t_u_sd_max: Option<Extremum>,
    pub viol_xfr_t_u_su_max: Option<Extremum>,
    pub viol_xfr_t_u_sd_max: Option<Extremum>,
    pub sum_acl_t_u_su: i64,
    pub sum_acl_t_u_sd: i64,
    pub sum_xfr_t_u_su: i64,
    pub sum_xfr_t_u_sd: i64,
    pub sum_acl_t_z_su: f64,
    pub sum_acl_t_z_sd: f64,
    pub sum_xfr_t_z_su: f64,
    pub sum_xfr_t_z_sd: f64,

    pub sum_acl_t_z_s: f64,
    pub viol_acl_t_s_max: Option<Extremum>,
    pub sum_xfr_t_z_s: f64,
    pub viol_xfr_t_s_max: Option<Extremum>,

    pub viol_bus_t_p_balance_max: Option<Extremum>,
    pub viol_bus_t_p_balance_min: Option<Extremum>,
    pub sum_bus_t_z_p: f64,
    pub viol_bus_t_q_balance_max: Option<Extremum>,
    pub viol_bus_t_q_balance_min: Option<Extremum>,
    pub sum_bus_t_z_q: f64,

    pub sum_pr_t_z_p: f64,
    pub sum_cs_t_z_p: f64,

    pub sum_sd_t_z_rgu: f64,
    pub sum_sd_t_z_rgd: f64,
    pub sum_sd_t_z_scr: f64,
    pub sum_sd_t_z_nsc: f64,
    pub sum_sd_t_z_rru_on: f64,
    pub sum_sd_t_z_rrd_on: f64,
    pub sum_sd_t_z_rru_off: f64,
    pub sum_sd_t_z_rrd_off: f64,
    pub sum_sd_t_z_qru: f64,
    pub sum_sd_t_z_qrd: f64,

    pub viol_prz_t_p_rgu_balance: Option<Extremum>,
    pub viol_prz_t_p_rgd_balance: Option<Extremum>,
    pub viol_prz_t_p_scr_balance: Option<Extremum>,
    pub viol_prz_t_p_nsc_balance: Option<Extremum>,
    pub viol_prz_t_p_rru_balance: Option<Extremum>,
    pub viol_prz_t_p_rrd_balance: Option<Extremum>,
    pub viol_qrz_t_q_qru_balance: Option<Extremum>,
    pub viol_qrz_t_q_qrd_balance: Option<Extremum>,
    pub sum_prz_t_z_rgu: f64,
    pub sum_prz_t_z_rgd: f64,
    pub sum_prz_t_z_scr: f64,
    pub sum_prz_t_z_nsc: f64,
    pub sum_prz_t_z_rru: f64,
    pub sum_prz_t_z_rrd: f64,
    pub sum_qrz_t_z_qru: f64,
    pub sum_qrz_t_z_qrd: f64,

    pub viol_t_connected_base: Option<Extremum>,
    pub viol_t_connected_ctg: Option<Extremum>,
    pub info_connected_base: BaseConnectivityInfo,
    pub info_connected_ctg: ContingencyConnectivityInfo,

    pub z: f64,
    pub z_base: f64,
    pub z_k_worst_case: f64,
    pub z_k_average_case: f64,
    pub infeas: i64,
}

impl Summary {
    /// The feasibility-determining entries, named by their summary key.
    pub fn hard_violations(&self) -> [(&'static str, Option<&Extremum>); 13] {
        let values = [
            &self.viol_sd_t_u_on_max,
            &self.viol_sd_t_u_on_min,
            &self.viol_sd_t_d_up_min,
            &self.viol_sd_t_d_dn_min,
            &self.viol_sd_max_startup_constr,
            &self.viol_sh_t_u_st_max,
            &self.viol_sh_t_u_st_min,
            &self.viol_acl_t_u_su_max,
            &self.viol_acl_t_u_sd_max,
            &self.viol_xfr_t_u_su_max,
            &self.viol_xfr_t_u_sd_max,
            &self.viol_t_connected_base,
            &self.viol_t_connected_ctg,
        ];
        let mut out = [("", None); 13];
        for ((slot, key), value) in out.iter_mut().zip(HARD_VIOLATION_KEYS).zip(values) {
            *slot = (key, value.as_ref());
        }
        out
    }

    pub fn infeasibility_summary(&self) -> InfeasibilitySummary {
        InfeasibilitySummary::from_violations(self.hard_violations())
    }

    /// Every violation entry in key order, for reporting.
    pub fn violations(&self) -> Vec<(&'static str, Option<&Extremum>)> {
        vec![
            ("viol_sd_t_u_on_max", self.viol_sd_t_u_on_max.as_ref()),
            ("viol_sd_t_u_on_min", self.viol_sd_t_u_on_min.as_ref()),
            ("viol_sd_t_d_up_min", self.viol_sd_t_d_up_min.as_ref()),
            ("viol_sd_t_d_dn_min", self.viol_sd_t_d_dn_min.as_ref()),
            ("viol_sd_max_startup_constr", self.viol_sd_max_startup_constr.as_ref()),
            ("viol_bus_t_v_max", self.viol_bus_t_v_max.as_ref()),
            ("viol_bus_t_v_min", self.viol_bus_t_v_min.as_ref()),
            ("viol_sh_t_u_st_max", self.viol_sh_t_u_st_max.as_ref()),
            ("viol_sh_t_u_st_min", self.viol_sh_t_u_st_min.as_ref()),
            ("viol_dcl_t_p_max", self.viol_dcl_t_p_max.as_ref()),
            ("viol_dcl_t_p_min", self.viol_dcl_t_p_min.as_ref()),
            ("viol_dcl_t_q_fr_max", self.viol_dcl_t_q_fr_max.as_ref()),
            ("viol_dcl_t_q_fr_min", self.viol_dcl_t_q_fr_min.as_ref()),
            ("viol_dcl_t_q_to_max", self.viol_dcl_t_q_to_max.as_ref()),
            ("viol_dcl_t_q_to_min", self.viol_dcl_t_q_to_min.as_ref()),
            ("viol_xfr_t_tau_max", self.viol_xfr_t_tau_max.as_ref()),
            ("viol_xfr_t_tau_min", self.viol_xfr_t_tau_min.as_ref()),
            ("viol_xfr_t_phi_max", self.viol_xfr_t_phi_max.as_ref()),
            ("viol_xfr_t_phi_min", self.viol_xfr_t_phi_min.as_ref()),
            ("viol_acl_t_u_su_max", self.viol_acl_t_u_su_max.as_ref()),
            ("viol_acl_t_u_sd_max", self.viol_acl_t_u_sd_max.as_ref()),
            ("viol_xfr_t_u_su_max", self.viol_xfr_t_u_su_max.as_ref()),
            ("viol_xfr_t_u_sd_max", self.viol_xfr_t_u_sd_max.as_ref()),
            ("viol_acl_t_s_max", self.viol_acl_t_s_max.as_ref()),
            ("viol_xfr_t_s_max", self.viol_xfr_t_s_max.as_ref()),
            ("viol_bus_t_p_balance_max", self.viol_bus_t_p_balance_max.as_ref()),
            ("viol_bus_t_p_balance_min", self.viol_bus_t_p_balance_min.as_ref()),
            ("viol_bus_t_q_balance_max", self.viol_bus_t_q_balance_max.as_ref()),
            ("viol_bus_t_q_balance_min", self.viol_bus_t_q_balance_min.as_ref()),
            ("viol_prz_t_p_rgu_balance", self.viol_prz_t_p_rgu_balance.as_ref()),
            ("viol_prz_t_p_rgd_balance", self.viol_prz_t_p_rgd_balance.as_ref()),
            ("viol_prz_t_p_scr_balance", self.viol_prz_t_p_scr_balance.as_ref()),
            ("viol_prz_t_p_nsc_balance", self.viol_prz_t_p_nsc_balance.as_ref()),
            ("viol_prz_t_p_rru_balance", self.viol_prz_t_p_rru_balance.as_ref()),
            ("viol_prz_t_p_rrd_balance", self.viol_prz_t_p_rrd_balance.as_ref()),
            ("viol_qrz_t_q_qru_balance", self.viol_qrz_t_q_qru_balance.as_ref()),
            ("viol_qrz_t_q_qrd_balance", self.viol_qrz_t_q_qrd_balance.as_ref()),
            ("viol_t_connected_base", self.viol_t_connected_base.as_ref()),
            ("viol_t_connected_ctg", self.viol_t_connected_ctg.as_ref()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Label;

    #[test]
    fn serializes_in_key_order() {
        let summary = Summary::default();
        let json = serde_json::to_string(&summary).unwrap();
        let first = json.find("\"viol_sd_t_u_on_max\"").unwrap();
        let sum_pr = json.find("\"sum_pr_t_z_p\"").unwrap();
        let z = json.find("\"z\"").unwrap();
        let infeas = json.find("\"infeas\"").unwrap();
        assert!(first < sum_pr && sum_pr < z && z < infeas);
        assert!(json.contains("\"viol_sh_t_u_st_max\":null"));
    }

    #[test]
    fn hard_violations_follow_key_list() {
        let mut summary = Summary::default();
        summary.viol_sh_t_u_st_min = Some(Extremum::at(
            2.0,
            vec![Label::Uid("sh0".into()), Label::Index(1)],
            vec![0, 1],
        ));
        // projected bounds never count
        summary.viol_bus_t_v_max = Some(Extremum::at(0.1, vec![], vec![]));

        let hard = summary.hard_violations();
        assert_eq!(hard.len(), HARD_VIOLATION_KEYS.len());
        assert_eq!(hard[6].0, "viol_sh_t_u_st_min");
        assert!(hard[6].1.is_some());

        let infeas = summary.infeasibility_summary();
        assert_eq!(infeas.keys().collect::<Vec<_>>(), vec!["viol_sh_t_u_st_min"]);
        assert_eq!(summary.violations().len(), 39);
    }
}
