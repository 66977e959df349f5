//! The evaluation pipeline.
//!
//! A [`SolutionEvaluator`] is built once per (problem, solution) pair and
//! consumed by [`SolutionEvaluator::run`], which executes the stages in a
//! fixed order. Later stages read the projected values of earlier ones:
//!
//! 1. device commitment (indicators, up/down counters, minimum times, costs)
//! 2. bus voltage bounds, then projection
//! 3. shunt steps and consumption at the projected voltage
//! 4. DC line bounds, then projection
//! 5. transformer tap/phase bounds, then projection
//! 6. AC line and transformer switching
//! 7. AC line and transformer flows, then apparent power overload
//! 8. dispatch (`p = p_on`) and device offer costs
//! 9. bus real and reactive balance
//! 10. zonal reserves (rgu → rgd → scr → nsc → rru → rrd → qru → qrd)
//! 11. connectivity screen
//! 12. objective, then feasibility

use gridscore_core::{
    Diagnostics, EvalConfig, GridResult, Outage, Problem, Severity, Solution, TimeMatrix,
};
use tracing::{debug, error, info, warn};

use crate::balance::{
    evaluate_offers, evaluate_reserves, BalanceReport, BusInjections, OfferCosts,
    ReserveBalance, ZoneIncidence,
};
use crate::bounds::{
    evaluate_dc_lines, evaluate_shunts, evaluate_transformer_controls, evaluate_voltage,
};
use crate::branch::{
    evaluate_switching, line_flows, overload, overload_report, transformer_flows, BranchFlows,
};
use crate::device::{evaluate_commitment, CommitmentReport};
use crate::numeric::Label;
use crate::objective::{
    aggregate_objective, ContingencySurplus, InfeasibilitySummary, Objective, SurplusTerms,
};
use crate::summary::Summary;
use crate::topology::{evaluate_connectivity, ConnectivityReport};

pub struct SolutionEvaluator<'a> {
    problem: &'a Problem,
    solution: &'a Solution,
    config: EvalConfig,
    injections: BusInjections,
    zones: ZoneIncidence,
    diagnostics: Diagnostics,
}

impl<'a> SolutionEvaluator<'a> {
    /// Check the inputs and build the incidence structures.
    ///
    /// Structural errors (bad references, wrong matrix shapes, invalid
    /// configuration) are fatal. Suspicious but evaluable data is recorded
    /// in [`Diagnostics`].
    pub fn new(
        problem: &'a Problem,
        solution: &'a Solution,
        config: EvalConfig,
    ) -> GridResult<Self> {
        config.validate()?;
        problem.check_structure()?;
        solution.check_shapes(problem)?;

        let injections = BusInjections::new(problem);
        let zones = ZoneIncidence::new(problem);
        let diagnostics = collect_diagnostics(problem, &zones);
        for issue in &diagnostics.issues {
            match issue.severity {
                Severity::Error => error!("{issue}"),
                Severity::Warning => warn!("{issue}"),
            }
        }
        debug!(
            num_t = problem.num_t(),
            num_bus = problem.buses.len(),
            num_sd = problem.devices.len(),
            num_acl = problem.ac_lines.len(),
            num_xfr = problem.transformers.len(),
            num_dcl = problem.dc_lines.len(),
            num_k = problem.contingencies.len(),
            "evaluator prepared"
        );

        Ok(Self {
            problem,
            solution,
            config,
            injections,
            zones,
            diagnostics,
        })
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run every stage once and assemble the results.
    pub fn run(self) -> GridResult<Evaluation> {
        let problem = self.problem;
        let sol = self.solution;
        let config = &self.config;
        let num_t = problem.num_t();
        let durations = problem.durations();
        let costs = &problem.violation_costs;

        let commitment = evaluate_commitment(problem, &sol.device.on_status, config.time_eq_tol);

        let (voltage, v) = evaluate_voltage(problem, &sol.bus.v);
        let shunts = evaluate_shunts(problem, &sol.shunt.u_st, &v);
        let dc_lines = evaluate_dc_lines(problem, &sol.dc_line);
        let xfr_controls = evaluate_transformer_controls(
            problem,
            &sol.transformer,
            config.project_transformer_controls,
        );
        debug!(
            v_max = voltage.max.as_ref().map_or(0.0, |e| e.val),
            v_min = voltage.min.as_ref().map_or(0.0, |e| e.val),
            "bounds checked and projected"
        );

        let xfr_branches = || problem.transformers.iter().map(|x| &x.branch);
        let acl_switching = evaluate_switching(
            problem.ac_lines.iter(),
            &sol.ac_line.on_status,
            config.acl_switch_up_allowed,
            config.acl_switch_dn_allowed,
        );
        let xfr_switching = evaluate_switching(
            xfr_branches(),
            &sol.transformer.on_status,
            config.xfr_switch_up_allowed,
            config.xfr_switch_dn_allowed,
        );

        let theta = &sol.bus.theta;
        let acl_flows = line_flows(problem, &v, theta, &sol.ac_line.on_status);
        let xfr_flows = transformer_flows(
            problem,
            &v,
            theta,
            &sol.transformer.on_status,
            &xfr_controls.tau_used,
            &xfr_controls.phi_used,
        );
        let acl_uids = Label::uids(problem.ac_lines.iter().map(|l| l.uid.as_str()));
        let xfr_uids = Label::uids(xfr_branches().map(|b| b.uid.as_str()));
        let acl_s_max: Vec<f64> = problem.ac_lines.iter().map(|l| l.s_max).collect();
        let xfr_s_max: Vec<f64> = xfr_branches().map(|b| b.s_max).collect();
        let acl_overload = overload_report(
            &overload(&acl_flows, &acl_s_max),
            &acl_uids,
            durations,
            costs.c_s,
        );
        let xfr_overload = overload_report(
            &overload(&xfr_flows, &xfr_s_max),
            &xfr_uids,
            durations,
            costs.c_s,
        );
        debug!(
            acl_s_cost = acl_overload.total_cost(),
            xfr_s_cost = xfr_overload.total_cost(),
            "branch flows evaluated"
        );

        // capability curves are not modeled
        let p = sol.device.p_on.clone();
        let offers = evaluate_offers(problem, &p, &sol.device);

        let bus_uids = Label::uids(problem.buses.iter().map(|b| b.uid.as_str()));
        let bus_p = BalanceReport::new(
            self.injections.real_shortfall(
                &p,
                &shunts.p,
                &acl_flows,
                &xfr_flows,
                &dc_lines.flows.p,
            )?,
            &bus_uids,
            durations,
            costs.c_p,
        );
        let bus_q = BalanceReport::new(
            self.injections.reactive_shortfall(
                &sol.device.q,
                &shunts.q,
                &acl_flows,
                &xfr_flows,
                &dc_lines.flows.q_fr,
                &dc_lines.flows.q_to,
            )?,
            &bus_uids,
            durations,
            costs.c_q,
        );
        debug!(
            p_cost = bus_p.total_cost(),
            q_cost = bus_q.total_cost(),
            "bus balance evaluated"
        );

        let reserves = evaluate_reserves(problem, &self.zones, &p, &sol.device)?;
        debug!(
            prz_cost = reserves.active_cost_by_interval().iter().sum::<f64>(),
            qrz_cost = reserves.reactive_cost_by_interval().iter().sum::<f64>(),
            "zonal reserves evaluated"
        );

        let connectivity =
            evaluate_connectivity(problem, &sol.ac_line.on_status, &sol.transformer.on_status);

        let terms = SurplusTerms {
            on: commitment.costs.on.column_sums(),
            su: commitment.costs.su.column_sums(),
            sd: commitment.costs.sd.column_sums(),
            sus: commitment.startup_state_cost.column_sums(),
            acl_su: acl_switching.su_cost_by_interval.clone(),
            acl_sd: acl_switching.sd_cost_by_interval.clone(),
            acl_s: acl_overload.cost_by_interval.clone(),
            xfr_su: xfr_switching.su_cost_by_interval.clone(),
            xfr_sd: xfr_switching.sd_cost_by_interval.clone(),
            xfr_s: xfr_overload.cost_by_interval.clone(),
            bus_p: bus_p.cost_by_interval.clone(),
            bus_q: bus_q.cost_by_interval.clone(),
            pr: offers.producer_cost.clone(),
            cs: offers.consumer_benefit.clone(),
            reserve_offers: offers.reserve.by_interval(),
            prz: reserves.active_cost_by_interval(),
            qrz: reserves.reactive_cost_by_interval(),
        };
        let ctg_uids = Label::uids(problem.contingencies.iter().map(|k| k.uid.as_str()));
        let objective = aggregate_objective(&terms, &ContingencySurplus::zeros(num_t, &ctg_uids));

        let reserve_offers = &offers.reserve;
        let mut summary = Summary {
            viol_sd_t_u_on_max: commitment.viol_on_max.clone(),
            viol_sd_t_u_on_min: commitment.viol_on_min.clone(),
            sum_sd_t_su: commitment.num_startups(),
            sum_sd_t_sd: commitment.num_shutdowns(),
            viol_sd_t_d_up_min: commitment.viol_up_min.clone(),
            viol_sd_t_d_dn_min: commitment.viol_down_min.clone(),
            viol_sd_max_startup_constr: commitment.viol_max_startup.clone(),
            sum_sd_t_z_on: commitment.costs.on.sum(),
            sum_sd_t_z_su: commitment.costs.su.sum(),
            sum_sd_t_z_sd: commitment.costs.sd.sum(),
            sum_sd_t_z_sus: commitment.startup_state_cost.sum(),

            viol_bus_t_v_max: voltage.max,
            viol_bus_t_v_min: voltage.min,
            viol_sh_t_u_st_max: shunts.steps.max,
            viol_sh_t_u_st_min: shunts.steps.min,
            viol_dcl_t_p_max: dc_lines.p.max,
            viol_dcl_t_p_min: dc_lines.p.min,
            viol_dcl_t_q_fr_max: dc_lines.q_fr.max,
            viol_dcl_t_q_fr_min: dc_lines.q_fr.min,
            viol_dcl_t_q_to_max: dc_lines.q_to.max,
            viol_dcl_t_q_to_min: dc_lines.q_to.min,
            viol_xfr_t_tau_max: xfr_controls.tau.max,
            viol_xfr_t_tau_min: xfr_controls.tau.min,
            viol_xfr_t_phi_max: xfr_controls.phi.max,
            viol_xfr_t_phi_min: xfr_controls.phi.min,

            viol_acl_t_u_su_max: acl_switching.viol_su.clone(),
            viol_acl_t_u_sd_max: acl_switching.viol_sd.clone(),
            viol_xfr_t_u_su_max: xfr_switching.viol_su.clone(),
            viol_xfr_t_u_sd_max: xfr_switching.viol_sd.clone(),
            sum_acl_t_u_su: acl_switching.num_su(),
            sum_acl_t_u_sd: acl_switching.num_sd(),
            sum_xfr_t_u_su: xfr_switching.num_su(),
            sum_xfr_t_u_sd: xfr_switching.num_sd(),
            sum_acl_t_z_su: acl_switching.su_cost(),
            sum_acl_t_z_sd: acl_switching.sd_cost(),
            sum_xfr_t_z_su: xfr_switching.su_cost(),
            sum_xfr_t_z_sd: xfr_switching.sd_cost(),

            sum_acl_t_z_s: acl_overload.total_cost(),
            viol_acl_t_s_max: acl_overload.viol,
            sum_xfr_t_z_s: xfr_overload.total_cost(),
            viol_xfr_t_s_max: xfr_overload.viol,

            viol_bus_t_p_balance_max: bus_p.viol_max.clone(),
            viol_bus_t_p_balance_min: bus_p.viol_min.clone(),
            sum_bus_t_z_p: bus_p.total_cost(),
            viol_bus_t_q_balance_max: bus_q.viol_max.clone(),
            viol_bus_t_q_balance_min: bus_q.viol_min.clone(),
            sum_bus_t_z_q: bus_q.total_cost(),

            sum_pr_t_z_p: offers.total_producer_cost(),
            sum_cs_t_z_p: offers.total_consumer_benefit(),

            sum_sd_t_z_rgu: reserve_offers.rgu.iter().sum(),
            sum_sd_t_z_rgd: reserve_offers.rgd.iter().sum(),
            sum_sd_t_z_scr: reserve_offers.scr.iter().sum(),
            sum_sd_t_z_nsc: reserve_offers.nsc.iter().sum(),
            sum_sd_t_z_rru_on: reserve_offers.rru_on.iter().sum(),
            sum_sd_t_z_rrd_on: reserve_offers.rrd_on.iter().sum(),
            sum_sd_t_z_rru_off: reserve_offers.rru_off.iter().sum(),
            sum_sd_t_z_rrd_off: reserve_offers.rrd_off.iter().sum(),
            sum_sd_t_z_qru: reserve_offers.qru.iter().sum(),
            sum_sd_t_z_qrd: reserve_offers.qrd.iter().sum(),

            viol_prz_t_p_rgu_balance: reserves.rgu.viol.clone(),
            viol_prz_t_p_rgd_balance: reserves.rgd.viol.clone(),
            viol_prz_t_p_scr_balance: reserves.scr.viol.clone(),
            viol_prz_t_p_nsc_balance: reserves.nsc.viol.clone(),
            viol_prz_t_p_rru_balance: reserves.rru.viol.clone(),
            viol_prz_t_p_rrd_balance: reserves.rrd.viol.clone(),
            viol_qrz_t_q_qru_balance: reserves.qru.viol.clone(),
            viol_qrz_t_q_qrd_balance: reserves.qrd.viol.clone(),
            sum_prz_t_z_rgu: reserves.rgu.total_cost(),
            sum_prz_t_z_rgd: reserves.rgd.total_cost(),
            sum_prz_t_z_scr: reserves.scr.total_cost(),
            sum_prz_t_z_nsc: reserves.nsc.total_cost(),
            sum_prz_t_z_rru: reserves.rru.total_cost(),
            sum_prz_t_z_rrd: reserves.rrd.total_cost(),
            sum_qrz_t_z_qru: reserves.qru.total_cost(),
            sum_qrz_t_z_qrd: reserves.qrd.total_cost(),

            viol_t_connected_base: connectivity.base_violation(),
            viol_t_connected_ctg: connectivity.contingency_violation(),
            info_connected_base: connectivity.info_base.clone(),
            info_connected_ctg: connectivity.info_ctg.clone(),

            z: objective.totals.z,
            z_base: objective.totals.z_base,
            z_k_worst_case: objective.totals.z_k_worst_case,
            z_k_average_case: objective.totals.z_k_average_case,
            infeas: 0,
        };
        let infeasibility = summary.infeasibility_summary();
        summary.infeas = i64::from(infeasibility.is_infeasible());

        // on, startup, shutdown, startup state and energy, per device
        let device_cost = commitment
            .costs
            .total
            .zip_map(&commitment.startup_state_cost, |a, b| a + b)
            .zip_map(&offers.energy, |a, b| a + b);

        info!(
            z = summary.z,
            z_base = summary.z_base,
            infeas = summary.infeas,
            hard_violations = infeasibility.len(),
            "evaluation complete"
        );

        Ok(Evaluation {
            summary,
            infeasibility,
            diagnostics: self.diagnostics,
            commitment,
            acl_flows,
            xfr_flows,
            bus_p,
            bus_q,
            reserves,
            offers,
            connectivity,
            objective,
            device_cost,
        })
    }
}

fn collect_diagnostics(problem: &Problem, zones: &ZoneIncidence) -> Diagnostics {
    let mut diag = Diagnostics::new();
    for uid in zones.empty_zones(problem) {
        diag.warn(
            "reserve",
            uid,
            "zone has no member devices; its whole requirement is short",
        );
    }
    let branches = problem
        .ac_lines
        .iter()
        .chain(problem.transformers.iter().map(|x| &x.branch));
    for branch in branches {
        if branch.r == 0.0 && branch.x == 0.0 {
            diag.error(
                "branch",
                &branch.uid,
                "zero series impedance; flows are not finite",
            );
        }
    }
    for xfr in &problem.transformers {
        if xfr.tau_min <= 0.0 {
            diag.warn(
                "transformer",
                &xfr.branch.uid,
                &format!("tau_min = {} allows a non-positive tap ratio", xfr.tau_min),
            );
        }
    }
    for ctg in &problem.contingencies {
        if matches!(ctg.outage, Outage::DcLine(_)) {
            diag.warn(
                "contingency",
                &ctg.uid,
                "DC line outage does not affect AC connectivity",
            );
        }
    }
    diag
}

/// Results of one evaluation run.
#[derive(Debug, Clone)]
pub struct Evaluation {
    summary: Summary,
    infeasibility: InfeasibilitySummary,
    diagnostics: Diagnostics,
    commitment: CommitmentReport,
    acl_flows: BranchFlows,
    xfr_flows: BranchFlows,
    bus_p: BalanceReport,
    bus_q: BalanceReport,
    reserves: ReserveBalance,
    offers: OfferCosts,
    connectivity: ConnectivityReport,
    objective: Objective,
    device_cost: TimeMatrix<f64>,
}

impl Evaluation {
    /// Total net market surplus `z`.
    pub fn objective(&self) -> f64 {
        self.objective.totals.z
    }

    pub fn infeasible(&self) -> bool {
        self.infeasibility.is_infeasible()
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn infeasibility_summary(&self) -> &InfeasibilitySummary {
        &self.infeasibility
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn startup(&self) -> &TimeMatrix<i64> {
        &self.commitment.startup
    }

    pub fn shutdown(&self) -> &TimeMatrix<i64> {
        &self.commitment.shutdown
    }

    pub fn up_time_at_start(&self) -> &TimeMatrix<f64> {
        &self.commitment.up_time_at_start
    }

    pub fn down_time_at_start(&self) -> &TimeMatrix<f64> {
        &self.commitment.down_time_at_start
    }

    pub fn acl_flows(&self) -> &BranchFlows {
        &self.acl_flows
    }

    pub fn xfr_flows(&self) -> &BranchFlows {
        &self.xfr_flows
    }

    pub fn bus_p_shortfall(&self) -> &TimeMatrix<f64> {
        &self.bus_p.shortfall
    }

    pub fn bus_q_shortfall(&self) -> &TimeMatrix<f64> {
        &self.bus_q.shortfall
    }

    pub fn reserves(&self) -> &ReserveBalance {
        &self.reserves
    }

    pub fn offers(&self) -> &OfferCosts {
        &self.offers
    }

    pub fn connectivity(&self) -> &ConnectivityReport {
        &self.connectivity
    }

    /// Accumulated cost per device and interval: on, startup, shutdown,
    /// startup state adjustment and energy.
    pub fn device_cost(&self) -> &TimeMatrix<f64> {
        &self.device_cost
    }

    pub fn surplus_by_interval(&self) -> &[f64] {
        &self.objective.by_interval
    }

    pub fn objective_terms(&self) -> &Objective {
        &self.objective
    }
}
