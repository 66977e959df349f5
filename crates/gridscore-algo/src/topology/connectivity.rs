//! Per-interval connectivity screen of the base case and of every
//! single-branch contingency.
//!
//! A contingency disconnects the network exactly when its outaged branch is
//! energized and is a bridge of the base-case graph, so each interval needs
//! one component count and one bridge search regardless of how many
//! contingencies are defined.

use gridscore_core::{Outage, Problem, TimeMatrix};
use serde::Serialize;
use tracing::debug;

use super::{bridges, component_count, connected_components};
use crate::numeric::{max_of_series, Extremum, Label};

/// First interval at which the base case splits into islands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaseConnectivityInfo {
    pub violation: bool,
    pub t: Option<usize>,
    /// Smallest bus of the first island
    pub i0: Option<String>,
    /// Smallest bus of the second island
    pub i1: Option<String>,
    pub i0_idx: Option<usize>,
    pub i1_idx: Option<usize>,
}

/// First interval at which some contingency outages a bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContingencyConnectivityInfo {
    pub violation: bool,
    pub t: Option<usize>,
    pub k: Option<String>,
    /// Endpoints of the exposed bridge
    pub i0: Option<String>,
    pub i1: Option<String>,
    pub k_idx: Option<usize>,
    pub i0_idx: Option<usize>,
    pub i1_idx: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    /// Number of islands per interval
    pub components_base: Vec<usize>,
    /// Number of energized bridges covered by a contingency, per interval
    pub ctg_bridges: Vec<usize>,
    pub info_base: BaseConnectivityInfo,
    pub info_ctg: ContingencyConnectivityInfo,
}

impl ConnectivityReport {
    /// `max_t(components − 1)`, located by interval.
    pub fn base_violation(&self) -> Option<Extremum> {
        let excess: Vec<f64> = self
            .components_base
            .iter()
            .map(|&c| c.saturating_sub(1) as f64)
            .collect();
        max_of_series(&excess, &Label::indices(excess.len()))
    }

    /// `max_t(ctg_bridges)`, located by interval.
    pub fn contingency_violation(&self) -> Option<Extremum> {
        let counts: Vec<f64> = self.ctg_bridges.iter().map(|&c| c as f64).collect();
        max_of_series(&counts, &Label::indices(counts.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BranchKind {
    AcLine,
    Transformer,
}

#[derive(Debug, Clone, Copy)]
struct Branch {
    kind: BranchKind,
    index: usize,
    fr: usize,
    to: usize,
    /// Lowest-index contingency that outages this branch
    ctg: Option<usize>,
}

fn branch_table(problem: &Problem) -> Vec<Branch> {
    let mut table: Vec<Branch> = problem
        .ac_lines
        .iter()
        .enumerate()
        .map(|(j, acl)| Branch {
            kind: BranchKind::AcLine,
            index: j,
            fr: acl.fr_bus.value(),
            to: acl.to_bus.value(),
            ctg: None,
        })
        .chain(problem.transformers.iter().enumerate().map(|(j, xfr)| Branch {
            kind: BranchKind::Transformer,
            index: j,
            fr: xfr.branch.fr_bus.value(),
            to: xfr.branch.to_bus.value(),
            ctg: None,
        }))
        .collect();
    let num_acl = problem.ac_lines.len();
    for (k, ctg) in problem.contingencies.iter().enumerate() {
        let pos = match ctg.outage {
            Outage::AcLine(id) => id.value(),
            Outage::Transformer(id) => num_acl + id.value(),
            Outage::DcLine(_) => continue,
        };
        if let Some(branch) = table.get_mut(pos) {
            branch.ctg.get_or_insert(k);
        }
    }
    table
}

/// Run the base-case and contingency connectivity screen over the horizon.
///
/// `acl_on` and `xfr_on` are the branch on/off matrices; only an entry of 1
/// energizes the branch.
pub fn evaluate_connectivity(
    problem: &Problem,
    acl_on: &TimeMatrix<i64>,
    xfr_on: &TimeMatrix<i64>,
) -> ConnectivityReport {
    let num_t = problem.num_t();
    let num_bus = problem.buses.len();
    let num_acl = problem.ac_lines.len();
    let table = branch_table(problem);
    let bus_uid = |i: usize| problem.buses[i].uid.clone();

    let mut report = ConnectivityReport {
        components_base: Vec::with_capacity(num_t),
        ctg_bridges: Vec::with_capacity(num_t),
        info_base: BaseConnectivityInfo::default(),
        info_ctg: ContingencyConnectivityInfo::default(),
    };

    for t in 0..num_t {
        let energized: Vec<&Branch> = table
            .iter()
            .filter(|b| {
                let on = match b.kind {
                    BranchKind::AcLine => acl_on.get(b.index, t),
                    BranchKind::Transformer => xfr_on.get(b.index, t),
                };
                on == 1
            })
            .collect();
        let edges: Vec<(usize, usize)> = energized.iter().map(|b| (b.fr, b.to)).collect();

        let count = component_count(num_bus, &edges);
        report.components_base.push(count);
        if count > 1 && !report.info_base.violation {
            let components = connected_components(num_bus, &edges);
            let (i0, i1) = (components[0][0], components[1][0]);
            report.info_base = BaseConnectivityInfo {
                violation: true,
                t: Some(t),
                i0: Some(bus_uid(i0)),
                i1: Some(bus_uid(i1)),
                i0_idx: Some(i0),
                i1_idx: Some(i1),
            };
        }

        let mut exposed: Vec<&Branch> = bridges(num_bus, &edges)
            .into_iter()
            .map(|pos| energized[pos])
            .filter(|b| b.ctg.is_some())
            .collect();
        report.ctg_bridges.push(exposed.len());
        if !report.info_ctg.violation {
            exposed.sort_by_key(|b| (b.fr, b.to, b.kind, b.index));
            if let Some(first) = exposed.first() {
                if let Some(k) = first.ctg {
                    report.info_ctg = ContingencyConnectivityInfo {
                        violation: true,
                        t: Some(t),
                        k: Some(problem.contingencies[k].uid.clone()),
                        i0: Some(bus_uid(first.fr)),
                        i1: Some(bus_uid(first.to)),
                        k_idx: Some(k),
                        i0_idx: Some(first.fr),
                        i1_idx: Some(first.to),
                    };
                }
            }
        }
    }

    debug!(
        num_acl,
        num_xfr = table.len() - num_acl,
        max_components = report.components_base.iter().copied().max().unwrap_or(0),
        max_ctg_bridges = report.ctg_bridges.iter().copied().max().unwrap_or(0),
        "connectivity screened"
    );
    report
}
