//! AC branches: switching, terminal flows and apparent power limits.

pub mod flow;
pub mod switching;

pub use flow::{
    compute_branch_flow, line_flows, overload, overload_report, transformer_flows, BranchFlow,
    BranchFlows, BranchParams, OverloadReport,
};
pub use switching::{evaluate_switching, SwitchingReport};
