//! # gridscore-core: Data model for multi-period AC solution scoring
//!
//! Provides the problem and solution representations consumed by the
//! evaluation engine in `gridscore-algo`.
//!
//! ## Design Philosophy
//!
//! The model is **struct-of-tables**:
//! - **Problem**: dense entity tables (buses, shunts, devices, AC lines,
//!   transformers, DC lines, reserve zones, contingencies) plus the interval
//!   durations. Immutable once loaded.
//! - **Solution**: one [`TimeMatrix`] per decision, shaped
//!   `(num_entity, num_t)` with rows in problem order.
//!
//! Entities reference each other by typed dense indices, so a device's bus is
//! a [`BusId`] and can never be confused with a [`DeviceId`].
//!
//! ## Core Data Structures
//!
//! - [`Problem`] - network, economics, horizon
//! - [`Solution`] - the candidate operating plan
//! - [`TimeMatrix`] - row-major per-entity, per-interval storage
//! - [`EvalConfig`] - scoring tolerances and switching rules
//! - [`GridError`] / [`Diagnostics`] - fatal errors and non-fatal findings
//!
//! ## Modules
//!
//! - [`model`] - problem entities
//! - [`solution`] - solution matrices and shape checks
//! - [`series`] - dense time matrices
//! - [`config`] - TOML-backed evaluation settings
//! - [`diagnostics`] - warnings collected before evaluation

use serde::{Deserialize, Serialize};

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod series;
pub mod solution;

pub use config::EvalConfig;
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GridError, GridResult};
pub use model::{
    AcBranch, AcLine, ActiveReserveZone, Bus, Contingency, CostBlock, DcLine, Device, DeviceKind,
    Intervals, Outage, Problem, ReactiveReserveZone, ReservePrices, Shunt, StartupState,
    StartupWindow, Transformer, ViolationCosts,
};
pub use series::TimeMatrix;
pub use solution::{
    AcLineSolution, BusSolution, DcLineSolution, DeviceSolution, ShuntSolution, Solution,
    TransformerSolution,
};

// Newtype wrappers for dense entity indices
macro_rules! dense_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(usize);

            impl $name {
                #[inline]
                pub fn new(value: usize) -> Self {
                    $name(value)
                }
                #[inline]
                pub fn value(&self) -> usize {
                    self.0
                }
            }
        )*
    };
}

dense_id!(BusId, DeviceId, AcLineId, TransformerId, DcLineId);
