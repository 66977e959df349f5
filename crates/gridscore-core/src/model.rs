//! Problem data: the static network, its economics and the horizon.
//!
//! Entities live in dense tables (`Vec<Bus>`, `Vec<Device>`, ...) and refer to
//! each other through typed indices ([`BusId`], [`DeviceId`], ...). The `uid`
//! string carried by every entity is only used to label violation locations.
//!
//! ## Units and conventions
//!
//! | Quantity | Convention |
//! |----------|------------|
//! | Voltage, power, admittance | per unit |
//! | Angles (θ, φ) | radians |
//! | Durations, up/down times, window bounds | same time unit as `intervals.durations` |
//! | Prices | per unit power per unit time (energy, reserves, penalties) |
//!
//! Consumer energy blocks carry the negated marginal value as `cost`, so that
//! block prices are non-decreasing for every device and the evaluated cost of a
//! consumer is non-positive.

use std::path::Path;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::{AcLineId, BusId, DcLineId, DeviceId, TransformerId};

/// Time discretization of the horizon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intervals {
    pub durations: Vec<f64>,
}

impl Intervals {
    pub fn num_t(&self) -> usize {
        self.durations.len()
    }

    /// Start time of each interval, the first interval starting at 0.
    pub fn start_times(&self) -> Vec<f64> {
        let mut starts = Vec::with_capacity(self.durations.len());
        let mut elapsed = 0.0;
        for d in &self.durations {
            starts.push(elapsed);
            elapsed += d;
        }
        starts
    }
}

/// Unit penalty prices for soft network constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationCosts {
    /// Real power bus imbalance
    pub c_p: f64,
    /// Reactive power bus imbalance
    pub c_q: f64,
    /// Branch apparent power overload
    pub c_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub uid: String,
    pub v_min: f64,
    pub v_max: f64,
}

/// Switchable shunt with integer step count `u_st`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shunt {
    pub uid: String,
    pub bus: BusId,
    /// Conductance per step
    pub g_st: f64,
    /// Susceptance per step
    pub b_st: f64,
    pub u_st_min: i64,
    pub u_st_max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Producer,
    Consumer,
}

impl DeviceKind {
    /// Sign of the device's real/reactive injection at its bus.
    pub fn injection_sign(self) -> f64 {
        match self {
            DeviceKind::Producer => 1.0,
            DeviceKind::Consumer => -1.0,
        }
    }
}

/// One segment of a convex piecewise-linear energy cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBlock {
    /// Width of the segment
    pub p_max: f64,
    /// Marginal cost over the segment
    pub cost: f64,
}

/// Downtime-dependent startup cost adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartupState {
    /// Cost adjustment applied at a startup (typically ≤ 0)
    pub cost: f64,
    /// The state qualifies if downtime at the start of the interval is at most this
    pub max_downtime: f64,
}

/// Limit on the number of startups whose interval start time lies in `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartupWindow {
    pub start: f64,
    pub end: f64,
    pub max_startups: i64,
}

/// Per-interval offer prices for each reserve product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservePrices {
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

impl ReservePrices {
    /// Zero prices for every product over `num_t` intervals.
    pub fn zeros(num_t: usize) -> Self {
        let z = vec![0.0; num_t];
        Self {
            rgu: z.clone(),
            rgd: z.clone(),
            scr: z.clone(),
            nsc: z.clone(),
            rru_on: z.clone(),
            rrd_on: z.clone(),
            rru_off: z.clone(),
            rrd_off: z.clone(),
            qru: z.clone(),
            qrd: z,
        }
    }

    fn named(&self) -> [(&'static str, &Vec<f64>); 10] {
        [
            ("rgu", &self.rgu),
            ("rgd", &self.rgd),
            ("scr", &self.scr),
            ("nsc", &self.nsc),
            ("rru_on", &self.rru_on),
            ("rrd_on", &self.rrd_on),
            ("rru_off", &self.rru_off),
            ("rrd_off", &self.rrd_off),
            ("qru", &self.qru),
            ("qrd", &self.qrd),
        ]
    }
}

/// Simple dispatchable device: a producer or consumer with unit commitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub uid: String,
    pub bus: BusId,
    pub kind: DeviceKind,
    /// On/off state before the first interval
    pub on_status_0: i64,
    /// Accumulated uptime before the first interval
    pub up_time_0: f64,
    /// Accumulated downtime before the first interval
    pub down_time_0: f64,
    pub min_up_time: f64,
    pub min_down_time: f64,
    /// Cost per unit time while on
    pub on_cost: f64,
    pub startup_cost: f64,
    pub shutdown_cost: f64,
    /// Per-interval lower bound on the on/off state (must-run)
    pub on_status_min: Vec<i64>,
    /// Per-interval upper bound on the on/off state (outage)
    pub on_status_max: Vec<i64>,
    #[serde(default)]
    pub startup_states: Vec<StartupState>,
    #[serde(default)]
    pub startup_windows: Vec<StartupWindow>,
    /// Per-interval ordered cost blocks
    pub energy_blocks: Vec<Vec<CostBlock>>,
    pub reserve_prices: ReservePrices,
}

impl Device {
    pub fn is_producer(&self) -> bool {
        self.kind == DeviceKind::Producer
    }

    pub fn is_consumer(&self) -> bool {
        self.kind == DeviceKind::Consumer
    }
}

/// AC branch data shared by lines and transformers (π-equivalent model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcBranch {
    pub uid: String,
    pub fr_bus: BusId,
    pub to_bus: BusId,
    /// Series resistance
    pub r: f64,
    /// Series reactance
    pub x: f64,
    /// Total charging susceptance, split half to each terminal
    #[serde(default)]
    pub b_ch: f64,
    #[serde(default)]
    pub g_fr: f64,
    #[serde(default)]
    pub b_fr: f64,
    #[serde(default)]
    pub g_to: f64,
    #[serde(default)]
    pub b_to: f64,
    /// Apparent power rating
    pub s_max: f64,
    #[serde(default)]
    pub startup_cost: f64,
    #[serde(default)]
    pub shutdown_cost: f64,
    /// On/off state before the first interval
    pub on_status_0: i64,
}

impl AcBranch {
    /// Series admittance `g_sr + j b_sr = 1 / (r + j x)`.
    pub fn series_admittance(&self) -> Complex64 {
        Complex64::new(self.r, self.x).inv()
    }
}

pub type AcLine = AcBranch;

/// Phase-shifting, tap-changing transformer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformer {
    #[serde(flatten)]
    pub branch: AcBranch,
    pub tau_min: f64,
    pub tau_max: f64,
    pub phi_min: f64,
    pub phi_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcLine {
    pub uid: String,
    pub fr_bus: BusId,
    pub to_bus: BusId,
    /// Real power limit in either direction
    pub p_max: f64,
    pub q_fr_min: f64,
    pub q_fr_max: f64,
    pub q_to_min: f64,
    pub q_to_max: f64,
}

/// Real power reserve zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveReserveZone {
    pub uid: String,
    pub devices: Vec<DeviceId>,
    /// Regulation up requirement as a fraction of zonal consumer dispatch
    pub sigma_rgu: f64,
    /// Regulation down requirement as a fraction of zonal consumer dispatch
    pub sigma_rgd: f64,
    /// Synchronized reserve requirement as a fraction of the largest producer dispatch
    pub sigma_scr: f64,
    /// Non-synchronized reserve requirement as a fraction of the largest producer dispatch
    pub sigma_nsc: f64,
    pub c_rgu: f64,
    pub c_rgd: f64,
    pub c_scr: f64,
    pub c_nsc: f64,
    pub c_rru: f64,
    pub c_rrd: f64,
    /// Per-interval ramping reserve up requirement
    pub rru_min: Vec<f64>,
    /// Per-interval ramping reserve down requirement
    pub rrd_min: Vec<f64>,
}

/// Reactive power reserve zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactiveReserveZone {
    pub uid: String,
    pub devices: Vec<DeviceId>,
    pub c_qru: f64,
    pub c_qrd: f64,
    pub qru_min: Vec<f64>,
    pub qrd_min: Vec<f64>,
}

/// The element forced out of service by a contingency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Outage {
    AcLine(AcLineId),
    Transformer(TransformerId),
    DcLine(DcLineId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contingency {
    pub uid: String,
    pub outage: Outage,
}

/// Complete, immutable problem description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Problem {
    pub intervals: Intervals,
    pub violation_costs: ViolationCosts,
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub shunts: Vec<Shunt>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub ac_lines: Vec<AcLine>,
    #[serde(default)]
    pub transformers: Vec<Transformer>,
    #[serde(default)]
    pub dc_lines: Vec<DcLine>,
    #[serde(default)]
    pub active_zones: Vec<ActiveReserveZone>,
    #[serde(default)]
    pub reactive_zones: Vec<ReactiveReserveZone>,
    #[serde(default)]
    pub contingencies: Vec<Contingency>,
}

impl Problem {
    pub fn from_json_str(json: &str) -> GridResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> GridResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn num_t(&self) -> usize {
        self.intervals.num_t()
    }

    pub fn durations(&self) -> &[f64] {
        &self.intervals.durations
    }

    /// Check every per-interval vector length and every cross-reference.
    ///
    /// These are the structural preconditions of the evaluator; anything
    /// else (prices, limits, physical plausibility) is evaluated as given.
    pub fn check_structure(&self) -> GridResult<()> {
        let num_t = self.num_t();
        let num_bus = self.buses.len();
        let num_sd = self.devices.len();

        let bus_ref = |what: String, bus: BusId| -> GridResult<()> {
            if bus.value() < num_bus {
                Ok(())
            } else {
                Err(GridError::index(&what, bus.value(), num_bus))
            }
        };
        let per_interval = |what: String, len: usize| -> GridResult<()> {
            if len == num_t {
                Ok(())
            } else {
                Err(GridError::Shape(format!(
                    "{what}: expected {num_t} intervals, found {len}"
                )))
            }
        };

        for (i, sh) in self.shunts.iter().enumerate() {
            bus_ref(format!("shunts[{i}].bus"), sh.bus)?;
        }
        for (i, sd) in self.devices.iter().enumerate() {
            bus_ref(format!("devices[{i}].bus"), sd.bus)?;
            per_interval(format!("devices[{i}].on_status_min"), sd.on_status_min.len())?;
            per_interval(format!("devices[{i}].on_status_max"), sd.on_status_max.len())?;
            per_interval(format!("devices[{i}].energy_blocks"), sd.energy_blocks.len())?;
            for (name, prices) in sd.reserve_prices.named() {
                per_interval(format!("devices[{i}].reserve_prices.{name}"), prices.len())?;
            }
        }
        for (i, acl) in self.ac_lines.iter().enumerate() {
            bus_ref(format!("ac_lines[{i}].fr_bus"), acl.fr_bus)?;
            bus_ref(format!("ac_lines[{i}].to_bus"), acl.to_bus)?;
        }
        for (i, xfr) in self.transformers.iter().enumerate() {
            bus_ref(format!("transformers[{i}].fr_bus"), xfr.branch.fr_bus)?;
            bus_ref(format!("transformers[{i}].to_bus"), xfr.branch.to_bus)?;
        }
        for (i, dcl) in self.dc_lines.iter().enumerate() {
            bus_ref(format!("dc_lines[{i}].fr_bus"), dcl.fr_bus)?;
            bus_ref(format!("dc_lines[{i}].to_bus"), dcl.to_bus)?;
        }
        for (z, zone) in self.active_zones.iter().enumerate() {
            for sd in &zone.devices {
                if sd.value() >= num_sd {
                    return Err(GridError::index(
                        &format!("active_zones[{z}].devices"),
                        sd.value(),
                        num_sd,
                    ));
                }
            }
            per_interval(format!("active_zones[{z}].rru_min"), zone.rru_min.len())?;
            per_interval(format!("active_zones[{z}].rrd_min"), zone.rrd_min.len())?;
        }
        for (z, zone) in self.reactive_zones.iter().enumerate() {
            for sd in &zone.devices {
                if sd.value() >= num_sd {
                    return Err(GridError::index(
                        &format!("reactive_zones[{z}].devices"),
                        sd.value(),
                        num_sd,
                    ));
                }
            }
            per_interval(format!("reactive_zones[{z}].qru_min"), zone.qru_min.len())?;
            per_interval(format!("reactive_zones[{z}].qrd_min"), zone.qrd_min.len())?;
        }
        for (k, ctg) in self.contingencies.iter().enumerate() {
            let (index, len) = match ctg.outage {
                Outage::AcLine(id) => (id.value(), self.ac_lines.len()),
                Outage::Transformer(id) => (id.value(), self.transformers.len()),
                Outage::DcLine(id) => (id.value(), self.dc_lines.len()),
            };
            if index >= len {
                return Err(GridError::index(
                    &format!("contingencies[{k}].outage"),
                    index,
                    len,
                ));
            }
        }
        Ok(())
    }
}
