//! Candidate operating plan, one row per entity and one column per interval.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GridResult;
use crate::model::Problem;
use crate::series::TimeMatrix;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSolution {
    /// Voltage magnitude
    pub v: TimeMatrix<f64>,
    /// Voltage angle (radians)
    pub theta: TimeMatrix<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShuntSolution {
    /// Number of energized steps
    pub u_st: TimeMatrix<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSolution {
    pub on_status: TimeMatrix<i64>,
    pub p_on: TimeMatrix<f64>,
    pub q: TimeMatrix<f64>,
    pub p_rgu: TimeMatrix<f64>,
    pub p_rgd: TimeMatrix<f64>,
    pub p_scr: TimeMatrix<f64>,
    pub p_nsc: TimeMatrix<f64>,
    pub p_rru_on: TimeMatrix<f64>,
    pub p_rrd_on: TimeMatrix<f64>,
    pub p_rru_off: TimeMatrix<f64>,
    pub p_rrd_off: TimeMatrix<f64>,
    pub q_qru: TimeMatrix<f64>,
    pub q_qrd: TimeMatrix<f64>,
}

impl DeviceSolution {
    /// All-zero trajectories (devices off, nothing dispatched).
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let z = TimeMatrix::zeros(rows, cols);
        Self {
            on_status: TimeMatrix::zeros(rows, cols),
            p_on: z.clone(),
            q: z.clone(),
            p_rgu: z.clone(),
            p_rgd: z.clone(),
            p_scr: z.clone(),
            p_nsc: z.clone(),
            p_rru_on: z.clone(),
            p_rrd_on: z.clone(),
            p_rru_off: z.clone(),
            p_rrd_off: z.clone(),
            q_qru: z.clone(),
            q_qrd: z,
        }
    }

    fn real_fields_mut(&mut self) -> [(&'static str, &mut TimeMatrix<f64>); 12] {
        [
            ("p_on", &mut self.p_on),
            ("q", &mut self.q),
            ("p_rgu", &mut self.p_rgu),
            ("p_rgd", &mut self.p_rgd),
            ("p_scr", &mut self.p_scr),
            ("p_nsc", &mut self.p_nsc),
            ("p_rru_on", &mut self.p_rru_on),
            ("p_rrd_on", &mut self.p_rrd_on),
            ("p_rru_off", &mut self.p_rru_off),
            ("p_rrd_off", &mut self.p_rrd_off),
            ("q_qru", &mut self.q_qru),
            ("q_qrd", &mut self.q_qrd),
        ]
    }

    fn real_fields(&self) -> [(&'static str, &TimeMatrix<f64>); 12] {
        [
            ("p_on", &self.p_on),
            ("q", &self.q),
            ("p_rgu", &self.p_rgu),
            ("p_rgd", &self.p_rgd),
            ("p_scr", &self.p_scr),
            ("p_nsc", &self.p_nsc),
            ("p_rru_on", &self.p_rru_on),
            ("p_rrd_on", &self.p_rrd_on),
            ("p_rru_off", &self.p_rru_off),
            ("p_rrd_off", &self.p_rrd_off),
            ("q_qru", &self.q_qru),
            ("q_qrd", &self.q_qrd),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcLineSolution {
    pub on_status: TimeMatrix<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerSolution {
    pub on_status: TimeMatrix<i64>,
    /// Off-nominal tap ratio
    pub tau: TimeMatrix<f64>,
    /// Phase shift (radians)
    pub phi: TimeMatrix<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcLineSolution {
    /// Real power from the from bus towards the to bus
    pub p: TimeMatrix<f64>,
    pub q_fr: TimeMatrix<f64>,
    pub q_to: TimeMatrix<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub bus: BusSolution,
    pub shunt: ShuntSolution,
    pub device: DeviceSolution,
    pub ac_line: AcLineSolution,
    pub transformer: TransformerSolution,
    pub dc_line: DcLineSolution,
}

impl Solution {
    /// Parse a solution and give empty tables the horizon's column count.
    pub fn from_json_str(json: &str, num_t: usize) -> GridResult<Self> {
        let mut solution: Solution = serde_json::from_str(json)?;
        solution.conform_empty(num_t);
        Ok(solution)
    }

    pub fn load(path: impl AsRef<Path>, num_t: usize) -> GridResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents, num_t)
    }

    /// `[]` deserializes as a `0x0` matrix; an entity table with no rows
    /// still spans the whole horizon.
    pub fn conform_empty(&mut self, num_t: usize) {
        self.bus.v.conform_empty(num_t);
        self.bus.theta.conform_empty(num_t);
        self.shunt.u_st.conform_empty(num_t);
        self.device.on_status.conform_empty(num_t);
        for (_, m) in self.device.real_fields_mut() {
            m.conform_empty(num_t);
        }
        self.ac_line.on_status.conform_empty(num_t);
        self.transformer.on_status.conform_empty(num_t);
        self.transformer.tau.conform_empty(num_t);
        self.transformer.phi.conform_empty(num_t);
        self.dc_line.p.conform_empty(num_t);
        self.dc_line.q_fr.conform_empty(num_t);
        self.dc_line.q_to.conform_empty(num_t);
    }

    /// Verify every matrix against the problem's entity counts and horizon.
    pub fn check_shapes(&self, problem: &Problem) -> GridResult<()> {
        let num_t = problem.num_t();
        let num_bus = problem.buses.len();
        let num_sh = problem.shunts.len();
        let num_sd = problem.devices.len();
        let num_acl = problem.ac_lines.len();
        let num_xfr = problem.transformers.len();
        let num_dcl = problem.dc_lines.len();

        self.bus.v.ensure_shape("bus.v", num_bus, num_t)?;
        self.bus.theta.ensure_shape("bus.theta", num_bus, num_t)?;
        self.shunt.u_st.ensure_shape("shunt.u_st", num_sh, num_t)?;
        self.device
            .on_status
            .ensure_shape("device.on_status", num_sd, num_t)?;
        for (name, m) in self.device.real_fields() {
            m.ensure_shape(&format!("device.{name}"), num_sd, num_t)?;
        }
        self.ac_line
            .on_status
            .ensure_shape("ac_line.on_status", num_acl, num_t)?;
        self.transformer
            .on_status
            .ensure_shape("transformer.on_status", num_xfr, num_t)?;
        self.transformer
            .tau
            .ensure_shape("transformer.tau", num_xfr, num_t)?;
        self.transformer
            .phi
            .ensure_shape("transformer.phi", num_xfr, num_t)?;
        self.dc_line.p.ensure_shape("dc_line.p", num_dcl, num_t)?;
        self.dc_line
            .q_fr
            .ensure_shape("dc_line.q_fr", num_dcl, num_t)?;
        self.dc_line
            .q_to
            .ensure_shape("dc_line.q_to", num_dcl, num_t)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;
    use crate::model::{Bus, Intervals};

    fn one_bus_problem(num_t: usize) -> Problem {
        Problem {
            intervals: Intervals {
                durations: vec![1.0; num_t],
            },
            buses: vec![Bus {
                uid: "b0".into(),
                v_min: 0.9,
                v_max: 1.1,
            }],
            ..Problem::default()
        }
    }

    fn empty_json_with_one_bus(num_t: usize) -> String {
        let row = vec![1.0; num_t];
        let empty = "[]";
        let device_fields = [
            "on_status", "p_on", "q", "p_rgu", "p_rgd", "p_scr", "p_nsc", "p_rru_on",
            "p_rrd_on", "p_rru_off", "p_rrd_off", "q_qru", "q_qrd",
        ]
        .iter()
        .map(|f| format!("\"{f}\": {empty}"))
        .collect::<Vec<_>>()
        .join(",");
        format!(
            r#"{{
                "bus": {{"v": [{row:?}], "theta": [{zeros:?}]}},
                "shunt": {{"u_st": []}},
                "device": {{ {device_fields} }},
                "ac_line": {{"on_status": []}},
                "transformer": {{"on_status": [], "tau": [], "phi": []}},
                "dc_line": {{"p": [], "q_fr": [], "q_to": []}}
            }}"#,
            zeros = vec![0.0; num_t]
        )
    }

    #[test]
    fn empty_tables_are_conformed_to_horizon() {
        let problem = one_bus_problem(3);
        let solution = Solution::from_json_str(&empty_json_with_one_bus(3), 3).unwrap();
        assert_eq!(solution.device.p_on.shape(), (0, 3));
        assert_eq!(solution.dc_line.q_to.shape(), (0, 3));
        solution.check_shapes(&problem).unwrap();
    }

    #[test]
    fn wrong_horizon_is_a_shape_error() {
        let problem = one_bus_problem(4);
        let solution = Solution::from_json_str(&empty_json_with_one_bus(3), 4).unwrap();
        let err = solution.check_shapes(&problem).unwrap_err();
        assert!(matches!(err, GridError::Shape(_)));
        assert!(err.to_string().contains("bus.v"));
    }
}
