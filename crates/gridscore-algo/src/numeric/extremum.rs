//! Extremum-with-location extraction.
//!
//! Every violation the evaluator reports is the largest (or smallest) entry
//! of some derived array together with where it occurred:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `val` | the extreme value (≤ 0 means no violation) |
//! | `abs` | its absolute value |
//! | `idx` | location as external labels, e.g. `["gen_3", 7]` |
//! | `idx_lin` | row-major linear index, `None` for records built by hand |
//! | `idx_int` | raw integer position per axis |
//!
//! Ties go to the lowest linear index. The first NaN beats every number, so a
//! degenerate entry is reported rather than hidden. An empty array has no
//! extremum.

use gridscore_core::TimeMatrix;
use serde::Serialize;

/// External label for one axis position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Label {
    Uid(String),
    Index(usize),
}

impl Label {
    pub fn uids<'a>(uids: impl IntoIterator<Item = &'a str>) -> Vec<Label> {
        uids.into_iter().map(|u| Label::Uid(u.to_string())).collect()
    }

    pub fn indices(n: usize) -> Vec<Label> {
        (0..n).map(Label::Index).collect()
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Uid(uid) => write!(f, "{uid}"),
            Label::Index(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremum {
    pub val: f64,
    pub abs: f64,
    pub idx: Vec<Label>,
    pub idx_lin: Option<usize>,
    pub idx_int: Vec<usize>,
}

impl Extremum {
    /// A hand-built record with no linear index.
    pub fn at(val: f64, idx: Vec<Label>, idx_int: Vec<usize>) -> Self {
        Self {
            val,
            abs: val.abs(),
            idx,
            idx_lin: None,
            idx_int,
        }
    }

    /// Strictly positive severity, or NaN.
    pub fn is_violation(&self) -> bool {
        self.val > 0.0 || self.val.is_nan()
    }

    /// Location rendered as `label, label`.
    pub fn location(&self) -> String {
        self.idx
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// First NaN, otherwise the first position whose value beats every earlier
/// one under `better`.
fn locate(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    if let Some(i) = values.iter().position(|v| v.is_nan()) {
        return Some(i);
    }
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if !better(v, values[b]) => {}
            _ => best = Some(i),
        }
    }
    best
}

fn matrix_extremum(
    matrix: &TimeMatrix<f64>,
    row_labels: &[Label],
    col_labels: &[Label],
    better: impl Fn(f64, f64) -> bool,
) -> Option<Extremum> {
    let lin = locate(matrix.as_slice(), better)?;
    let cols = matrix.cols();
    let (i, t) = (lin / cols, lin % cols);
    let val = matrix.as_slice()[lin];
    Some(Extremum {
        val,
        abs: val.abs(),
        idx: vec![row_labels[i].clone(), col_labels[t].clone()],
        idx_lin: Some(lin),
        idx_int: vec![i, t],
    })
}

/// Largest entry of a `(num_entity, num_t)` array with its location.
pub fn max_with_location(
    matrix: &TimeMatrix<f64>,
    row_labels: &[Label],
    col_labels: &[Label],
) -> Option<Extremum> {
    matrix_extremum(matrix, row_labels, col_labels, |a, b| a > b)
}

/// Smallest entry of a `(num_entity, num_t)` array with its location.
pub fn min_with_location(
    matrix: &TimeMatrix<f64>,
    row_labels: &[Label],
    col_labels: &[Label],
) -> Option<Extremum> {
    matrix_extremum(matrix, row_labels, col_labels, |a, b| a < b)
}

fn series_extremum(
    values: &[f64],
    labels: &[Label],
    better: impl Fn(f64, f64) -> bool,
) -> Option<Extremum> {
    let i = locate(values, better)?;
    Some(Extremum {
        val: values[i],
        abs: values[i].abs(),
        idx: vec![labels[i].clone()],
        idx_lin: Some(i),
        idx_int: vec![i],
    })
}

/// Largest entry of a 1-D array.
pub fn max_of_series(values: &[f64], labels: &[Label]) -> Option<Extremum> {
    series_extremum(values, labels, |a, b| a > b)
}

/// Smallest entry of a 1-D array.
pub fn min_of_series(values: &[f64], labels: &[Label]) -> Option<Extremum> {
    series_extremum(values, labels, |a, b| a < b)
}
