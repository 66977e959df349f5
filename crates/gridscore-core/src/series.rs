//! Dense per-entity, per-interval matrices.
//!
//! Every solution field and every derived array in an evaluation has shape
//! `(num_entity, num_t)`: one row per bus/device/branch in problem order, one
//! column per time interval. [`TimeMatrix`] stores them row-major and
//! serializes as a JSON list of rows.

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{GridError, GridResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TimeMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> TimeMatrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }
}

impl<T: Copy> TimeMatrix<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Build a matrix by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for t in 0..cols {
                data.push(f(i, t));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    pub fn column(&self, col: usize) -> Vec<T> {
        (0..self.rows).map(|i| self.get(i, col)).collect()
    }

    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> TimeMatrix<U> {
        TimeMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Elementwise combination of two matrices of the same shape.
    pub fn zip_map<U: Copy, V: Copy>(
        &self,
        other: &TimeMatrix<U>,
        f: impl Fn(T, U) -> V,
    ) -> TimeMatrix<V> {
        debug_assert_eq!(self.shape(), other.shape());
        TimeMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Like [`TimeMatrix::map`] but with the `(row, col)` position available.
    pub fn map_indexed<U: Copy>(&self, f: impl Fn(usize, usize, T) -> U) -> TimeMatrix<U> {
        TimeMatrix::from_fn(self.rows, self.cols, |i, t| f(i, t, self.get(i, t)))
    }
}

impl<T> TimeMatrix<T> {
    /// Build from a list of rows. Ragged input is a shape error.
    pub fn from_rows(rows: Vec<Vec<T>>) -> GridResult<Self> {
        let num_rows = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(num_rows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Shape(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            rows: num_rows,
            cols,
            data,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Row-major view of all cells.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Check the shape against `(rows, cols)`, naming the field on failure.
    pub fn ensure_shape(&self, what: &str, rows: usize, cols: usize) -> GridResult<()> {
        if self.shape() == (rows, cols) {
            Ok(())
        } else {
            Err(GridError::shape(what, (rows, cols), self.shape()))
        }
    }

    /// An empty matrix deserializes as `0x0`; give it the horizon's column count.
    pub fn conform_empty(&mut self, cols: usize) {
        if self.rows == 0 {
            self.cols = cols;
        }
    }
}

impl TimeMatrix<f64> {
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Per-interval totals over all entities.
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for row in self.data.chunks(self.cols.max(1)) {
            for (acc, v) in sums.iter_mut().zip(row) {
                *acc += v;
            }
        }
        sums
    }

    /// Multiply column `t` by `weights[t]`, e.g. interval durations.
    pub fn scale_columns(&self, weights: &[f64]) -> TimeMatrix<f64> {
        self.map_indexed(|_, t, v| v * weights[t])
    }

    /// Multiply row `i` by `weights[i]`, e.g. per-entity prices.
    pub fn scale_rows(&self, weights: &[f64]) -> TimeMatrix<f64> {
        self.map_indexed(|i, _, v| v * weights[i])
    }
}

impl TimeMatrix<i64> {
    pub fn to_f64(&self) -> TimeMatrix<f64> {
        self.map(|v| v as f64)
    }

    pub fn sum(&self) -> i64 {
        self.data.iter().sum()
    }
}

impl<T: Serialize> Serialize for TimeMatrix<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows))?;
        for i in 0..self.rows {
            seq.serialize_element(self.row(i))?;
        }
        seq.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for TimeMatrix<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<T>>::deserialize(deserializer)?;
        TimeMatrix::from_rows(rows).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_is_row_major() {
        let m = TimeMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.column(2), vec![3.0, 6.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = TimeMatrix::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, GridError::Shape(_)));
    }

    #[test]
    fn column_sums_and_scaling() {
        let m = TimeMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.column_sums(), vec![4.0, 6.0]);
        let scaled = m.scale_columns(&[0.5, 2.0]);
        assert_eq!(scaled.as_slice(), &[0.5, 4.0, 1.5, 8.0]);
        let scaled = m.scale_rows(&[10.0, 0.0]);
        assert_eq!(scaled.as_slice(), &[10.0, 20.0, 0.0, 0.0]);
        assert!((m.sum() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn column_sums_of_empty_matrix_keep_horizon() {
        let m: TimeMatrix<f64> = TimeMatrix::zeros(0, 3);
        assert_eq!(m.column_sums(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn json_round_trip_as_rows() {
        let m = TimeMatrix::from_rows(vec![vec![1_i64, 0], vec![0, 1]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[1,0],[0,1]]");
        let back: TimeMatrix<i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn conform_empty_sets_columns() {
        let mut m: TimeMatrix<f64> = serde_json::from_str("[]").unwrap();
        assert_eq!(m.shape(), (0, 0));
        m.conform_empty(4);
        assert_eq!(m.shape(), (0, 4));
        assert!(m.ensure_shape("dc_line.p", 0, 4).is_ok());
    }
}
