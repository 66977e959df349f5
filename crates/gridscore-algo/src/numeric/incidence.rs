//! Sparse group-to-entity incidence aggregation.
//!
//! An incidence matrix `A` has one row per group (bus, reserve zone) and one
//! column per entity (device, shunt, branch terminal). Aggregating a
//! per-entity trajectory `X` of shape `(num_entity, num_t)` gives a per-group
//! trajectory of shape `(num_group, num_t)`:
//!
//! ```text
//! sum:  Y[g, t] += Σ_e A[g, e] · X[e, t]
//! max:  Y[g, t]  = max(Y[g, t], max_{e : A[g, e] ≠ 0} A[g, e] · X[e, t])
//! ```
//!
//! The matrices are assembled once from triplets and stored in CSR form, so
//! each aggregation walks only the non-zeros of each group row.

use gridscore_core::{GridError, GridResult, TimeMatrix};
use sprs::{CsMat, TriMat};

#[derive(Debug, Clone)]
pub struct Incidence {
    matrix: CsMat<f64>,
}

impl Incidence {
    /// Assemble from `(group, entity, coefficient)` triplets. Duplicates add up.
    pub fn from_triplets(
        num_groups: usize,
        num_entities: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut triplets = TriMat::new((num_groups, num_entities));
        for (g, e, v) in entries {
            triplets.add_triplet(g, e, v);
        }
        Self {
            matrix: triplets.to_csr(),
        }
    }

    /// One coefficient per entity, placing entity `e` in group `groups[e]`.
    pub fn from_assignment(num_groups: usize, groups: &[usize], coefficients: &[f64]) -> Self {
        Self::from_triplets(
            num_groups,
            groups.len(),
            groups
                .iter()
                .zip(coefficients)
                .enumerate()
                .map(|(e, (&g, &c))| (g, e, c)),
        )
    }

    /// Unit coefficients from per-group member lists.
    pub fn from_members(num_entities: usize, members: &[Vec<usize>]) -> Self {
        Self::from_triplets(
            members.len(),
            num_entities,
            members
                .iter()
                .enumerate()
                .flat_map(|(g, list)| list.iter().map(move |&e| (g, e, 1.0))),
        )
    }

    pub fn num_groups(&self) -> usize {
        self.matrix.rows()
    }

    pub fn num_entities(&self) -> usize {
        self.matrix.cols()
    }

    /// Number of non-zero entries in a group row.
    pub fn group_size(&self, group: usize) -> usize {
        self.matrix
            .outer_view(group)
            .map(|row| row.nnz())
            .unwrap_or(0)
    }

    fn check(&self, per_entity: &TimeMatrix<f64>, into: &TimeMatrix<f64>) -> GridResult<()> {
        let num_t = into.cols();
        per_entity.ensure_shape("incidence operand", self.num_entities(), num_t)?;
        if into.rows() != self.num_groups() {
            return Err(GridError::shape(
                "incidence accumulator",
                (self.num_groups(), num_t),
                into.shape(),
            ));
        }
        Ok(())
    }

    /// `into += A · per_entity`.
    pub fn aggregate_sum(
        &self,
        per_entity: &TimeMatrix<f64>,
        into: &mut TimeMatrix<f64>,
    ) -> GridResult<()> {
        self.check(per_entity, into)?;
        for (g, row) in self.matrix.outer_iterator().enumerate() {
            let acc = into.row_mut(g);
            for (e, &coef) in row.iter() {
                for (slot, v) in acc.iter_mut().zip(per_entity.row(e)) {
                    *slot += coef * v;
                }
            }
        }
        Ok(())
    }

    /// `into[g, t] = max(into[g, t], max over members of coef · x)`.
    ///
    /// Groups without members leave `into` untouched.
    pub fn aggregate_max(
        &self,
        per_entity: &TimeMatrix<f64>,
        into: &mut TimeMatrix<f64>,
    ) -> GridResult<()> {
        self.check(per_entity, into)?;
        for (g, row) in self.matrix.outer_iterator().enumerate() {
            let acc = into.row_mut(g);
            for (e, &coef) in row.iter() {
                for (slot, v) in acc.iter_mut().zip(per_entity.row(e)) {
                    *slot = slot.max(coef * v);
                }
            }
        }
        Ok(())
    }
}
