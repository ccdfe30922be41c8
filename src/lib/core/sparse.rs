//! Compressed-row count storage shared across stereomtx.
//!
//! The primary store keeps duplicate (row, col) entries as distinct nonzeros:
//! two expression records landing on the same (cell, gene) pair stay two
//! entries. `nalgebra_sparse` rejects duplicate column indices inside a CSR
//! row, so it sits at the export seam (`to_csr`), where summing duplicates is
//! the documented conversion semantic.

use crate::core::error::{Result, StereoError};
use itertools::Itertools;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;

/// Sparse cell-by-gene count matrix in compressed-row form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMatrix {
    nrows: usize,
    ncols: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<u32>,
    values: Vec<u32>,
}

/// Dense counterpart produced by the explicit [`CountMatrix::densify`] escape hatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseCounts {
    nrows: usize,
    ncols: usize,
    data: Vec<u32>,
}

impl DenseCounts {
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[row * self.ncols + col]
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }
}

impl CountMatrix {
    /// An all-zero matrix of the requested shape.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_offsets: vec![0; nrows + 1],
            col_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build compressed-row storage from three parallel triplet arrays.
    ///
    /// The construction is a two-pass counting scatter: a row histogram sizes
    /// every buffer up front, then one linear fill places each entry. Input
    /// order is preserved within a row and duplicate (row, col) pairs are kept
    /// as distinct entries.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        rows: &[u32],
        cols: &[u32],
        values: &[u32],
    ) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(StereoError::SparseMatrix(format!(
                "triplet arrays disagree in length: {} rows, {} cols, {} values",
                rows.len(),
                cols.len(),
                values.len()
            )));
        }

        for (&row, &col) in rows.iter().zip(cols) {
            if row as usize >= nrows || col as usize >= ncols {
                return Err(StereoError::InvalidInput(format!(
                    "index ({}, {}) exceeds matrix dimensions ({}, {})",
                    row, col, nrows, ncols
                )));
            }
        }

        let mut row_offsets = vec![0usize; nrows + 1];
        for &row in rows {
            row_offsets[row as usize + 1] += 1;
        }
        for i in 0..nrows {
            row_offsets[i + 1] += row_offsets[i];
        }

        let nnz = rows.len();
        let mut col_indices = vec![0u32; nnz];
        let mut out_values = vec![0u32; nnz];
        let mut cursor = row_offsets.clone();
        for ((&row, &col), &value) in rows.iter().zip(cols).zip(values) {
            let slot = cursor[row as usize];
            col_indices[slot] = col;
            out_values[slot] = value;
            cursor[row as usize] += 1;
        }

        let matrix = Self {
            nrows,
            ncols,
            row_offsets,
            col_indices,
            values: out_values,
        };

        #[cfg(debug_assertions)]
        matrix.flag_duplicate_pairs();

        Ok(matrix)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries, duplicates included.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of one row, in assembly order.
    pub fn row(&self, row: usize) -> (&[u32], &[u32]) {
        let span = self.row_offsets[row]..self.row_offsets[row + 1];
        (&self.col_indices[span.clone()], &self.values[span])
    }

    /// Total count at (row, col); duplicate entries are summed on read.
    pub fn get(&self, row: usize, col: usize) -> u64 {
        let (cols, values) = self.row(row);
        cols.iter()
            .zip(values)
            .filter(|(&c, _)| c as usize == col)
            .map(|(_, &v)| v as u64)
            .sum()
    }

    /// Iterate stored entries as (row, col, value).
    pub fn triplet_iter(&self) -> impl Iterator<Item = (usize, u32, u32)> + '_ {
        (0..self.nrows).flat_map(move |row| {
            let (cols, values) = self.row(row);
            cols.iter()
                .zip(values)
                .map(move |(&col, &value)| (row, col, value))
        })
    }

    /// Per-row totals.
    pub fn row_sums(&self) -> Vec<u64> {
        (0..self.nrows)
            .into_par_iter()
            .map(|row| {
                let (_, values) = self.row(row);
                values.iter().map(|&v| v as u64).sum()
            })
            .collect()
    }

    /// Per-column totals via chunked parallel reduction.
    pub fn col_sums(&self) -> Vec<u64> {
        let ncols = self.ncols;
        if self.nrows == 0 || ncols == 0 {
            return vec![0; ncols];
        }

        let chunk_size = std::cmp::max(1, self.nrows / rayon::current_num_threads());
        (0..self.nrows)
            .into_par_iter()
            .chunks(chunk_size)
            .map(|chunk| {
                let mut local = vec![0u64; ncols];
                for row in chunk {
                    let (cols, values) = self.row(row);
                    for (&col, &value) in cols.iter().zip(values) {
                        local[col as usize] += value as u64;
                    }
                }
                local
            })
            .reduce(
                || vec![0u64; ncols],
                |mut acc, local| {
                    for (slot, value) in acc.iter_mut().zip(local) {
                        *slot += value;
                    }
                    acc
                },
            )
    }

    /// Export to a `nalgebra_sparse` CSR matrix.
    ///
    /// Duplicate (row, col) entries are summed during the COO-to-CSR
    /// conversion; the no-coalescing guarantee applies to this store only.
    pub fn to_csr(&self) -> Result<CsrMatrix<u32>> {
        if self.values.is_empty() {
            return Ok(CsrMatrix::zeros(self.nrows, self.ncols));
        }

        let (rows, cols, values): (Vec<_>, Vec<_>, Vec<_>) = self
            .triplet_iter()
            .map(|(row, col, value)| (row, col as usize, value))
            .multiunzip();

        let coo = CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, values)?;
        Ok(CsrMatrix::from(&coo))
    }

    /// Materialize the full dense matrix. Only on explicit request: the dense
    /// shape can exceed memory by orders of magnitude for genome-wide bins.
    pub fn densify(&self) -> DenseCounts {
        let mut data = vec![0u32; self.nrows * self.ncols];
        for (row, col, value) in self.triplet_iter() {
            let slot = &mut data[row * self.ncols + col as usize];
            *slot = slot.saturating_add(value);
        }
        DenseCounts {
            nrows: self.nrows,
            ncols: self.ncols,
            data,
        }
    }

    /// Density, stored entries, and logical element count.
    pub fn density_stats(&self) -> (f64, usize, usize) {
        let total = self.nrows * self.ncols;
        let density = if total > 0 {
            self.nnz() as f64 / total as f64
        } else {
            0.0
        };
        (density, self.nnz(), total)
    }

    /// Debug-build invariant flag: callers guarantee (row, col) uniqueness
    /// upstream, but the mandated duplicate-preserving scenarios stay valid,
    /// so violations are reported through the log channel rather than asserted.
    #[cfg(debug_assertions)]
    fn flag_duplicate_pairs(&self) {
        let mut duplicates = 0usize;
        let mut scratch: Vec<u32> = Vec::new();
        for row in 0..self.nrows {
            let (cols, _) = self.row(row);
            scratch.clear();
            scratch.extend_from_slice(cols);
            scratch.sort_unstable();
            duplicates += scratch.windows(2).filter(|w| w[0] == w[1]).count();
        }
        if duplicates > 0 {
            log::warn!(
                "count matrix retains {} duplicate (row, col) pairs without coalescing",
                duplicates
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CountMatrix {
        // 2x3: (0,0)=5, (0,2)=1, (1,1)=7
        CountMatrix::from_triplets(2, 3, &[0, 0, 1], &[0, 2, 1], &[5, 1, 7]).unwrap()
    }

    #[test]
    fn builds_compressed_rows_from_triplets() {
        let matrix = sample();
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 3);
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.row(0), (&[0u32, 2][..], &[5u32, 1][..]));
        assert_eq!(matrix.row(1), (&[1u32][..], &[7u32][..]));
        assert_eq!(matrix.get(0, 2), 1);
        assert_eq!(matrix.get(1, 0), 0);
    }

    #[test]
    fn preserves_duplicate_entries() {
        let matrix =
            CountMatrix::from_triplets(1, 1, &[0, 0], &[0, 0], &[5, 3]).unwrap();
        assert_eq!(matrix.nnz(), 2);
        assert_eq!(matrix.row(0), (&[0u32, 0][..], &[5u32, 3][..]));
        assert_eq!(matrix.get(0, 0), 8);
    }

    #[test]
    fn rejects_out_of_bounds_indices() {
        let err = CountMatrix::from_triplets(2, 2, &[0, 2], &[0, 0], &[1, 1]).unwrap_err();
        assert!(matches!(err, StereoError::InvalidInput(_)));
    }

    #[test]
    fn rejects_mismatched_triplet_arrays() {
        let err = CountMatrix::from_triplets(2, 2, &[0, 1], &[0], &[1, 1]).unwrap_err();
        assert!(matches!(err, StereoError::SparseMatrix(_)));
    }

    #[test]
    fn empty_selection_yields_zero_shaped_matrix() {
        let matrix = CountMatrix::from_triplets(0, 0, &[], &[], &[]).unwrap();
        assert_eq!(matrix.nnz(), 0);
        assert_eq!((matrix.nrows(), matrix.ncols()), (0, 0));

        let shaped = CountMatrix::from_triplets(3, 4, &[], &[], &[]).unwrap();
        assert_eq!(shaped.nnz(), 0);
        assert_eq!(shaped.row(2), (&[][..], &[][..]));
    }

    #[test]
    fn csr_export_coalesces_duplicates() {
        let matrix =
            CountMatrix::from_triplets(2, 2, &[0, 0, 1], &[0, 0, 1], &[5, 3, 7]).unwrap();
        let csr = matrix.to_csr().unwrap();
        let entries: Vec<(usize, usize, u32)> = CooMatrix::from(&csr)
            .triplet_iter()
            .map(|(r, c, &v)| (r, c, v))
            .collect();
        assert_eq!(entries, vec![(0, 0, 8), (1, 1, 7)]);
    }

    #[test]
    fn densify_scatter_adds_duplicates() {
        let matrix =
            CountMatrix::from_triplets(2, 2, &[0, 0, 1], &[0, 0, 1], &[5, 3, 7]).unwrap();
        let dense = matrix.densify();
        assert_eq!(dense.shape(), (2, 2));
        assert_eq!(dense.get(0, 0), 8);
        assert_eq!(dense.get(0, 1), 0);
        assert_eq!(dense.get(1, 1), 7);
        assert_eq!(dense.as_slice(), &[8, 0, 0, 7]);
    }

    #[test]
    fn row_and_col_sums_agree_with_total() {
        let matrix = sample();
        assert_eq!(matrix.row_sums(), vec![6, 7]);
        assert_eq!(matrix.col_sums(), vec![5, 7, 1]);
        assert_eq!(
            matrix.row_sums().iter().sum::<u64>(),
            matrix.col_sums().iter().sum::<u64>()
        );
    }
}
