//! Final sparse assembly from parallel index arrays.

use crate::core::error::{Result, StereoError};
use crate::core::sparse::CountMatrix;

/// Combines per-record (cell index, gene index, count) triples into the
/// compressed-row count matrix.
pub struct MatrixAssembler;

impl MatrixAssembler {
    /// Assemble a matrix of shape exactly (cell_num, gene_num) from the three
    /// parallel arrays. Every input triple is represented; duplicate
    /// (cell, gene) pairs are stored as distinct entries, never summed here.
    /// No dense intermediate is ever built.
    pub fn assemble(
        cell_index_per_record: &[u32],
        gene_index_per_record: &[u32],
        counts: &[u32],
        cell_num: usize,
        gene_num: usize,
    ) -> Result<CountMatrix> {
        if cell_index_per_record.len() != gene_index_per_record.len()
            || cell_index_per_record.len() != counts.len()
        {
            return Err(StereoError::InvalidInput(format!(
                "assembly arrays disagree in length: {} cells, {} genes, {} counts",
                cell_index_per_record.len(),
                gene_index_per_record.len(),
                counts.len()
            )));
        }

        CountMatrix::from_triplets(
            cell_num,
            gene_num,
            cell_index_per_record,
            gene_index_per_record,
            counts,
        )
    }
}
