//! Single-shot matrix construction.
//!
//! A [`MatrixBuilder`] owns the validated working copies of one resolution's
//! gene catalog and expression stream. Each `build()` call recomputes the
//! full pipeline from those pristine copies: restriction (gene list or
//! region), cell discovery, then assembly. All failures surface during the
//! restriction/validation/indexing passes, so a caller never receives a
//! partially assembled matrix.

use crate::core::error::Result;
use crate::core::sparse::{CountMatrix, DenseCounts};
use crate::gef2mtx::assembler::MatrixAssembler;
use crate::gef2mtx::catalog::{GeneRun, GeneRunTable};
use crate::gef2mtx::container::{GefContainer, SpotRecord};
use crate::gef2mtx::filter::{restrict_to_genes, restrict_to_region, Region};
use crate::gef2mtx::indexer::{unpack_spatial_key, CellIndexer};
use log::{info, warn};
use nalgebra_sparse::CsrMatrix;
use std::borrow::Cow;

/// What one build call should restrict to.
///
/// The two restriction modes are mutually exclusive. Supplying both is
/// accepted for compatibility, but only the gene list is honored and the
/// region is ignored; the conflict is logged rather than silently resolved.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub genes: Option<Vec<String>>,
    pub region: Option<Region>,
}

impl BuildRequest {
    /// Build the full matrix with no restriction.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn with_genes(genes: Vec<String>) -> Self {
        Self {
            genes: Some(genes),
            region: None,
        }
    }

    pub fn with_region(region: Region) -> Self {
        Self {
            genes: None,
            region: Some(region),
        }
    }
}

/// Owner of the working copies for one resolution.
pub struct MatrixBuilder {
    table: GeneRunTable,
    records: Vec<SpotRecord>,
    bin_size: u32,
}

impl MatrixBuilder {
    /// Read one resolution from a container and validate the catalog against
    /// the expression stream.
    pub fn from_container(container: &GefContainer, bin_size: u32) -> Result<Self> {
        let (runs, records) = container.read_slice(bin_size)?;
        Self::from_parts(runs, records, bin_size)
    }

    /// Assemble a builder from decoded parts; validates the catalog.
    pub fn from_parts(runs: Vec<GeneRun>, records: Vec<SpotRecord>, bin_size: u32) -> Result<Self> {
        let table = GeneRunTable::new(runs, records.len())?;
        Ok(Self {
            table,
            records,
            bin_size,
        })
    }

    pub fn bin_size(&self) -> u32 {
        self.bin_size
    }

    pub fn gene_num(&self) -> usize {
        self.table.len()
    }

    pub fn record_num(&self) -> usize {
        self.records.len()
    }

    /// Run the full pipeline for one request and hand the caller an owned,
    /// immutable result. An empty selection is a valid zero-shaped matrix,
    /// not an error.
    pub fn build(&self, request: &BuildRequest) -> Result<ExpressionMatrix> {
        let (records, genes, gene_index_per_record): (Cow<'_, [SpotRecord]>, _, _) =
            match (&request.genes, &request.region) {
                (Some(gene_list), region) => {
                    if region.is_some() {
                        warn!(
                            "both a gene list and a region were supplied; \
                             honoring the gene list and ignoring the region"
                        );
                    }
                    let restriction = restrict_to_genes(&self.table, &self.records, gene_list)?;
                    (
                        Cow::Owned(restriction.records),
                        restriction.genes,
                        restriction.gene_index_per_record,
                    )
                }
                (None, Some(region)) => {
                    let restriction = restrict_to_region(
                        &self.records,
                        &self.table.expand(),
                        &self.table.gene_names(),
                        region,
                    );
                    (
                        Cow::Owned(restriction.records),
                        restriction.genes,
                        restriction.gene_index_per_record,
                    )
                }
                (None, None) => (
                    Cow::Borrowed(self.records.as_slice()),
                    self.table.gene_names(),
                    self.table.expand(),
                ),
            };

        let (cells, cell_index_per_record) = CellIndexer::index(&records)?;
        let counts: Vec<u32> = records.iter().map(|record| record.count).collect();
        let matrix = MatrixAssembler::assemble(
            &cell_index_per_record,
            &gene_index_per_record,
            &counts,
            cells.len(),
            genes.len(),
        )?;

        info!(
            "the matrix has {} cells and {} genes ({} stored entries)",
            cells.len(),
            genes.len(),
            matrix.nnz()
        );

        Ok(ExpressionMatrix {
            bin_size: self.bin_size,
            cells,
            genes,
            counts: matrix,
        })
    }
}

/// An assembled cell-by-gene matrix with its row and column catalogs.
///
/// Fully owned by the caller; the builder retains no reference into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix {
    bin_size: u32,
    cells: Vec<u64>,
    genes: Vec<String>,
    counts: CountMatrix,
}

impl ExpressionMatrix {
    pub fn bin_size(&self) -> u32 {
        self.bin_size
    }

    pub fn cell_num(&self) -> usize {
        self.cells.len()
    }

    pub fn gene_num(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Packed spatial keys in row order.
    pub fn cell_keys(&self) -> &[u64] {
        &self.cells
    }

    /// Decimal renderings of the packed keys, the cell identifiers exposed
    /// to downstream consumers.
    pub fn cell_names(&self) -> Vec<String> {
        self.cells.iter().map(|key| key.to_string()).collect()
    }

    /// Unpacked (x, y) per cell, in row order.
    pub fn positions(&self) -> Vec<(u32, u32)> {
        self.cells.iter().map(|&key| unpack_spatial_key(key)).collect()
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn counts(&self) -> &CountMatrix {
        &self.counts
    }

    /// Export to `nalgebra_sparse` CSR; duplicate entries sum on conversion.
    pub fn to_csr(&self) -> Result<CsrMatrix<u32>> {
        self.counts.to_csr()
    }

    /// Materialize the dense matrix. Explicit escape hatch only.
    pub fn densify(&self) -> DenseCounts {
        self.counts.densify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gef2mtx::indexer::pack_spatial_key;

    fn builder() -> MatrixBuilder {
        MatrixBuilder::from_parts(
            vec![GeneRun::new("g1", 0, 2), GeneRun::new("g2", 2, 1)],
            vec![
                SpotRecord { x: 0, y: 0, count: 5 },
                SpotRecord { x: 0, y: 0, count: 3 },
                SpotRecord { x: 1, y: 1, count: 7 },
            ],
            100,
        )
        .unwrap()
    }

    #[test]
    fn full_build_assembles_both_catalogs_and_all_entries() {
        let matrix = builder().build(&BuildRequest::full()).unwrap();

        assert_eq!(matrix.cell_num(), 2);
        assert_eq!(
            matrix.cell_keys(),
            &[
                pack_spatial_key(0, 0).unwrap(),
                pack_spatial_key(1, 1).unwrap(),
            ]
        );
        assert_eq!(matrix.genes(), &["g1".to_string(), "g2".to_string()]);
        assert_eq!(matrix.positions(), vec![(0, 0), (1, 1)]);

        // The two (0, 0) records of g1 stay distinct entries in one row/col.
        let counts = matrix.counts();
        assert_eq!(counts.nnz(), 3);
        assert_eq!(counts.row(0), (&[0u32, 0][..], &[5u32, 3][..]));
        assert_eq!(counts.row(1), (&[1u32][..], &[7u32][..]));
    }

    #[test]
    fn region_build_restricts_cells_and_genes() {
        let matrix = builder()
            .build(&BuildRequest::with_region(Region::new(0, 0, 0, 0)))
            .unwrap();

        assert_eq!(matrix.cell_num(), 1);
        assert_eq!(matrix.genes(), &["g1".to_string()]);
        let counts = matrix.counts();
        assert_eq!(counts.nnz(), 2);
        assert_eq!(counts.row(0), (&[0u32, 0][..], &[5u32, 3][..]));
    }

    #[test]
    fn gene_build_follows_requested_order() {
        let matrix = builder()
            .build(&BuildRequest::with_genes(vec![
                "g2".to_string(),
                "g1".to_string(),
            ]))
            .unwrap();

        assert_eq!(matrix.genes(), &["g2".to_string(), "g1".to_string()]);
        // g2's record is emitted first, so its cell (1, 1) takes row 0.
        assert_eq!(
            matrix.cell_keys(),
            &[
                pack_spatial_key(1, 1).unwrap(),
                pack_spatial_key(0, 0).unwrap(),
            ]
        );
        let counts = matrix.counts();
        assert_eq!(counts.row(0), (&[0u32][..], &[7u32][..]));
        assert_eq!(counts.row(1), (&[1u32, 1][..], &[5u32, 3][..]));
    }

    #[test]
    fn gene_list_wins_when_both_restrictions_are_supplied() {
        let request = BuildRequest {
            genes: Some(vec!["g2".to_string()]),
            region: Some(Region::new(0, 0, 0, 0)),
        };
        let matrix = builder().build(&request).unwrap();

        // The region would have kept only (0, 0); the gene path keeps (1, 1).
        assert_eq!(matrix.genes(), &["g2".to_string()]);
        assert_eq!(matrix.cell_keys(), &[pack_spatial_key(1, 1).unwrap()]);
    }

    #[test]
    fn empty_region_yields_a_valid_empty_matrix() {
        let matrix = builder()
            .build(&BuildRequest::with_region(Region::new(9, 9, 9, 9)))
            .unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.cell_num(), 0);
        assert_eq!(matrix.gene_num(), 0);
        assert_eq!(matrix.counts().nnz(), 0);
    }

    #[test]
    fn rebuilding_from_identical_inputs_is_idempotent() {
        let builder = builder();
        let first = builder.build(&BuildRequest::full()).unwrap();
        let second = builder.build(&BuildRequest::full()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn coordinate_overflow_fails_before_assembly() {
        let builder = MatrixBuilder::from_parts(
            vec![GeneRun::new("g1", 0, 1)],
            vec![SpotRecord {
                x: u32::MAX as u64 + 1,
                y: 0,
                count: 1,
            }],
            100,
        )
        .unwrap();
        let err = builder.build(&BuildRequest::full()).unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::StereoError::CoordinateOverflow { .. }
        ));
    }

    #[test]
    fn malformed_catalog_is_rejected_at_construction() {
        let err = MatrixBuilder::from_parts(
            vec![GeneRun::new("g1", 0, 2)],
            vec![SpotRecord { x: 0, y: 0, count: 1 }],
            100,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::StereoError::MalformedCatalog(_)
        ));
    }
}
