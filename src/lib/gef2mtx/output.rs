//! On-disk artifacts for an assembled matrix.
//!
//! The layout follows the triplet-matrix convention common to single-cell
//! tooling: a Matrix Market coordinate file plus gzipped row/column catalogs,
//! and a one-row TSV build summary.

use crate::core::fs::{is_gzipped, make_parent_dirs};
use crate::core::io::{get_raw_writer, get_writer};
use crate::gef2mtx::builder::ExpressionMatrix;
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const MATRIX_FILE: &str = "matrix.mtx.gz";
pub const BARCODES_FILE: &str = "barcodes.tsv.gz";
pub const FEATURES_FILE: &str = "features.tsv.gz";
pub const SUMMARY_FILE: &str = "summary.tsv";

/// One-row description of a finished build, returned to the caller as data
/// and persisted next to the matrix.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub bin_size: u32,
    pub cell_num: usize,
    pub gene_num: usize,
    pub nnz: usize,
    pub density: f64,
}

impl BuildSummary {
    pub fn from_matrix(matrix: &ExpressionMatrix) -> Self {
        let (density, nnz, _) = matrix.counts().density_stats();
        Self {
            bin_size: matrix.bin_size(),
            cell_num: matrix.cell_num(),
            gene_num: matrix.gene_num(),
            nnz,
            density,
        }
    }
}

/// Write the matrix, its catalogs, and the build summary into `dir`.
pub fn write_matrix_dir(
    matrix: &ExpressionMatrix,
    dir: &Path,
    threads: usize,
) -> Result<BuildSummary> {
    let matrix_path = dir.join(MATRIX_FILE);
    make_parent_dirs(&matrix_path)?;

    write_market_matrix(matrix, &matrix_path, threads)
        .with_context(|| format!("failed to write {}", matrix_path.display()))?;
    write_name_column(&matrix.cell_names(), &dir.join(BARCODES_FILE), threads)?;
    write_name_column(matrix.genes(), &dir.join(FEATURES_FILE), threads)?;

    let summary = BuildSummary::from_matrix(matrix);
    let mut writer = get_writer(&Some(dir.join(SUMMARY_FILE)), false, true, 1, 6)?;
    writer.serialize(&summary)?;
    writer.flush()?;

    info!(
        "wrote {} cells × {} genes ({} entries) to {}",
        summary.cell_num,
        summary.gene_num,
        summary.nnz,
        dir.display()
    );
    Ok(summary)
}

fn write_market_matrix(matrix: &ExpressionMatrix, path: &Path, threads: usize) -> Result<()> {
    let counts = matrix.counts();
    let mut writer = get_raw_writer(&Some(path), is_gzipped(path), threads, 6)?;

    writeln!(writer, "%%MatrixMarket matrix coordinate integer general")?;
    writeln!(
        writer,
        "% bin{} cell-by-gene counts written by stereomtx",
        matrix.bin_size()
    )?;
    writeln!(
        writer,
        "{} {} {}",
        counts.nrows(),
        counts.ncols(),
        counts.nnz()
    )?;
    for (row, col, value) in counts.triplet_iter() {
        writeln!(writer, "{} {} {}", row + 1, col + 1, value)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_name_column(names: &[String], path: &Path, threads: usize) -> Result<()> {
    let mut writer = get_writer(&Some(path), is_gzipped(path), false, threads, 6)?;
    for name in names {
        writer.write_record([name.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
