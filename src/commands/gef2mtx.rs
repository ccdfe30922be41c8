//! # Matrix Assembly
//!
//! Reads one resolution of a GEF container, optionally restricts the record
//! set to a gene list or a spatial rectangle, assembles the cell-by-gene
//! sparse matrix, and writes triplet-format artifacts.

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use stereomtx_lib::core::concurrency::{determine_allowed_cpus, set_rayon_global_pools_size};
use stereomtx_lib::gef2mtx::output::write_matrix_dir;
use stereomtx_lib::gef2mtx::{BuildRequest, GefContainer, GeneList, MatrixBuilder, Region};
use structopt::StructOpt;

/// Arguments for the `gef2mtx` command.
#[derive(Debug, StructOpt)]
#[structopt(
    name = "gef2mtx",
    about = "Assemble a cell-by-gene matrix from a GEF container"
)]
pub struct Gef2MtxArgs {
    /// Path to the input GEF container.
    #[structopt(short, long, parse(from_os_str))]
    pub gef: PathBuf,

    /// Spatial resolution to read (bin size).
    #[structopt(short, long, default_value = "100")]
    pub bin_size: u32,

    /// Optional gene list file, one identifier per line (may be gzipped).
    /// The matrix gene catalog follows this file's order.
    #[structopt(long, parse(from_os_str))]
    pub genes: Option<PathBuf>,

    /// Optional spatial rectangle x0:x1:y0:y1, bounds inclusive on both axes.
    /// Ignored when --genes is also supplied.
    #[structopt(short, long)]
    pub region: Option<Region>,

    /// Output directory for matrix.mtx.gz, barcodes.tsv.gz, features.tsv.gz
    /// and summary.tsv.
    #[structopt(short, long, parse(from_os_str))]
    pub output: PathBuf,

    /// Number of threads for compression and matrix reductions.
    #[structopt(short, long, default_value = "4")]
    pub threads: usize,
}

pub fn run_gef2mtx(args: Gef2MtxArgs) -> Result<()> {
    info!("Running stereomtx-gef2mtx on: {:?}", args.gef);
    let threads = determine_allowed_cpus(args.threads)?;
    set_rayon_global_pools_size(threads)?;

    let container = GefContainer::open(&args.gef)?;
    let builder = MatrixBuilder::from_container(&container, args.bin_size)?;
    info!(
        "bin{}: {} genes over {} expression records",
        builder.bin_size(),
        builder.gene_num(),
        builder.record_num()
    );

    let genes = args
        .genes
        .as_ref()
        .map(|path| {
            GeneList::from_file(path)
                .map(GeneList::into_vec)
                .with_context(|| format!("failed to read gene list {}", path.display()))
        })
        .transpose()?;
    let request = BuildRequest {
        genes,
        region: args.region,
    };

    let matrix = builder.build(&request)?;
    let summary = write_matrix_dir(&matrix, &args.output, threads)?;
    info!(
        "gef2mtx finished: {} cells × {} genes at bin{}",
        summary.cell_num, summary.gene_num, summary.bin_size
    );
    Ok(())
}
