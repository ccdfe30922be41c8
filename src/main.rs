//! stereomtx - Stereo-seq GEF matrix assembly toolkit
//!
//! stereomtx reads GEF spatial-transcriptomics containers and assembles
//! cell-by-gene sparse count matrices, with optional restriction to a gene
//! list or a rectangular spatial region.
//!
//! # Tools
//!
//! stereomtx provides two subcommands:
//!
//! - `info`: list the resolutions stored in a GEF container
//! - `gef2mtx`: assemble a matrix and write triplet-format artifacts
//!
//! # Usage
//!
//! ```bash
//! # Inspect a container
//! stereomtx info --gef sample.gef
//!
//! # Assemble the full matrix at bin size 100
//! stereomtx gef2mtx --gef sample.gef --bin-size 100 --output out/
//!
//! # Restrict to a gene list (order is preserved in the output catalog)
//! stereomtx gef2mtx --gef sample.gef --genes genes.txt --output out/
//!
//! # Restrict to a spatial rectangle (inclusive bounds)
//! stereomtx gef2mtx --gef sample.gef --region 1000:2000:1000:2000 --output out/
//! ```
//!
//! For more detailed usage information, see the documentation for each subcommand.

extern crate stereomtx_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use log::*;
use stereomtx_lib::core::errors::is_broken_pipe;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Commands for assembling cell-by-gene matrices from GEF containers
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// List the resolutions stored in a GEF container
    Info(commands::InfoArgs),
    /// Assemble a cell-by-gene matrix from a GEF container
    Gef2mtx(commands::Gef2MtxArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Info(args) => commands::run_info(args)?,
            Subcommand::Gef2mtx(args) => commands::run_gef2mtx(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}
