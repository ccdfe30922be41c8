//! # Container Inspection
//!
//! Lists the resolutions stored in a GEF container together with their
//! catalog and record counts, without reading the record streams.

use anyhow::Result;
use log::warn;
use std::path::PathBuf;
use stereomtx_lib::core::io::get_writer;
use stereomtx_lib::gef2mtx::GefContainer;
use structopt::StructOpt;

/// Arguments for the `info` command.
#[derive(Debug, StructOpt)]
#[structopt(name = "info", about = "List the resolutions stored in a GEF container")]
pub struct InfoArgs {
    /// Path to the GEF container.
    #[structopt(short, long, parse(from_os_str))]
    pub gef: PathBuf,
}

pub fn run_info(args: InfoArgs) -> Result<()> {
    let container = GefContainer::open(&args.gef)?;
    let resolutions = container.resolutions()?;
    if resolutions.is_empty() {
        warn!("{} holds no resolutions", args.gef.display());
        return Ok(());
    }

    let mut writer = get_writer(&None::<PathBuf>, false, true, 1, 6)?;
    for bin_size in resolutions {
        writer.serialize(container.slice_summary(bin_size)?)?;
    }
    writer.flush()?;
    Ok(())
}
