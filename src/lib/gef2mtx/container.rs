//! GEF container access.
//!
//! A GEF container is an HDF5 file holding, per spatial resolution, two
//! compound record streams under `/geneExp/bin{N}`: the run-length gene
//! catalog (`gene`, `offset`, `count`) and the flat expression stream
//! (`x`, `y`, `count`). Both are materialized once at open time; this module
//! never mutates the container.

use crate::core::error::{Result, StereoError};
use crate::gef2mtx::catalog::GeneRun;
use hdf5::types::FixedAscii;
use hdf5::{File, H5Type};
use log::debug;
use serde::Serialize;
use std::path::{Path, PathBuf};

const GENE_EXP_GROUP: &str = "geneExp";

/// Widest gene identifier the compound catalog stores.
pub const MAX_GENE_NAME: usize = 64;

/// One expression record: a pre-binned spatial coordinate and its count.
///
/// Coordinates are read at 64-bit width and validated against the 32-bit
/// packing domain during cell indexing, so a container written with wider
/// coordinates fails loudly instead of truncating.
#[derive(H5Type, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct SpotRecord {
    pub x: u64,
    pub y: u64,
    pub count: u32,
}

#[derive(H5Type, Clone, Debug)]
#[repr(C)]
struct RawGeneRun {
    gene: FixedAscii<MAX_GENE_NAME>,
    offset: u32,
    count: u32,
}

/// Shape-only description of one resolution, cheap enough for inspection
/// without reading the record streams.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SliceSummary {
    pub bin_size: u32,
    pub gene_num: usize,
    pub record_num: usize,
}

/// Read-only handle on a GEF container.
pub struct GefContainer {
    file: File,
    path: PathBuf,
}

impl GefContainer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StereoError::FileNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bin sizes present in the container, ascending.
    pub fn resolutions(&self) -> Result<Vec<u32>> {
        let group = self.gene_exp_group()?;
        let mut bins: Vec<u32> = group
            .member_names()?
            .iter()
            .filter_map(|name| name.strip_prefix("bin").and_then(|n| n.parse().ok()))
            .collect();
        bins.sort_unstable();
        Ok(bins)
    }

    /// Dataset shapes for one resolution, without a full read.
    pub fn slice_summary(&self, bin_size: u32) -> Result<SliceSummary> {
        let group = self.slice_group(bin_size)?;
        let gene_num = group.dataset("gene")?.shape().first().copied().unwrap_or(0);
        let record_num = group
            .dataset("expression")?
            .shape()
            .first()
            .copied()
            .unwrap_or(0);
        Ok(SliceSummary {
            bin_size,
            gene_num,
            record_num,
        })
    }

    /// Read the gene-run catalog and the expression stream for one resolution.
    pub fn read_slice(&self, bin_size: u32) -> Result<(Vec<GeneRun>, Vec<SpotRecord>)> {
        let group = self.slice_group(bin_size)?;

        let raw_runs = group.dataset("gene")?.read_1d::<RawGeneRun>()?;
        let runs: Vec<GeneRun> = raw_runs
            .iter()
            .map(|raw| GeneRun::new(raw.gene.as_str(), raw.offset, raw.count))
            .collect();

        let records = group.dataset("expression")?.read_1d::<SpotRecord>()?.to_vec();

        debug!(
            "read bin{} slice from {}: {} gene runs, {} expression records",
            bin_size,
            self.path.display(),
            runs.len(),
            records.len()
        );
        Ok((runs, records))
    }

    fn gene_exp_group(&self) -> Result<hdf5::Group> {
        self.file.group(GENE_EXP_GROUP).map_err(|_| {
            StereoError::InvalidInput(format!(
                "{} has no /{} group; not a GEF container",
                self.path.display(),
                GENE_EXP_GROUP
            ))
        })
    }

    fn slice_group(&self, bin_size: u32) -> Result<hdf5::Group> {
        let group = self.gene_exp_group()?;
        let tag = format!("bin{}", bin_size);
        if !group.link_exists(&tag) {
            return Err(StereoError::ResolutionNotFound(bin_size));
        }
        Ok(group.group(&tag)?)
    }
}
