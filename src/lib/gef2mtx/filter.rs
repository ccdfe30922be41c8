//! Record restriction: caller-specified gene subsets and spatial regions.
//!
//! The two modes are mutually exclusive within one build. Gene restriction
//! reorders the catalog to the caller's list; region restriction derives the
//! surviving catalog from the records themselves. Both emit a dense remap
//! from the old gene indexing to the new one.

use crate::core::error::{Result, StereoError};
use crate::gef2mtx::catalog::GeneRunTable;
use crate::gef2mtx::container::SpotRecord;
use rustc_hash::FxHashMap;
use std::str::FromStr;

/// Axis-aligned spatial rectangle with inclusive bounds on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x_min: u64,
    pub x_max: u64,
    pub y_min: u64,
    pub y_max: u64,
}

impl Region {
    pub fn new(x_min: u64, x_max: u64, y_min: u64, y_max: u64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    #[inline]
    pub fn contains(&self, x: u64, y: u64) -> bool {
        self.x_min <= x && x <= self.x_max && self.y_min <= y && y <= self.y_max
    }
}

impl FromStr for Region {
    type Err = StereoError;

    /// Parse `x0:x1:y0:y1`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(StereoError::InvalidInput(format!(
                "region must be x0:x1:y0:y1, got '{}'",
                s
            )));
        }
        let mut bounds = [0u64; 4];
        for (slot, part) in bounds.iter_mut().zip(&parts) {
            *slot = part.trim().parse().map_err(|_| {
                StereoError::InvalidInput(format!("invalid region bound '{}'", part))
            })?;
        }
        Ok(Region::new(bounds[0], bounds[1], bounds[2], bounds[3]))
    }
}

/// The outcome of one restriction pass: the surviving records, the new gene
/// catalog, the per-record gene index into that catalog, and the dense remap
/// from old gene index to new gene index (`None` for dropped genes).
#[derive(Debug, Clone)]
pub struct Restriction {
    pub records: Vec<SpotRecord>,
    pub genes: Vec<String>,
    pub gene_index_per_record: Vec<u32>,
    pub gene_remap: Vec<Option<u32>>,
}

/// Restrict to a caller-supplied gene list, preserving the caller's order in
/// the output catalog.
///
/// Every requested id must exist in the catalog; a miss surfaces immediately
/// as [`StereoError::UnknownGene`] rather than silently desynchronizing the
/// caller's expected column order. Record ranges `[offset, offset + count)`
/// are appended in requested-gene order. Two passes: resolve-and-size, then
/// fill, so no buffer grows per record.
pub fn restrict_to_genes(
    table: &GeneRunTable,
    records: &[SpotRecord],
    requested: &[String],
) -> Result<Restriction> {
    let mut selected = Vec::with_capacity(requested.len());
    let mut total = 0usize;
    for gene in requested {
        let run = table
            .run(gene)
            .ok_or_else(|| StereoError::UnknownGene(gene.clone()))?;
        total += run.count as usize;
        selected.push(run);
    }

    let mut out_records = Vec::with_capacity(total);
    let mut gene_index_per_record = Vec::with_capacity(total);
    let mut gene_remap = vec![None; table.len()];

    for (new_index, run) in selected.iter().enumerate() {
        let span = run.offset as usize..run.offset as usize + run.count as usize;
        out_records.extend_from_slice(&records[span]);
        gene_index_per_record
            .resize(gene_index_per_record.len() + run.count as usize, new_index as u32);
        gene_remap[table.run_index(&run.gene).expect("run resolved above")] =
            Some(new_index as u32);
    }

    Ok(Restriction {
        records: out_records,
        genes: requested.to_vec(),
        gene_index_per_record,
        gene_remap,
    })
}

/// Restrict to records inside an inclusive spatial rectangle.
///
/// The surviving gene catalog holds the distinct gene ids touched by kept
/// records, in first-appearance order. An empty rectangle is a valid empty
/// selection, not an error. Two passes: count survivors, then fill.
pub fn restrict_to_region(
    records: &[SpotRecord],
    gene_index_per_record: &[u32],
    genes: &[String],
    region: &Region,
) -> Restriction {
    debug_assert_eq!(records.len(), gene_index_per_record.len());

    let surviving = records
        .iter()
        .filter(|r| region.contains(r.x, r.y))
        .count();

    let mut out_records = Vec::with_capacity(surviving);
    let mut out_gene_index = Vec::with_capacity(surviving);
    let mut out_genes = Vec::new();
    let mut remap_lookup: FxHashMap<u32, u32> = FxHashMap::default();
    let mut gene_remap = vec![None; genes.len()];

    for (record, &old_index) in records.iter().zip(gene_index_per_record) {
        if !region.contains(record.x, record.y) {
            continue;
        }
        let new_index = match remap_lookup.get(&old_index) {
            Some(&new_index) => new_index,
            None => {
                let new_index = out_genes.len() as u32;
                out_genes.push(genes[old_index as usize].clone());
                remap_lookup.insert(old_index, new_index);
                gene_remap[old_index as usize] = Some(new_index);
                new_index
            }
        };
        out_records.push(*record);
        out_gene_index.push(new_index);
    }

    Restriction {
        records: out_records,
        genes: out_genes,
        gene_index_per_record: out_gene_index,
        gene_remap,
    }
}
