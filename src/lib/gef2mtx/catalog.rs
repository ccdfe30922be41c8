//! Gene run-length catalog decoding and gene-list input.

use crate::core::error::{Result, StereoError};
use flate2::read::GzDecoder;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One run of the run-length-encoded gene catalog: `count` consecutive
/// expression records starting at `offset` belong to `gene`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRun {
    pub gene: String,
    pub offset: u32,
    pub count: u32,
}

impl GeneRun {
    pub fn new<S: Into<String>>(gene: S, offset: u32, count: u32) -> Self {
        Self {
            gene: gene.into(),
            offset,
            count,
        }
    }
}

/// Validated run-length gene catalog for one resolution.
///
/// Construction checks the container invariants up front so every later pass
/// can index record ranges without bounds anxiety: runs start at offset 0,
/// are contiguous and non-overlapping, cover exactly the expression stream,
/// and never repeat a gene id.
#[derive(Debug, Clone)]
pub struct GeneRunTable {
    runs: Vec<GeneRun>,
    index: FxHashMap<String, usize>,
    total_records: usize,
}

impl GeneRunTable {
    pub fn new(runs: Vec<GeneRun>, expected_records: usize) -> Result<Self> {
        let mut index = FxHashMap::with_capacity_and_hasher(runs.len(), Default::default());
        let mut covered = 0u64;

        for (i, run) in runs.iter().enumerate() {
            if run.offset as u64 != covered {
                return Err(StereoError::MalformedCatalog(format!(
                    "run for gene '{}' starts at offset {} but {} records precede it",
                    run.gene, run.offset, covered
                )));
            }
            covered += run.count as u64;

            if index.insert(run.gene.clone(), i).is_some() {
                return Err(StereoError::MalformedCatalog(format!(
                    "gene '{}' appears more than once",
                    run.gene
                )));
            }
        }

        if covered != expected_records as u64 {
            return Err(StereoError::MalformedCatalog(format!(
                "catalog covers {} records but the expression stream holds {}",
                covered, expected_records
            )));
        }

        Ok(Self {
            runs,
            index,
            total_records: expected_records,
        })
    }

    /// Number of genes in the catalog.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of expression records the catalog covers.
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn runs(&self) -> &[GeneRun] {
        &self.runs
    }

    /// Catalog order gene identifiers.
    pub fn gene_names(&self) -> Vec<String> {
        self.runs.iter().map(|run| run.gene.clone()).collect()
    }

    /// Look up the run for one gene id.
    pub fn run(&self, gene: &str) -> Option<&GeneRun> {
        self.index.get(gene).map(|&i| &self.runs[i])
    }

    /// Position of a gene in catalog order.
    pub fn run_index(&self, gene: &str) -> Option<usize> {
        self.index.get(gene).copied()
    }

    /// Decode the run-length code into a per-record gene index.
    ///
    /// One linear pass writing each gene index `count` times, O(total
    /// records); large runs must never degrade toward per-gene rescans.
    pub fn expand(&self) -> Vec<u32> {
        let mut owners = Vec::with_capacity(self.total_records);
        for (gene_index, run) in self.runs.iter().enumerate() {
            owners.resize(owners.len() + run.count as usize, gene_index as u32);
        }
        owners
    }
}

/// Ordered, de-duplicated gene list loaded from caller input.
///
/// The order of this list is a contract: the output gene catalog of a
/// gene-restricted build follows it, not the container's catalog order.
#[derive(Debug, Clone)]
pub struct GeneList {
    ordered: Vec<String>,
}

impl GeneList {
    /// Load a gene list from a file with one identifier per line.
    /// Gzipped files are detected by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.eq_ignore_ascii_case("gz"))
            .unwrap_or(false)
        {
            Box::new(BufReader::with_capacity(64 * 1024, GzDecoder::new(file)))
        } else {
            Box::new(BufReader::with_capacity(64 * 1024, file))
        };
        Self::from_reader(reader)
    }

    fn from_reader(reader: Box<dyn BufRead>) -> Result<Self> {
        let mut ordered = Vec::new();
        let mut seen = FxHashSet::default();
        for line in reader.lines() {
            let line = line?;
            let gene = line.trim();
            if !gene.is_empty() && seen.insert(gene.to_string()) {
                ordered.push(gene.to_string());
            }
        }
        Ok(Self { ordered })
    }

    /// Build a list from identifiers already in memory, preserving order.
    pub fn from_vec(genes: Vec<String>) -> Self {
        let mut ordered = Vec::with_capacity(genes.len());
        let mut seen = FxHashSet::default();
        for gene in genes {
            if seen.insert(gene.clone()) {
                ordered.push(gene);
            }
        }
        Self { ordered }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn runs() -> Vec<GeneRun> {
        vec![GeneRun::new("g1", 0, 2), GeneRun::new("g2", 2, 1)]
    }

    #[test]
    fn accepts_contiguous_catalog() {
        let table = GeneRunTable::new(runs(), 3).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_records(), 3);
        assert_eq!(table.gene_names(), vec!["g1", "g2"]);
        assert_eq!(table.run("g2").unwrap().offset, 2);
        assert_eq!(table.run_index("g1"), Some(0));
        assert!(table.run("g3").is_none());
    }

    #[test]
    fn rejects_gap_in_offsets() {
        let bad = vec![GeneRun::new("g1", 0, 2), GeneRun::new("g2", 3, 1)];
        let err = GeneRunTable::new(bad, 4).unwrap_err();
        assert!(matches!(err, StereoError::MalformedCatalog(_)));
    }

    #[test]
    fn rejects_count_sum_mismatch() {
        let err = GeneRunTable::new(runs(), 4).unwrap_err();
        assert!(matches!(err, StereoError::MalformedCatalog(_)));
    }

    #[test]
    fn rejects_duplicated_gene_id() {
        let bad = vec![GeneRun::new("g1", 0, 2), GeneRun::new("g1", 2, 1)];
        let err = GeneRunTable::new(bad, 3).unwrap_err();
        assert!(matches!(err, StereoError::MalformedCatalog(_)));
    }

    #[test]
    fn rejects_nonzero_first_offset() {
        let bad = vec![GeneRun::new("g1", 1, 2)];
        let err = GeneRunTable::new(bad, 3).unwrap_err();
        assert!(matches!(err, StereoError::MalformedCatalog(_)));
    }

    #[test]
    fn accepts_empty_catalog_with_empty_stream() {
        let table = GeneRunTable::new(Vec::new(), 0).unwrap();
        assert!(table.is_empty());
        assert!(table.expand().is_empty());
    }

    #[test]
    fn expand_repeats_each_gene_index_count_times() {
        let table = GeneRunTable::new(runs(), 3).unwrap();
        assert_eq!(table.expand(), vec![0, 0, 1]);
    }

    #[test]
    fn gene_list_preserves_order_and_drops_duplicates() {
        let list = GeneList::from_vec(vec![
            "g2".to_string(),
            "g1".to_string(),
            "g2".to_string(),
        ]);
        assert_eq!(list.as_slice(), &["g2".to_string(), "g1".to_string()]);
    }

    #[test]
    fn gene_list_reads_trimmed_nonempty_lines() {
        let reader = Box::new(Cursor::new(b"g2\n\n  g1  \ng2\n".to_vec()));
        let list = GeneList::from_reader(reader).unwrap();
        assert_eq!(list.as_slice(), &["g2".to_string(), "g1".to_string()]);
    }

    #[test]
    fn gene_list_reads_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genes.txt.gz");
        {
            let file = File::create(&path).unwrap();
            let mut encoder =
                flate2::write::GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(b"g1\ng2\n").unwrap();
            encoder.finish().unwrap();
        }
        let list = GeneList::from_file(&path).unwrap();
        assert_eq!(list.as_slice(), &["g1".to_string(), "g2".to_string()]);
    }
}
