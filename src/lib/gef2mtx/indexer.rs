//! Spatial key packing and first-occurrence cell indexing.

use crate::core::error::{Result, StereoError};
use crate::gef2mtx::container::SpotRecord;
use rustc_hash::FxHashMap;

/// Pack a spatial bin coordinate into its 64-bit cell key.
///
/// The packing is bijective for coordinates within the 32-bit domain;
/// anything wider is a fatal precondition violation, surfaced before any
/// assembly work starts.
#[inline]
pub fn pack_spatial_key(x: u64, y: u64) -> Result<u64> {
    if x > u32::MAX as u64 || y > u32::MAX as u64 {
        return Err(StereoError::CoordinateOverflow { x, y });
    }
    Ok((x << 32) | y)
}

/// Recover the (x, y) coordinate from a packed cell key.
#[inline]
pub fn unpack_spatial_key(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

/// Discovers distinct spatial bins and assigns dense cell indices.
pub struct CellIndexer;

impl CellIndexer {
    /// One pass over the (possibly filtered) record set: packs every (x, y),
    /// assigns cell indices in first-occurrence order, and returns the cell
    /// catalog alongside the per-record row index.
    ///
    /// First-occurrence order is a contract downstream consumers may rely on
    /// for row meaning; it is not numerically sorted by coordinate.
    pub fn index(records: &[SpotRecord]) -> Result<(Vec<u64>, Vec<u32>)> {
        let mut lookup: FxHashMap<u64, u32> = FxHashMap::default();
        let mut cells = Vec::new();
        let mut cell_index_per_record = Vec::with_capacity(records.len());

        for record in records {
            let key = pack_spatial_key(record.x, record.y)?;
            let index = match lookup.get(&key) {
                Some(&index) => index,
                None => {
                    let index = cells.len() as u32;
                    cells.push(key);
                    lookup.insert(key, index);
                    index
                }
            };
            cell_index_per_record.push(index);
        }

        Ok((cells, cell_index_per_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(x: u64, y: u64) -> SpotRecord {
        SpotRecord { x, y, count: 1 }
    }

    #[test]
    fn key_round_trips_within_domain() {
        for &(x, y) in &[(0u64, 0u64), (1, 2), (u32::MAX as u64, 0), (7, u32::MAX as u64)] {
            let key = pack_spatial_key(x, y).unwrap();
            assert_eq!(unpack_spatial_key(key), (x as u32, y as u32));
        }
    }

    #[test]
    fn distinct_coordinates_never_collide() {
        let a = pack_spatial_key(1, 0).unwrap();
        let b = pack_spatial_key(0, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_out_of_domain_coordinates() {
        let err = pack_spatial_key(u32::MAX as u64 + 1, 0).unwrap_err();
        assert!(matches!(err, StereoError::CoordinateOverflow { .. }));
        let err = pack_spatial_key(0, u64::MAX).unwrap_err();
        assert!(matches!(err, StereoError::CoordinateOverflow { .. }));
    }

    #[test]
    fn assigns_indices_in_first_occurrence_order() {
        let records = vec![spot(5, 5), spot(0, 0), spot(5, 5), spot(1, 1)];
        let (cells, rows) = CellIndexer::index(&records).unwrap();
        assert_eq!(
            cells,
            vec![
                pack_spatial_key(5, 5).unwrap(),
                pack_spatial_key(0, 0).unwrap(),
                pack_spatial_key(1, 1).unwrap(),
            ]
        );
        assert_eq!(rows, vec![0, 1, 0, 2]);
    }

    #[test]
    fn cell_count_equals_distinct_coordinates() {
        let records = vec![spot(0, 0), spot(0, 0), spot(1, 1)];
        let (cells, rows) = CellIndexer::index(&records).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(rows.len(), records.len());
    }

    #[test]
    fn empty_record_set_yields_no_cells() {
        let (cells, rows) = CellIndexer::index(&[]).unwrap();
        assert!(cells.is_empty());
        assert!(rows.is_empty());
    }
}
