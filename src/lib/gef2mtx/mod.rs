//! GEF to matrix conversion functionality for spatial transcriptomics data
//!
//! This module turns one resolution of a GEF container into a cell-by-gene
//! sparse count matrix. It supports:
//! - Run-length gene catalog decoding and validation
//! - Restriction to a caller-ordered gene list or a spatial rectangle
//! - Spatial-key cell discovery with first-occurrence indexing
//! - Compressed-row assembly and triplet-matrix output artifacts
//!
//! # Key Components
//!
//! - [`container`]: read-only GEF container access
//! - [`catalog`]: gene run-length catalog and gene-list input
//! - [`filter`]: the two mutually exclusive restriction modes
//! - [`indexer`]: spatial key packing and cell indexing
//! - [`assembler`]: sparse assembly from parallel index arrays
//! - [`builder`]: single-shot build orchestration
//! - [`output`]: on-disk artifacts

pub mod assembler;
pub mod builder;
pub mod catalog;
pub mod container;
pub mod filter;
pub mod indexer;
pub mod output;

pub use builder::{BuildRequest, ExpressionMatrix, MatrixBuilder};
pub use catalog::{GeneList, GeneRun, GeneRunTable};
pub use container::{GefContainer, SliceSummary, SpotRecord};
pub use filter::Region;
