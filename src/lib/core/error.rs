//! Error types shared across the stereomtx library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StereoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("resolution bin{0} is not present in the container")]
    ResolutionNotFound(u32),

    #[error("malformed gene catalog: {0}")]
    MalformedCatalog(String),

    #[error("unknown gene: {0}")]
    UnknownGene(String),

    #[error("coordinate ({x}, {y}) exceeds the 32-bit packing domain")]
    CoordinateOverflow { x: u64, y: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("sparse matrix error: {0}")]
    SparseMatrix(String),

    #[error("file not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, StereoError>;

impl From<nalgebra_sparse::SparseFormatError> for StereoError {
    fn from(err: nalgebra_sparse::SparseFormatError) -> Self {
        StereoError::SparseMatrix(format!("sparse format error: {:?}", err))
    }
}
