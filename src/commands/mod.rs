pub mod gef2mtx;
pub mod info;

pub use gef2mtx::{run_gef2mtx, Gef2MtxArgs};
pub use info::{run_info, InfoArgs};
