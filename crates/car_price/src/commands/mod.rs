//! CLI command implementations.

pub mod clean;
mod device;
pub mod options;
pub mod predict;
pub mod train;

pub use device::{TrainBackend, init_device};
