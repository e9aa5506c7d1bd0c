use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use tracing::info;

/// Backend used for training.
pub type TrainBackend = Autodiff<NdArray>;

/// Initializes the CPU device used for training.
///
/// Listing tables are small and tabular, so the `NdArray` backend is enough.
/// This function only exists to be able to change the device at a single location.
pub fn init_device() -> NdArrayDevice {
    info!("Initializing NdArray CPU device...");
    NdArrayDevice::default()
}
