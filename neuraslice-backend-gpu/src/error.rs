use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpuBackendError {
    #[error("GPU backend is not initialized. Call initialize_gpu_with_logging() first.")]
    NotInitialized,
    #[error("No GPU devices found")]
    NoDevicesFound,
    #[error("Invalid GPU device ID: {0}")]
    InvalidDeviceId(u32),
    #[error("GPU stream '{0}' is closed; its worker thread is gone")]
    StreamClosed(String),
    #[error("Kernel '{kernel}' failed: {reason}")]
    KernelFailed { kernel: String, reason: String },
    #[error("Failed to map device memory for host access: {0}")]
    MappingFailed(String),
    #[error("Image extent {width}x{height} exceeds the device limit of {max_extent} texels per axis")]
    ImageTooLarge {
        width: usize,
        height: usize,
        max_extent: usize,
    },
    #[error("Event has not been recorded or has not completed yet")]
    EventNotReady,
    #[error("Invalid device configuration: {0}")]
    InvalidConfig(String),
}
