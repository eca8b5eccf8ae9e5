use crate::device::{Layout, StorageDevice};
use crate::types::DType;
use neuraslice_backend_gpu::GpuBackendError;
use thiserror::Error;

/// Custom error type for the NeuraSlice framework.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum NeuraSliceError {
    #[error("Invalid shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<usize>, reason: String },

    #[error("Cannot slice {channels} channels into {num_outputs} equal outputs")]
    IndivisibleChannels { channels: usize, num_outputs: usize },

    #[error("Unsupported layout for operation '{operation}': expected {expected:?}, got {actual:?}")]
    UnsupportedLayout {
        expected: Layout,
        actual: Layout,
        operation: String,
    },

    #[error("No kernel for dtype {dtype:?} on device {device:?} in operation '{operation}'")]
    UnsupportedDType {
        device: StorageDevice,
        dtype: DType,
        operation: String,
    },

    #[error("Device mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DeviceMismatch {
        expected: StorageDevice,
        actual: StorageDevice,
        operation: String,
    },

    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Operator '{operator}' expects {expected} {kind}, got {actual}")]
    ArityMismatch {
        operator: String,
        kind: String,
        expected: String,
        actual: usize,
    },

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Tensor '{0}' not found in workspace")]
    TensorNotFound(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("GPU backend error: {0}")]
    Backend(#[from] GpuBackendError),

    #[error("Internal error: {0}")]
    InternalError(String),
}
