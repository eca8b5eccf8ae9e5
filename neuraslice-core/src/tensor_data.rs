// src/tensor_data.rs
use std::fmt::Debug;

use crate::buffer::{Buffer, CpuBuffer};
use crate::device::{Layout, StorageDevice};
use crate::error::NeuraSliceError;
use crate::image::{BufferType, ImageBuffer};
use crate::tensor::utils::{calculate_strides, validate_shape};
use crate::types::DType;

/// Internal storage and metadata for a Tensor.
///
/// This struct holds the actual data buffer, shape, device and data type.
/// It is wrapped in a `RwLock` by the `Tensor` struct.
#[derive(Debug)]
pub struct TensorData {
    /// The underlying storage (host buffer or GPU image).
    pub(crate) buffer: Buffer,
    /// The device where the buffer resides.
    pub(crate) device: StorageDevice,
    /// The data type of the elements in the buffer.
    pub(crate) dtype: DType,
    /// The logical shape `[batch, height, width, channels]`.
    pub(crate) shape: Vec<usize>,
}

impl TensorData {
    /// Creates a new `TensorData` on the CPU that takes ownership of `buffer`.
    ///
    /// # Errors
    /// `InvalidShape` if the shape is not a non-empty 4-D shape, and
    /// `TensorCreationError` if the buffer length does not match its volume.
    pub fn new_cpu(buffer: CpuBuffer, shape: Vec<usize>) -> Result<Self, NeuraSliceError> {
        let numel = validate_shape(&shape)?;
        if buffer.len() != numel {
            return Err(NeuraSliceError::TensorCreationError {
                data_len: buffer.len(),
                shape,
            });
        }
        Ok(TensorData {
            dtype: buffer.dtype(),
            buffer: Buffer::Cpu(buffer),
            device: StorageDevice::CPU,
            shape,
        })
    }

    /// Allocates zeroed storage for `shape` on `device`.
    pub fn zeros(shape: Vec<usize>, dtype: DType, device: StorageDevice) -> Result<Self, NeuraSliceError> {
        let numel = validate_shape(&shape)?;
        let buffer = match device {
            StorageDevice::CPU => Buffer::Cpu(CpuBuffer::zeros(dtype, numel)),
            StorageDevice::GPU => Buffer::Image(ImageBuffer::allocate(
                nhwc_of(&shape)?,
                dtype,
                BufferType::InOutChannel,
            )?),
        };
        Ok(TensorData {
            buffer,
            device,
            dtype,
            shape,
        })
    }

    /// Wraps an already filled image.
    pub(crate) fn from_image(image: ImageBuffer) -> Self {
        let desc = image.desc();
        TensorData {
            dtype: desc.dtype,
            shape: desc.nhwc().to_vec(),
            device: StorageDevice::GPU,
            buffer: Buffer::Image(image),
        }
    }

    pub fn layout(&self) -> Layout {
        self.buffer.layout()
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Row-major strides of the logical shape (the Buffer-layout addressing).
    pub fn strides(&self) -> Vec<usize> {
        calculate_strides(&self.shape)
    }

    /// `[batch, height, width, channels]`.
    pub fn nhwc(&self) -> Result<[usize; 4], NeuraSliceError> {
        nhwc_of(&self.shape)
    }
}

pub(crate) fn nhwc_of(shape: &[usize]) -> Result<[usize; 4], NeuraSliceError> {
    match shape {
        [b, h, w, c] => Ok([*b, *h, *w, *c]),
        _ => Err(NeuraSliceError::InvalidShape {
            shape: shape.to_vec(),
            reason: format!("expected rank 4 [batch, height, width, channels], got rank {}", shape.len()),
        }),
    }
}
