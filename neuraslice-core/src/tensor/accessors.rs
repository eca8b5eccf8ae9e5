// src/tensor/accessors.rs
use crate::{
    device::{Layout, StorageDevice},
    error::NeuraSliceError,
    tensor::{utils::coord_to_offset, Tensor},
    types::DType,
};

impl Tensor {
    /// Returns a clone of the tensor's shape (dimensions).
    pub fn shape(&self) -> Vec<usize> {
        self.read_data().shape.clone()
    }

    /// Returns the storage device where the tensor data resides.
    pub fn device(&self) -> StorageDevice {
        self.read_data().device
    }

    /// Returns the data type (`DType`) of the tensor elements.
    pub fn dtype(&self) -> DType {
        self.read_data().dtype
    }

    /// Returns the physical layout, which always follows the device.
    pub fn layout(&self) -> Layout {
        self.read_data().layout()
    }

    /// Returns the total number of elements in the tensor.
    pub fn numel(&self) -> usize {
        self.read_data().numel()
    }

    /// Returns `[batch, height, width, channels]`.
    pub fn nhwc(&self) -> Result<[usize; 4], NeuraSliceError> {
        self.read_data().nhwc()
    }

    /// Reads the element at `coords = [b, h, w, c]`, widened to f32.
    ///
    /// Only Buffer-layout tensors can be read; convert images with
    /// [`crate::ops::transform::to_buffer`] first.
    pub fn read(&self, coords: &[usize]) -> Result<f32, NeuraSliceError> {
        let guard = self.read_data();
        let cpu = guard.buffer.try_get_cpu("read")?;
        let offset = coord_to_offset(coords, &guard.shape)?;
        cpu.get_f32(offset).ok_or_else(|| {
            NeuraSliceError::InternalError(format!("offset {} outside buffer of {} elements", offset, cpu.len()))
        })
    }

    /// Writes `value` at `coords = [b, h, w, c]`, rounding to the tensor's dtype.
    pub fn write(&self, coords: &[usize], value: f32) -> Result<(), NeuraSliceError> {
        let mut guard = self.write_data();
        let offset = coord_to_offset(coords, &guard.shape)?;
        let cpu = guard.buffer.try_get_cpu_mut("write")?;
        let len = cpu.len();
        cpu.set_f32(offset, value).ok_or_else(|| {
            NeuraSliceError::InternalError(format!("offset {} outside buffer of {} elements", offset, len))
        })
    }

    /// Copies the data of a Buffer-layout tensor out as f32, in NHWC order.
    ///
    /// Returns `UnsupportedLayout` for Image-layout tensors.
    pub fn get_f32_data(&self) -> Result<Vec<f32>, NeuraSliceError> {
        let guard = self.read_data();
        Ok(guard.buffer.try_get_cpu("get_f32_data")?.to_f32_vec())
    }
}
