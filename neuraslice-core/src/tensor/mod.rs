// src/tensor/mod.rs

use crate::tensor_data::TensorData;
use std::sync::RwLock;
use crate::error::NeuraSliceError;
use crate::buffer::CpuBuffer;

mod accessors;
pub mod create;
mod debug;
mod layout_methods;

pub mod utils;

pub use create::{allocate, from_vec_f16, from_vec_f32, randn_seeded, zeros};

/// Represents a 4-D `[batch, height, width, channels]` tensor.
///
/// The storage is either a host buffer (Buffer layout, CPU) or a GPU image
/// (Image layout). `Tensor` is deliberately not `Clone`: every handle owns its
/// storage exclusively, so an operator's outputs can never alias its inputs.
pub struct Tensor {
    /// RwLock for interior mutability of TensorData (element writes through `&self`).
    pub(crate) data: RwLock<TensorData>,
}

impl Tensor {
    /// Creates a new CPU Tensor with the given f32 data and NHWC shape.
    pub fn new(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Self, NeuraSliceError> {
        Ok(Tensor::from_data(TensorData::new_cpu(CpuBuffer::F32(data_vec), shape)?))
    }

    /// Creates a new CPU Tensor with the given f16 data and NHWC shape.
    pub fn new_f16(data_vec: Vec<half::f16>, shape: Vec<usize>) -> Result<Self, NeuraSliceError> {
        Ok(Tensor::from_data(TensorData::new_cpu(CpuBuffer::F16(data_vec), shape)?))
    }

    pub(crate) fn from_data(data: TensorData) -> Self {
        Tensor {
            data: RwLock::new(data),
        }
    }

    /// Acquires a read lock on the tensor's data.
    /// Panics if the RwLock is poisoned.
    pub fn read_data(&self) -> std::sync::RwLockReadGuard<'_, TensorData> {
        self.data.read().expect("RwLock poisoned")
    }

    /// Acquires a write lock on the tensor's data.
    /// Panics if the RwLock is poisoned.
    pub fn write_data(&self) -> std::sync::RwLockWriteGuard<'_, TensorData> {
        self.data.write().expect("RwLock poisoned")
    }
}
