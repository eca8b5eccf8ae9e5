// src/tensor/create.rs

use crate::device::StorageDevice;
use crate::error::NeuraSliceError;
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;
use crate::types::DType;

use half::f16;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Allocates a zero-initialized tensor of `shape` on `device`.
///
/// GPU tensors are allocated as zeroed images on the default GPU context.
///
/// # Errors
/// `InvalidShape` if `shape` is not 4-D or has a zero dimension.
pub fn allocate(shape: &[usize], dtype: DType, device: StorageDevice) -> Result<Tensor, NeuraSliceError> {
    let data = TensorData::zeros(shape.to_vec(), dtype, device)?;
    Ok(Tensor::from_data(data))
}

/// Creates a new tensor filled with zeros with the specified shape.
/// Currently creates an f32 tensor on the CPU.
pub fn zeros(shape: &[usize]) -> Result<Tensor, NeuraSliceError> {
    allocate(shape, DType::F32, StorageDevice::CPU)
}

/// Creates a new CPU F32 Tensor from a Vec<f32> and shape.
pub fn from_vec_f32(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Tensor, NeuraSliceError> {
    Tensor::new(data_vec, shape)
}

/// Creates a new CPU F16 Tensor, rounding each f32 value to half precision.
pub fn from_vec_f16(data_vec: &[f32], shape: Vec<usize>) -> Result<Tensor, NeuraSliceError> {
    Tensor::new_f16(data_vec.iter().map(|&v| f16::from_f32(v)).collect(), shape)
}

/// Creates a CPU F32 tensor of standard normal samples drawn from `rng`.
///
/// The generator is passed in so callers can seed it (`StdRng::seed_from_u64`)
/// and reproduce a run exactly.
pub fn randn_seeded<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Result<Tensor, NeuraSliceError> {
    let numel = crate::tensor::utils::validate_shape(shape)?;
    let data_vec: Vec<f32> = (0..numel).map(|_| StandardNormal.sample(rng)).collect();
    Tensor::new(data_vec, shape.to_vec())
}
