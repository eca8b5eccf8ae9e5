// neuraslice-core/src/ops/transform/mod.rs

//! Conversions between the host Buffer layout and the GPU Image layout.

pub mod buffer_to_image;
pub mod image_to_buffer;

pub use buffer_to_image::buffer_to_image_op;
pub use image_to_buffer::image_to_buffer_op;

use crate::error::NeuraSliceError;
use crate::image::BufferType;
use crate::tensor::Tensor;
use crate::types::DType;

/// Packs a Buffer-layout tensor into a GPU image of precision `dtype`.
pub fn to_image(input: &Tensor, buffer_type: BufferType, dtype: DType) -> Result<Tensor, NeuraSliceError> {
    buffer_to_image_op(input, buffer_type, dtype)
}

/// Reads an Image-layout tensor back into a CPU F32 tensor.
pub fn to_buffer(input: &Tensor, buffer_type: BufferType) -> Result<Tensor, NeuraSliceError> {
    image_to_buffer_op(input, buffer_type)
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
