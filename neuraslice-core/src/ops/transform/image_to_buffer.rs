// neuraslice-core/src/ops/transform/image_to_buffer.rs

use half::f16;
use log::trace;

use crate::error::NeuraSliceError;
use crate::image::{BufferType, ImageDesc, ImageElement};
use crate::tensor::Tensor;
use crate::types::DType;

/// Converts an Image-layout (GPU) tensor back into a Buffer-layout F32 tensor on the CPU.
///
/// Waits for the device stream, then reads the image through a scoped host
/// mapping that is released before returning, on success and on error alike.
///
/// # Errors
/// * `UnsupportedLayout` if `input` is a Buffer-layout tensor.
/// * `Backend` if the kernel that produced the image failed or was skipped.
pub fn image_to_buffer_op(input: &Tensor, buffer_type: BufferType) -> Result<Tensor, NeuraSliceError> {
    let input_guard = input.read_data();
    let image = input_guard.buffer.try_get_image("image_to_buffer")?;
    let desc = image.desc();
    if desc.buffer_type != buffer_type {
        return Err(NeuraSliceError::InvalidArgument {
            name: "buffer_type".to_string(),
            reason: format!("image was packed as {:?}, requested {:?}", desc.buffer_type, buffer_type),
        });
    }

    let values = {
        let mapped = image.context().map_read(image.memory())?;
        trace!("Reading {} image of shape {:?} back to host", desc.dtype, desc.nhwc());
        match desc.dtype {
            DType::F32 => unpack_image::<f32>(&mapped, desc),
            DType::F16 => unpack_image::<f16>(&mapped, desc),
        }
    };
    Tensor::new(values, desc.nhwc().to_vec())
}

/// Gathers texel lanes back into NHWC order, widening to f32.
fn unpack_image<T: ImageElement>(image: &[u8], desc: &ImageDesc) -> Vec<f32> {
    let [batch, height, width, channels] = desc.nhwc();
    let mut values = Vec::with_capacity(batch * height * width * channels);
    for b in 0..batch {
        for h in 0..height {
            for w in 0..width {
                for c in 0..channels {
                    let offset = desc.element_offset(b, h, w, c);
                    values.push(T::read_le(&image[offset..offset + T::BYTES]).to_f32());
                }
            }
        }
    }
    values
}
