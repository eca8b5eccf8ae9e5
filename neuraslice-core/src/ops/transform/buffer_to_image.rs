// neuraslice-core/src/ops/transform/buffer_to_image.rs

use half::f16;
use log::debug;
use neuraslice_backend_gpu::DevicePtr;

use crate::error::NeuraSliceError;
use crate::image::{BufferType, ImageBuffer, ImageDesc, ImageElement};
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;
use crate::types::DType;

/// Converts a Buffer-layout (CPU) tensor into an Image-layout (GPU) tensor.
///
/// The host values are staged and packed on the device stream into a freshly
/// allocated image of precision `dtype`; the returned tensor is valid for any
/// later work on the same stream. F32 images hold the values exactly, F16
/// images round them to half precision.
///
/// # Errors
/// * `UnsupportedLayout` if `input` is already an Image-layout tensor.
/// * `Backend` if the image does not fit the device or the stream is gone.
pub fn buffer_to_image_op(
    input: &Tensor,
    buffer_type: BufferType,
    dtype: DType,
) -> Result<Tensor, NeuraSliceError> {
    let input_guard = input.read_data();
    let values = input_guard.buffer.try_get_cpu("buffer_to_image")?.to_f32_vec();
    let nhwc = input_guard.nhwc()?;
    drop(input_guard);

    let image = ImageBuffer::allocate(nhwc, dtype, buffer_type)?;
    let desc = image.desc().clone();
    let dst = image.memory().device_ptr();
    let kernel = format!("buffer_to_image_{}", dtype);
    debug!("Launching {} for shape {:?}", kernel, nhwc);
    let stream = image.context().stream();
    let writes = [dst.clone()];
    match dtype {
        DType::F32 => stream.launch(&kernel, &[], &writes, move || pack_image::<f32>(&values, &desc, &dst))?,
        DType::F16 => stream.launch(&kernel, &[], &writes, move || pack_image::<f16>(&values, &desc, &dst))?,
    }
    Ok(Tensor::from_data(TensorData::from_image(image)))
}

/// Device side of the conversion: scatters NHWC values into their texel lanes.
fn pack_image<T: ImageElement>(
    values: &[f32],
    desc: &ImageDesc,
    dst: &DevicePtr,
) -> Result<(), neuraslice_backend_gpu::GpuBackendError> {
    let mut image = dst.write()?;
    let channels = desc.channels;
    let pixels = values.chunks_exact(channels);
    for (pixel_idx, pixel) in pixels.enumerate() {
        let w = pixel_idx % desc.width;
        let bh = pixel_idx / desc.width;
        let (b, h) = (bh / desc.height, bh % desc.height);
        for (c, &value) in pixel.iter().enumerate() {
            let offset = desc.element_offset(b, h, w, c);
            T::from_f32(value).write_le(&mut image[offset..offset + T::BYTES]);
        }
    }
    Ok(())
}
