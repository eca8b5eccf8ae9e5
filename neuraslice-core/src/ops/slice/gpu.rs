// neuraslice-core/src/ops/slice/gpu.rs

use half::f16;
use log::{debug, trace};
use neuraslice_backend_gpu::{DevicePtr, GpuBackendError};

use super::SliceDescriptor;
use crate::error::NeuraSliceError;
use crate::image::{ImageBuffer, ImageDesc, ImageElement, CHANNELS_PER_TEXEL};
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;
use crate::types::DType;

/// Slices an Image-layout tensor along its channel axis, directly in image memory.
///
/// All outputs are allocated up front with the input's precision, then one
/// kernel filling all of them is queued on the device stream. The call
/// returns as soon as the kernel is queued; convert the outputs with
/// `to_buffer` (which waits for the stream) to read them. If the kernel fails,
/// or the input image was itself produced by a failed kernel, every output is
/// faulted and `to_buffer` on any of them returns the kernel error.
///
/// # Errors
/// * `InvalidArgument` if `num_outputs` is zero.
/// * `IndivisibleChannels` if `C % num_outputs != 0`.
/// * `UnsupportedLayout` for a Buffer-layout input.
/// * `Backend` if an output image cannot be allocated or the stream is closed.
pub fn slice_gpu(input: &Tensor, num_outputs: usize) -> Result<Vec<Tensor>, NeuraSliceError> {
    let slice = SliceDescriptor::new(num_outputs)?;
    let input_guard = input.read_data();
    let image = input_guard.buffer().try_get_image("slice_gpu")?;
    let src_desc = image.desc().clone();
    let output_shape = slice.output_shape(src_desc.nhwc())?;

    let outputs = (0..num_outputs)
        .map(|_| ImageBuffer::allocate(output_shape, src_desc.dtype, src_desc.buffer_type))
        .collect::<Result<Vec<_>, _>>()?;
    let src = image.memory().device_ptr();
    let dsts: Vec<(ImageDesc, DevicePtr)> = outputs
        .iter()
        .map(|output| (output.desc().clone(), output.memory().device_ptr()))
        .collect();

    let kernel = format!("slice_{}", src_desc.dtype);
    debug!(
        "Launching {} for {:?} into {} outputs of shape {:?}",
        kernel,
        src_desc.nhwc(),
        num_outputs,
        output_shape
    );
    let stream = image.context().stream();
    let reads = [src.clone()];
    let writes: Vec<DevicePtr> = dsts.iter().map(|(_, ptr)| ptr.clone()).collect();
    match src_desc.dtype {
        DType::F32 => stream.launch(&kernel, &reads, &writes, move || {
            slice_image::<f32>(&src_desc, &src, &dsts)
        })?,
        DType::F16 => stream.launch(&kernel, &reads, &writes, move || {
            slice_image::<f16>(&src_desc, &src, &dsts)
        })?,
    }
    drop(input_guard);

    Ok(outputs
        .into_iter()
        .map(|output| Tensor::from_data(TensorData::from_image(output)))
        .collect())
}

/// Device side: fills each output image from its channel range of the source.
fn slice_image<T: ImageElement>(
    src_desc: &ImageDesc,
    src: &DevicePtr,
    outputs: &[(ImageDesc, DevicePtr)],
) -> Result<(), GpuBackendError> {
    if src_desc.dtype != T::DTYPE {
        return Err(GpuBackendError::KernelFailed {
            kernel: format!("slice_{}", T::DTYPE),
            reason: format!("source image holds {}", src_desc.dtype),
        });
    }
    let src_bytes = src.read()?;
    for (index, (dst_desc, dst)) in outputs.iter().enumerate() {
        let mut dst_bytes = dst.write()?;
        let first_channel = index * dst_desc.channels;
        if dst_desc.channels % CHANNELS_PER_TEXEL == 0 {
            trace!("slice output {}: texel runs from channel {}", index, first_channel);
            copy_texel_runs(src_desc, &src_bytes, dst_desc, &mut dst_bytes, first_channel);
        } else {
            trace!("slice output {}: lane copy from channel {}", index, first_channel);
            copy_lanes::<T>(src_desc, &src_bytes, dst_desc, &mut dst_bytes, first_channel);
        }
    }
    Ok(())
}

/// Output blocks line up with whole source blocks: each image row of a block
/// is one contiguous run of `width` texels.
fn copy_texel_runs(
    src_desc: &ImageDesc,
    src: &[u8],
    dst_desc: &ImageDesc,
    dst: &mut [u8],
    first_channel: usize,
) {
    let first_block = first_channel / CHANNELS_PER_TEXEL;
    let blocks = dst_desc.channels / CHANNELS_PER_TEXEL;
    let run_bytes = dst_desc.width * dst_desc.texel_bytes();
    for y in 0..dst_desc.image_height {
        for block in 0..blocks {
            let from = src_desc.block_row_offset(first_block + block, y);
            let to = dst_desc.block_row_offset(block, y);
            dst[to..to + run_bytes].copy_from_slice(&src[from..from + run_bytes]);
        }
    }
}

/// General case: channels move between lanes, one element at a time.
fn copy_lanes<T: ImageElement>(
    src_desc: &ImageDesc,
    src: &[u8],
    dst_desc: &ImageDesc,
    dst: &mut [u8],
    first_channel: usize,
) {
    let [batch, height, width, channels] = dst_desc.nhwc();
    for b in 0..batch {
        for h in 0..height {
            for w in 0..width {
                for c in 0..channels {
                    let from = src_desc.element_offset(b, h, w, first_channel + c);
                    let to = dst_desc.element_offset(b, h, w, c);
                    T::read_le(&src[from..from + T::BYTES]).write_le(&mut dst[to..to + T::BYTES]);
                }
            }
        }
    }
}
