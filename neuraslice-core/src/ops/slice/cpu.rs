// neuraslice-core/src/ops/slice/cpu.rs

use log::debug;
use rayon::prelude::*;

use super::SliceDescriptor;
use crate::error::NeuraSliceError;
use crate::tensor::Tensor;

/// Slices a Buffer-layout F32 tensor along its channel axis.
///
/// Every output is a fresh CPU tensor of shape `[B, H, W, C / num_outputs]`.
/// Outputs are filled in parallel, one rayon task per output; the input is
/// only read.
///
/// # Errors
/// * `InvalidArgument` if `num_outputs` is zero.
/// * `IndivisibleChannels` if `C % num_outputs != 0`.
/// * `UnsupportedLayout` for an Image-layout input.
/// * `UnsupportedDType` for an F16 input.
pub fn slice_cpu(input: &Tensor, num_outputs: usize) -> Result<Vec<Tensor>, NeuraSliceError> {
    let slice = SliceDescriptor::new(num_outputs)?;
    let input_guard = input.read_data();
    let data = input_guard.buffer().try_get_cpu_f32("slice_cpu")?;
    let nhwc = input_guard.nhwc()?;
    let output_shape = slice.output_shape(nhwc)?;
    let channels = nhwc[3];
    let output_channels = output_shape[3];
    debug!(
        "slice_cpu: {:?} into {} outputs of {} channels",
        nhwc, num_outputs, output_channels
    );

    let output_data: Vec<Vec<f32>> = (0..num_outputs)
        .into_par_iter()
        .map(|index| {
            let range = slice.channel_range(index, output_channels);
            let mut out = Vec::with_capacity(data.len() / num_outputs);
            for pixel in data.chunks_exact(channels) {
                out.extend_from_slice(&pixel[range.clone()]);
            }
            out
        })
        .collect();
    drop(input_guard);

    output_data
        .into_iter()
        .map(|values| Tensor::new(values, output_shape.to_vec()))
        .collect()
}
