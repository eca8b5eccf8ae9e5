// neuraslice-core/src/ops/slice/mod.rs

//! Channel-wise Slice: splits the channel axis of an NHWC tensor into
//! `num_outputs` equal, contiguous, order-preserving parts.
//!
//! Output `i` holds channels `i * oc .. (i + 1) * oc` of every pixel, with
//! `oc = C / num_outputs`. One kernel per backend: [`slice_cpu`] over the
//! Buffer layout and [`slice_gpu`] over the Image layout.

pub mod cpu;
pub mod gpu;

pub use cpu::slice_cpu;
pub use gpu::slice_gpu;

use std::ops::Range;

use crate::error::NeuraSliceError;

/// Validated parameters of one Slice invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceDescriptor {
    num_outputs: usize,
}

impl SliceDescriptor {
    /// # Errors
    /// `InvalidArgument` if `num_outputs` is zero.
    pub fn new(num_outputs: usize) -> Result<Self, NeuraSliceError> {
        if num_outputs == 0 {
            return Err(NeuraSliceError::InvalidArgument {
                name: "num_outputs".to_string(),
                reason: "Slice needs at least one output".to_string(),
            });
        }
        Ok(SliceDescriptor { num_outputs })
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Channels per output.
    ///
    /// # Errors
    /// `IndivisibleChannels` if `channels` is not a multiple of `num_outputs`.
    pub fn output_channels(&self, channels: usize) -> Result<usize, NeuraSliceError> {
        if channels % self.num_outputs != 0 {
            return Err(NeuraSliceError::IndivisibleChannels {
                channels,
                num_outputs: self.num_outputs,
            });
        }
        Ok(channels / self.num_outputs)
    }

    /// Shape shared by every output.
    pub fn output_shape(&self, nhwc: [usize; 4]) -> Result<[usize; 4], NeuraSliceError> {
        let [batch, height, width, channels] = nhwc;
        Ok([batch, height, width, self.output_channels(channels)?])
    }

    /// Input channels copied into output `index`.
    pub fn channel_range(&self, index: usize, output_channels: usize) -> Range<usize> {
        index * output_channels..(index + 1) * output_channels
    }
}

#[cfg(test)]
#[path = "slice_test.rs"]
mod tests;
