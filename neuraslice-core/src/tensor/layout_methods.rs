use crate::device::StorageDevice;
use crate::error::NeuraSliceError;
use crate::image::BufferType;
use crate::tensor::Tensor;
use crate::types::DType;

/// Layout conversion and channel slicing methods.
///
/// These delegate to the `_op` functions in [`crate::ops`].
impl Tensor {
    /// Packs this Buffer-layout tensor into a GPU image of precision `dtype`.
    ///
    /// See [`crate::ops::transform::to_image`].
    pub fn to_image(&self, buffer_type: BufferType, dtype: DType) -> Result<Tensor, NeuraSliceError> {
        crate::ops::transform::buffer_to_image_op(self, buffer_type, dtype)
    }

    /// Reads this Image-layout tensor back into a CPU F32 tensor.
    ///
    /// See [`crate::ops::transform::to_buffer`].
    pub fn to_buffer(&self, buffer_type: BufferType) -> Result<Tensor, NeuraSliceError> {
        crate::ops::transform::image_to_buffer_op(self, buffer_type)
    }

    /// Splits the channel axis into `num_outputs` equal parts on the tensor's own device.
    ///
    /// CPU tensors are sliced as F32, GPU tensors with their image precision.
    /// Use [`crate::ops::dispatch::execute`] to request a device and dtype explicitly.
    pub fn slice_channels(&self, num_outputs: usize) -> Result<Vec<Tensor>, NeuraSliceError> {
        let device = self.device();
        let dtype = match device {
            StorageDevice::CPU => DType::F32,
            StorageDevice::GPU => self.dtype(),
        };
        crate::ops::dispatch::execute(device, dtype, self, num_outputs)
    }
}
