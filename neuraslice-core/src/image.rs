//! Image layout: the packed texture representation of GPU tensors.
//!
//! An NHWC tensor with `BufferType::InOutChannel` becomes a 2-D image of
//! `ceil(C / 4) * W` by `B * H` texels. Texel `(x, y)` with
//! `x = (c / 4) * W + w` and `y = b * H + h` carries channels
//! `4 * (c / 4) .. 4 * (c / 4) + 4` of pixel `(b, h, w)`, one per lane.
//! Rows are padded to the device row pitch. Lanes past `C` stay zero.
//!
//! Nothing outside the crate sees these offsets; tensors in Image layout are
//! inspected by converting them back to Buffer layout.

use half::f16;
use log::debug;
use neuraslice_backend_gpu::{default_context, DeviceConfig, DeviceMemory, GpuContext};
use num_traits::Zero;

use crate::error::NeuraSliceError;
use crate::types::DType;

/// Role of a tensor being converted, which decides how it is packed into an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Activation tensor (input or output of an operator); the channel axis is packed.
    InOutChannel,
}

/// Lanes per texel (RGBA).
pub(crate) const CHANNELS_PER_TEXEL: usize = 4;

/// Geometry and addressing of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageDesc {
    pub(crate) buffer_type: BufferType,
    pub(crate) dtype: DType,
    pub(crate) batch: usize,
    pub(crate) height: usize,
    pub(crate) width: usize,
    pub(crate) channels: usize,
    /// Image width in texels.
    pub(crate) image_width: usize,
    /// Image height in texels.
    pub(crate) image_height: usize,
    /// Bytes between the starts of two consecutive image rows.
    pub(crate) row_pitch: usize,
}

impl ImageDesc {
    pub(crate) fn new(
        nhwc: [usize; 4],
        dtype: DType,
        buffer_type: BufferType,
        config: &DeviceConfig,
    ) -> Result<Self, NeuraSliceError> {
        let [batch, height, width, channels] = nhwc;
        let (image_width, image_height) = match buffer_type {
            BufferType::InOutChannel => (channels.div_ceil(CHANNELS_PER_TEXEL) * width, batch * height),
        };
        config.check_image_extent(image_width, image_height)?;
        let texel_bytes = CHANNELS_PER_TEXEL * dtype.size_of();
        Ok(ImageDesc {
            buffer_type,
            dtype,
            batch,
            height,
            width,
            channels,
            image_width,
            image_height,
            row_pitch: config.aligned_pitch(image_width * texel_bytes),
        })
    }

    pub(crate) fn elem_bytes(&self) -> usize {
        self.dtype.size_of()
    }

    /// Bytes per texel: four lanes of the image dtype.
    pub(crate) fn texel_bytes(&self) -> usize {
        CHANNELS_PER_TEXEL * self.elem_bytes()
    }

    pub(crate) fn size_bytes(&self) -> usize {
        self.row_pitch * self.image_height
    }

    pub(crate) fn texel_offset(&self, x: usize, y: usize) -> usize {
        y * self.row_pitch + x * self.texel_bytes()
    }

    /// Byte offset of the first texel of channel block `block` in image row `y`.
    /// The `width` texels of that block are contiguous from there.
    pub(crate) fn block_row_offset(&self, block: usize, y: usize) -> usize {
        self.texel_offset(block * self.width, y)
    }

    /// Byte offset of logical element `(b, h, w, c)`.
    pub(crate) fn element_offset(&self, b: usize, h: usize, w: usize, c: usize) -> usize {
        let x = (c / CHANNELS_PER_TEXEL) * self.width + w;
        let y = b * self.height + h;
        self.texel_offset(x, y) + (c % CHANNELS_PER_TEXEL) * self.elem_bytes()
    }

    pub(crate) fn nhwc(&self) -> [usize; 4] {
        [self.batch, self.height, self.width, self.channels]
    }
}

/// Storage of a tensor in Image layout.
#[derive(Debug)]
pub struct ImageBuffer {
    context: &'static GpuContext,
    memory: DeviceMemory,
    desc: ImageDesc,
}

impl ImageBuffer {
    /// Allocates a zeroed image on the default GPU context.
    pub(crate) fn allocate(
        nhwc: [usize; 4],
        dtype: DType,
        buffer_type: BufferType,
    ) -> Result<Self, NeuraSliceError> {
        let context = default_context()?;
        let desc = ImageDesc::new(nhwc, dtype, buffer_type, context.config())?;
        let memory = context.alloc_zeroed(desc.size_bytes());
        debug!(
            "Allocated {} image {}x{} texels (pitch {} bytes) for shape {:?}",
            dtype, desc.image_width, desc.image_height, desc.row_pitch, nhwc
        );
        Ok(ImageBuffer { context, memory, desc })
    }

    pub(crate) fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    pub(crate) fn context(&self) -> &'static GpuContext {
        self.context
    }

    pub(crate) fn memory(&self) -> &DeviceMemory {
        &self.memory
    }

    pub fn dtype(&self) -> DType {
        self.desc.dtype
    }

    /// Image extent in texels, `(width, height)`.
    pub fn extent(&self) -> (usize, usize) {
        (self.desc.image_width, self.desc.image_height)
    }
}

/// Element types an image can store, with their little-endian byte encoding.
pub(crate) trait ImageElement: Copy + Send + Sync + Zero + 'static {
    const DTYPE: DType;
    const BYTES: usize;

    fn from_f32(value: f32) -> Self;
    fn to_f32(self) -> f32;
    fn write_le(self, dst: &mut [u8]);
    fn read_le(src: &[u8]) -> Self;
}

impl ImageElement for f32 {
    const DTYPE: DType = DType::F32;
    const BYTES: usize = 4;

    fn from_f32(value: f32) -> Self {
        value
    }

    fn to_f32(self) -> f32 {
        self
    }

    fn write_le(self, dst: &mut [u8]) {
        dst[..Self::BYTES].copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(src: &[u8]) -> Self {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&src[..Self::BYTES]);
        f32::from_le_bytes(bytes)
    }
}

impl ImageElement for f16 {
    const DTYPE: DType = DType::F16;
    const BYTES: usize = 2;

    fn from_f32(value: f32) -> Self {
        f16::from_f32(value)
    }

    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    fn write_le(self, dst: &mut [u8]) {
        dst[..Self::BYTES].copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(src: &[u8]) -> Self {
        let mut bytes = [0u8; 2];
        bytes.copy_from_slice(&src[..Self::BYTES]);
        f16::from_le_bytes(bytes)
    }
}
