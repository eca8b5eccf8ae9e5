use std::fmt::Debug;

use half::f16;

use crate::device::{Layout, StorageDevice};
use crate::error::NeuraSliceError;
use crate::image::ImageBuffer;
use crate::types::DType;

/// Enum representing different buffer types based on device and data type.
/// This allows TensorData to hold different kinds of data buffers.
#[derive(Debug)]
pub enum Buffer {
    /// Data resides on the CPU, in Buffer layout.
    Cpu(CpuBuffer),
    /// Data resides on the GPU, in Image layout. Its addressing is private to the
    /// layout converter and the GPU kernels.
    Image(ImageBuffer),
}

/// Enum for CPU-specific buffer types.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuBuffer {
    /// Buffer holding f32 data on the CPU.
    F32(Vec<f32>),
    /// Buffer holding f16 data on the CPU.
    F16(Vec<f16>),
}

impl CpuBuffer {
    /// Zero-filled buffer of `numel` elements.
    pub fn zeros(dtype: DType, numel: usize) -> Self {
        match dtype {
            DType::F32 => CpuBuffer::F32(vec![0.0; numel]),
            DType::F16 => CpuBuffer::F16(vec![f16::ZERO; numel]),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            CpuBuffer::F32(_) => DType::F32,
            CpuBuffer::F16(_) => DType::F16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CpuBuffer::F32(data) => data.len(),
            CpuBuffer::F16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the element at `offset`, widened to f32.
    pub(crate) fn get_f32(&self, offset: usize) -> Option<f32> {
        match self {
            CpuBuffer::F32(data) => data.get(offset).copied(),
            CpuBuffer::F16(data) => data.get(offset).map(|v| v.to_f32()),
        }
    }

    /// Writes `value` at `offset`, rounding to the buffer's precision.
    pub(crate) fn set_f32(&mut self, offset: usize, value: f32) -> Option<()> {
        match self {
            CpuBuffer::F32(data) => data.get_mut(offset).map(|slot| *slot = value),
            CpuBuffer::F16(data) => data.get_mut(offset).map(|slot| *slot = f16::from_f32(value)),
        }
    }

    /// Copies the whole buffer out as f32 values.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            CpuBuffer::F32(data) => data.clone(),
            CpuBuffer::F16(data) => data.iter().map(|v| v.to_f32()).collect(),
        }
    }
}

impl Buffer {
    pub fn layout(&self) -> Layout {
        match self {
            Buffer::Cpu(_) => Layout::Buffer,
            Buffer::Image(_) => Layout::Image,
        }
    }

    /// Attempts to get the host storage of a Buffer-layout tensor.
    ///
    /// Returns `UnsupportedLayout` for images.
    pub fn try_get_cpu(&self, operation: &str) -> Result<&CpuBuffer, NeuraSliceError> {
        match self {
            Buffer::Cpu(cpu) => Ok(cpu),
            Buffer::Image(_) => Err(NeuraSliceError::UnsupportedLayout {
                expected: Layout::Buffer,
                actual: Layout::Image,
                operation: operation.to_string(),
            }),
        }
    }

    pub fn try_get_cpu_mut(&mut self, operation: &str) -> Result<&mut CpuBuffer, NeuraSliceError> {
        match self {
            Buffer::Cpu(cpu) => Ok(cpu),
            Buffer::Image(_) => Err(NeuraSliceError::UnsupportedLayout {
                expected: Layout::Buffer,
                actual: Layout::Image,
                operation: operation.to_string(),
            }),
        }
    }

    /// Attempts to get a reference to the underlying f32 slice if this is a CPU F32 buffer.
    ///
    /// Returns an error if the buffer is not a CPU buffer or not of type F32.
    pub fn try_get_cpu_f32(&self, operation: &str) -> Result<&[f32], NeuraSliceError> {
        match self.try_get_cpu(operation)? {
            CpuBuffer::F32(data) => Ok(data.as_slice()),
            CpuBuffer::F16(_) => Err(NeuraSliceError::UnsupportedDType {
                device: StorageDevice::CPU,
                dtype: DType::F16,
                operation: operation.to_string(),
            }),
        }
    }

    /// Attempts to get the image storage of a GPU tensor.
    ///
    /// Returns `UnsupportedLayout` for host buffers.
    pub fn try_get_image(&self, operation: &str) -> Result<&ImageBuffer, NeuraSliceError> {
        match self {
            Buffer::Image(image) => Ok(image),
            Buffer::Cpu(_) => Err(NeuraSliceError::UnsupportedLayout {
                expected: Layout::Image,
                actual: Layout::Buffer,
                operation: operation.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_per_dtype() {
        let f32_buf = CpuBuffer::zeros(DType::F32, 3);
        assert_eq!(f32_buf, CpuBuffer::F32(vec![0.0; 3]));
        let f16_buf = CpuBuffer::zeros(DType::F16, 2);
        assert_eq!(f16_buf.dtype(), DType::F16);
        assert_eq!(f16_buf.to_f32_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_f16_set_rounds() {
        let mut buf = CpuBuffer::zeros(DType::F16, 1);
        buf.set_f32(0, 0.1).unwrap();
        let v = buf.get_f32(0).unwrap();
        assert!((v - 0.1).abs() < 1e-3);
        assert_ne!(v, 0.1);
    }

    #[test]
    fn test_out_of_range_access() {
        let mut buf = CpuBuffer::zeros(DType::F32, 2);
        assert_eq!(buf.get_f32(2), None);
        assert_eq!(buf.set_f32(5, 1.0), None);
    }

    #[test]
    fn test_cpu_f32_access_rejects_f16() {
        let buffer = Buffer::Cpu(CpuBuffer::zeros(DType::F16, 4));
        assert!(matches!(
            buffer.try_get_cpu_f32("test"),
            Err(NeuraSliceError::UnsupportedDType { dtype: DType::F16, .. })
        ));
        assert!(matches!(
            buffer.try_get_image("test"),
            Err(NeuraSliceError::UnsupportedLayout { expected: Layout::Image, .. })
        ));
    }
}
