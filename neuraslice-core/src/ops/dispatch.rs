// neuraslice-core/src/ops/dispatch.rs

use log::debug;

use crate::device::StorageDevice;
use crate::error::NeuraSliceError;
use crate::ops::slice::{slice_cpu, slice_gpu};
use crate::tensor::Tensor;
use crate::types::DType;

/// The Slice kernels that exist, one per supported `(device, dtype)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKernel {
    CpuFloat32,
    GpuFloat32,
    GpuFloat16,
}

impl SliceKernel {
    /// Picks the kernel for an explicit `(device, dtype)` pair.
    ///
    /// There is no fallback: `(CPU, F16)` has no kernel and fails with
    /// `UnsupportedDType`.
    pub fn select(device: StorageDevice, dtype: DType) -> Result<Self, NeuraSliceError> {
        match (device, dtype) {
            (StorageDevice::CPU, DType::F32) => Ok(SliceKernel::CpuFloat32),
            (StorageDevice::GPU, DType::F32) => Ok(SliceKernel::GpuFloat32),
            (StorageDevice::GPU, DType::F16) => Ok(SliceKernel::GpuFloat16),
            (StorageDevice::CPU, DType::F16) => Err(NeuraSliceError::UnsupportedDType {
                device,
                dtype,
                operation: "Slice".to_string(),
            }),
        }
    }

    pub fn device(&self) -> StorageDevice {
        match self {
            SliceKernel::CpuFloat32 => StorageDevice::CPU,
            SliceKernel::GpuFloat32 | SliceKernel::GpuFloat16 => StorageDevice::GPU,
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            SliceKernel::CpuFloat32 | SliceKernel::GpuFloat32 => DType::F32,
            SliceKernel::GpuFloat16 => DType::F16,
        }
    }

    /// Runs the kernel after checking that `input` lives where the kernel expects.
    ///
    /// # Errors
    /// `DeviceMismatch` if the input is on the other device, `UnsupportedDType`
    /// if its dtype differs from the kernel's, plus the kernel's own errors.
    pub fn run(&self, input: &Tensor, num_outputs: usize) -> Result<Vec<Tensor>, NeuraSliceError> {
        let (input_device, input_dtype) = {
            let guard = input.read_data();
            (guard.device, guard.dtype)
        };
        if input_device != self.device() {
            return Err(NeuraSliceError::DeviceMismatch {
                expected: self.device(),
                actual: input_device,
                operation: "Slice".to_string(),
            });
        }
        if input_dtype != self.dtype() {
            return Err(NeuraSliceError::UnsupportedDType {
                device: input_device,
                dtype: input_dtype,
                operation: format!("Slice ({:?})", self),
            });
        }
        debug!("Slice dispatched to {:?} with {} outputs", self, num_outputs);
        match self {
            SliceKernel::CpuFloat32 => slice_cpu(input, num_outputs),
            SliceKernel::GpuFloat32 | SliceKernel::GpuFloat16 => slice_gpu(input, num_outputs),
        }
    }
}

/// Executes Slice on the kernel selected by `(device, dtype)`.
pub fn execute(
    device: StorageDevice,
    dtype: DType,
    input: &Tensor,
    num_outputs: usize,
) -> Result<Vec<Tensor>, NeuraSliceError> {
    SliceKernel::select(device, dtype)?.run(input, num_outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BufferType;
    use crate::tensor::{allocate, randn_seeded};
    use crate::utils::testing::check_slice_outputs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_select() {
        assert_eq!(
            SliceKernel::select(StorageDevice::CPU, DType::F32).unwrap(),
            SliceKernel::CpuFloat32
        );
        assert_eq!(
            SliceKernel::select(StorageDevice::GPU, DType::F32).unwrap(),
            SliceKernel::GpuFloat32
        );
        assert_eq!(
            SliceKernel::select(StorageDevice::GPU, DType::F16).unwrap(),
            SliceKernel::GpuFloat16
        );
        assert!(matches!(
            SliceKernel::select(StorageDevice::CPU, DType::F16),
            Err(NeuraSliceError::UnsupportedDType {
                device: StorageDevice::CPU,
                dtype: DType::F16,
                ..
            })
        ));
    }

    #[test]
    fn test_execute_cpu() {
        let shape = [2, 3, 4, 8];
        let input = randn_seeded(&shape, &mut StdRng::seed_from_u64(9)).unwrap();
        let outputs = execute(StorageDevice::CPU, DType::F32, &input, 4).unwrap();
        check_slice_outputs(&input.get_f32_data().unwrap(), &shape, &outputs, 0.0);
    }

    #[test]
    fn test_execute_gpu_f16() {
        let shape = [2, 3, 4, 8];
        let input = randn_seeded(&shape, &mut StdRng::seed_from_u64(10)).unwrap();
        let image = input.to_image(BufferType::InOutChannel, DType::F16).unwrap();
        let outputs: Vec<_> = execute(StorageDevice::GPU, DType::F16, &image, 2)
            .unwrap()
            .iter()
            .map(|t| t.to_buffer(BufferType::InOutChannel).unwrap())
            .collect();
        check_slice_outputs(&input.get_f32_data().unwrap(), &shape, &outputs, 1e-2);
    }

    #[test]
    fn test_no_cross_device_fallback() {
        let cpu_input = allocate(&[1, 2, 2, 8], DType::F32, StorageDevice::CPU).unwrap();
        assert!(matches!(
            execute(StorageDevice::GPU, DType::F32, &cpu_input, 2),
            Err(NeuraSliceError::DeviceMismatch {
                expected: StorageDevice::GPU,
                actual: StorageDevice::CPU,
                ..
            })
        ));
        let gpu_input = allocate(&[1, 2, 2, 8], DType::F32, StorageDevice::GPU).unwrap();
        assert!(matches!(
            execute(StorageDevice::CPU, DType::F32, &gpu_input, 2),
            Err(NeuraSliceError::DeviceMismatch { .. })
        ));
    }

    #[test]
    fn test_gpu_dtype_must_match() {
        let image = allocate(&[1, 2, 2, 8], DType::F32, StorageDevice::GPU).unwrap();
        assert!(matches!(
            execute(StorageDevice::GPU, DType::F16, &image, 2),
            Err(NeuraSliceError::UnsupportedDType { dtype: DType::F32, .. })
        ));
    }

    #[test]
    fn test_slice_channels_uses_own_device() {
        let image = allocate(&[1, 2, 2, 8], DType::F16, StorageDevice::GPU).unwrap();
        let outputs = image.slice_channels(2).unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|t| t.dtype() == DType::F16));
    }
}
