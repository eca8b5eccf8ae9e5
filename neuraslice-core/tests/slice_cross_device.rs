use approx::assert_relative_eq;
use neuraslice_core::{
    ops::dispatch::execute,
    utils::testing::{check_slice_outputs, random_slice_shape},
    BufferType, DType, NeuraSliceError, StorageDevice, Tensor,
};

mod common;
use common::{create_random_tensor, create_test_tensor, init_logging, seeded_rng};

/// Runs Slice on `device`/`dtype` and brings every output back to a CPU F32 tensor.
fn run_slice(device: StorageDevice, dtype: DType, input: &Tensor, num_outputs: usize) -> Vec<Tensor> {
    match device {
        StorageDevice::CPU => execute(device, dtype, input, num_outputs).expect("CPU slice failed"),
        StorageDevice::GPU => {
            let image = input
                .to_image(BufferType::InOutChannel, dtype)
                .expect("to_image failed");
            execute(device, dtype, &image, num_outputs)
                .expect("GPU slice failed")
                .iter()
                .map(|t| t.to_buffer(BufferType::InOutChannel).expect("to_buffer failed"))
                .collect()
        }
    }
}

#[test]
fn test_random_slice_all_backends() {
    init_logging();
    let mut rng = seeded_rng(0x5eed);
    for num_outputs in [2, 4, 11] {
        let shape = random_slice_shape(&mut rng, num_outputs);
        let input = neuraslice_core::tensor::randn_seeded(&shape, &mut rng).unwrap();
        let data = input.get_f32_data().unwrap();

        let cpu = run_slice(StorageDevice::CPU, DType::F32, &input, num_outputs);
        check_slice_outputs(&data, &shape, &cpu, 0.0);

        let gpu_f32 = run_slice(StorageDevice::GPU, DType::F32, &input, num_outputs);
        check_slice_outputs(&data, &shape, &gpu_f32, 0.0);

        let gpu_f16 = run_slice(StorageDevice::GPU, DType::F16, &input, num_outputs);
        check_slice_outputs(&data, &shape, &gpu_f16, 1e-2);
    }
}

#[test]
fn test_cross_device_equivalence() {
    init_logging();
    let shape = [3, 13, 17, 8];
    let input = create_random_tensor(&shape, 17);
    let cpu = run_slice(StorageDevice::CPU, DType::F32, &input, 2);
    let gpu = run_slice(StorageDevice::GPU, DType::F16, &input, 2);
    assert_eq!(cpu.len(), gpu.len());
    for (c, g) in cpu.iter().zip(gpu.iter()) {
        assert_eq!(c.shape(), vec![3, 13, 17, 4]);
        assert_eq!(c.shape(), g.shape());
        for (a, b) in c.get_f32_data().unwrap().iter().zip(g.get_f32_data().unwrap().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-2, max_relative = 1e-2);
        }
    }
}

#[test]
fn test_channel_ranges_forty_four_into_eleven() {
    let shape = vec![1, 2, 2, 44];
    // Every element holds its channel index.
    let data: Vec<f32> = (0..4 * 44).map(|i| (i % 44) as f32).collect();
    let input = create_test_tensor(data, shape);
    for device in [StorageDevice::CPU, StorageDevice::GPU] {
        let outputs = run_slice(device, DType::F32, &input, 11);
        assert_eq!(outputs.len(), 11);
        for (i, output) in outputs.iter().enumerate() {
            assert_eq!(output.shape(), vec![1, 2, 2, 4]);
            let expected: Vec<f32> = (0..4).flat_map(|_| (i * 4..i * 4 + 4).map(|c| c as f32)).collect();
            assert_eq!(output.get_f32_data().unwrap(), expected);
        }
    }
}

#[test]
fn test_indivisible_channels_on_every_backend() {
    let input = create_random_tensor(&[2, 3, 4, 9], 1);
    assert!(matches!(
        execute(StorageDevice::CPU, DType::F32, &input, 2),
        Err(NeuraSliceError::IndivisibleChannels { channels: 9, num_outputs: 2 })
    ));
    for dtype in [DType::F32, DType::F16] {
        let image = input.to_image(BufferType::InOutChannel, dtype).unwrap();
        assert!(matches!(
            execute(StorageDevice::GPU, dtype, &image, 4),
            Err(NeuraSliceError::IndivisibleChannels { channels: 9, num_outputs: 4 })
        ));
    }
}

#[test]
fn test_cpu_f16_has_no_kernel() {
    let input = create_random_tensor(&[1, 2, 2, 4], 2);
    assert!(matches!(
        execute(StorageDevice::CPU, DType::F16, &input, 2),
        Err(NeuraSliceError::UnsupportedDType { .. })
    ));
}
