use rand::Rng;

use crate::tensor::Tensor;

/// Checks if a tensor matches an expected shape and data within tolerance.
/// Assumes the actual tensor is in Buffer layout (CPU); its values are widened to f32.
/// Panics if shapes differ or data differs significantly.
///
/// The comparison is relative: `|a - e| <= tolerance * max(|e|, 1)`, so a
/// tolerance of `0.0` demands bit-exact f32 values.
pub fn check_tensor_near(actual: &Tensor, expected_shape: &[usize], expected_data: &[f32], tolerance: f32) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");

    let actual_data_vec = actual
        .get_f32_data()
        .expect("Failed to get CPU data in check_tensor_near");

    assert_eq!(actual_data_vec.len(), expected_data.len(), "Data length mismatch");

    for (i, (a, e)) in actual_data_vec.iter().zip(expected_data.iter()).enumerate() {
        let diff = (*a - *e).abs();
        let bound = tolerance * e.abs().max(1.0);
        if diff > bound {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Expected contents of output `index` when slicing `input` (NHWC, flat) into
/// parts of `output_channels` channels.
pub fn expected_slice(input: &[f32], channels: usize, output_channels: usize, index: usize) -> Vec<f32> {
    let start = index * output_channels;
    input
        .chunks_exact(channels)
        .flat_map(|pixel| pixel[start..start + output_channels].iter().copied())
        .collect()
}

/// Checks every output of a Slice of `input_data` (shape `input_shape`)
/// against the channel ranges it must hold. Outputs must be Buffer-layout.
pub fn check_slice_outputs(input_data: &[f32], input_shape: &[usize], outputs: &[Tensor], tolerance: f32) {
    let channels = input_shape[3];
    assert!(!outputs.is_empty(), "Slice produced no outputs");
    assert_eq!(channels % outputs.len(), 0, "Channels not divisible by output count");
    let output_channels = channels / outputs.len();
    let output_shape = [input_shape[0], input_shape[1], input_shape[2], output_channels];
    for (index, output) in outputs.iter().enumerate() {
        let expected = expected_slice(input_data, channels, output_channels, index);
        check_tensor_near(output, &output_shape, &expected, tolerance);
    }
}

/// Random Slice input shape: `B = 3 + rand(10)`, `H = 13 + rand(10)`,
/// `W = 17 + rand(10)` and `C = num_outputs * 4 * (1 + rand(10))`.
pub fn random_slice_shape<R: Rng + ?Sized>(rng: &mut R, num_outputs: usize) -> Vec<usize> {
    let output_channels = 4 * rng.gen_range(1..=10);
    vec![
        3 + rng.gen_range(0..10),
        13 + rng.gen_range(0..10),
        17 + rng.gen_range(0..10),
        output_channels * num_outputs,
    ]
}
