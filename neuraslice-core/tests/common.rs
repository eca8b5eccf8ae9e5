use neuraslice_core::tensor::{randn_seeded, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Shared by several integration test crates; each one uses a different subset.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[allow(dead_code)]
pub fn create_random_tensor(shape: &[usize], seed: u64) -> Tensor {
    randn_seeded(shape, &mut seeded_rng(seed)).expect("Test tensor creation failed")
}

#[allow(dead_code)]
pub fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Test tensor creation failed")
}
