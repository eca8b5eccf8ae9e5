// Déclare les modules principaux de la crate
pub mod buffer;
pub mod device;
pub mod error;
pub mod image;
pub mod ops;
pub mod tensor;
pub mod tensor_data;
pub mod types;
pub mod utils;

// Ré-exporte les types principaux pour qu'ils soient accessibles via `neuraslice_core::Tensor`, etc.
pub use device::{Layout, StorageDevice};
pub use error::NeuraSliceError;
pub use image::BufferType;
pub use tensor::Tensor;
pub use types::DType;
// Re-export traits required by public functions/structs
pub use half;
pub use num_traits;
