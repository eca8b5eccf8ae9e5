// src/tensor/debug.rs
use crate::buffer::Buffer;
use crate::tensor::Tensor;
use std::fmt;

// Manual implementation of Debug trait
impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.read() {
            Ok(guard) => {
                write!(
                    f,
                    "Tensor(shape={:?}, device={:?}, layout={:?}, dtype={:?}",
                    guard.shape,
                    guard.device,
                    guard.layout(),
                    guard.dtype
                )?;
                if let Buffer::Image(image) = &guard.buffer {
                    let (width, height) = image.extent();
                    write!(f, ", image={}x{}", width, height)?;
                }
                write!(f, ")")
            }
            Err(_) => write!(f, "Tensor(Error: RwLock poisoned)"),
        }
    }
}
