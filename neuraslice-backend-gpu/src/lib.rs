//! Backend GPU pour NeuraSlice : device émulé, contexte, streams, événements et mémoire image
//!
//! The device is emulated on the host: each context owns an execution stream
//! backed by a worker thread, so kernels run asynchronously with respect to
//! the caller exactly as they would on real hardware. Device memory is only
//! reachable from host code through scoped mappings.

pub mod alloc;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod memory;
pub mod stream;

pub use alloc::CachingAllocator;
pub use config::DeviceConfig;
pub use context::{
    default_context, device_count, get_device, initialize_gpu_with_logging, list_devices, GpuContext,
    GpuDevice,
};
pub use error::GpuBackendError;
pub use event::GpuEvent;
pub use memory::{DeviceMemory, DevicePtr, MappingGuard, MappingGuardMut};
pub use stream::GpuStream;
