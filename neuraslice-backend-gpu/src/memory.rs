//! Mémoire device et mappings hôte

use crate::alloc::CachingAllocator;
use crate::error::GpuBackendError;
use log::trace;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Error left on a block by the kernel that should have produced its contents.
type Fault = Arc<Mutex<Option<GpuBackendError>>>;

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// A block of device memory, owned exclusively by one handle.
///
/// Kernels reach the bytes through a [`DevicePtr`]; host code through
/// [`MappingGuard`] / [`MappingGuardMut`], which should only be taken once
/// the stream that wrote the block has been synchronized
/// (see `GpuContext::map_read`).
///
/// A kernel that fails, or that is skipped because one of its inputs is
/// faulted, leaves its error on every block it writes. Such a block refuses
/// host reads until it is dropped.
#[derive(Debug)]
pub struct DeviceMemory {
    id: u64,
    size_bytes: usize,
    bytes: Arc<RwLock<Vec<u8>>>,
    fault: Fault,
    allocator: Arc<CachingAllocator>,
}

/// Shared handle to a block, captured by kernels running on a stream.
#[derive(Debug, Clone)]
pub struct DevicePtr {
    id: u64,
    bytes: Arc<RwLock<Vec<u8>>>,
    fault: Fault,
}

fn read_fault(fault: &Fault) -> Option<GpuBackendError> {
    fault.lock().unwrap_or_else(|p| p.into_inner()).clone()
}

impl DeviceMemory {
    pub(crate) fn new(bytes: Vec<u8>, allocator: Arc<CachingAllocator>) -> Self {
        let id = NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed);
        DeviceMemory {
            id,
            size_bytes: bytes.len(),
            bytes: Arc::new(RwLock::new(bytes)),
            fault: Arc::new(Mutex::new(None)),
            allocator,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn device_ptr(&self) -> DevicePtr {
        DevicePtr {
            id: self.id,
            bytes: Arc::clone(&self.bytes),
            fault: Arc::clone(&self.fault),
        }
    }

    /// Error of the kernel that failed to produce this block, if any.
    pub fn fault(&self) -> Option<GpuBackendError> {
        read_fault(&self.fault)
    }

    /// Maps the block for host reads. The mapping is released when the guard drops.
    ///
    /// # Errors
    /// Returns the recorded kernel error if the block is faulted.
    pub fn map_read(&self) -> Result<MappingGuard<'_>, GpuBackendError> {
        if let Some(fault) = self.fault() {
            return Err(fault);
        }
        let guard = self
            .bytes
            .read()
            .map_err(|_| GpuBackendError::MappingFailed(format!("block {} is poisoned", self.id)))?;
        trace!("Mapped block {} for host read", self.id);
        Ok(MappingGuard { id: self.id, guard })
    }

    /// Maps the block for host writes. The mapping is released when the guard drops.
    pub fn map_write(&self) -> Result<MappingGuardMut<'_>, GpuBackendError> {
        let guard = self
            .bytes
            .write()
            .map_err(|_| GpuBackendError::MappingFailed(format!("block {} is poisoned", self.id)))?;
        trace!("Mapped block {} for host write", self.id);
        Ok(MappingGuardMut { id: self.id, guard })
    }
}

impl Drop for DeviceMemory {
    fn drop(&mut self) {
        let bytes = std::mem::replace(&mut self.bytes, Arc::new(RwLock::new(Vec::new())));
        match Arc::try_unwrap(bytes) {
            Ok(lock) => {
                let block = lock.into_inner().unwrap_or_else(|p| p.into_inner());
                self.allocator.release(block);
            }
            // A queued kernel still holds the block; it is freed when that kernel finishes.
            Err(_) => self.allocator.forget(self.size_bytes),
        }
    }
}

impl DevicePtr {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn fault(&self) -> Option<GpuBackendError> {
        read_fault(&self.fault)
    }

    /// Records `error` on the block. The first recorded error is kept.
    pub(crate) fn mark_faulted(&self, error: GpuBackendError) {
        self.fault
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get_or_insert(error);
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Vec<u8>>, GpuBackendError> {
        self.bytes
            .read()
            .map_err(|_| GpuBackendError::MappingFailed(format!("block {} is poisoned", self.id)))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<u8>>, GpuBackendError> {
        self.bytes
            .write()
            .map_err(|_| GpuBackendError::MappingFailed(format!("block {} is poisoned", self.id)))
    }
}

/// Scoped read-only host view of a device block.
pub struct MappingGuard<'a> {
    id: u64,
    guard: RwLockReadGuard<'a, Vec<u8>>,
}

impl Deref for MappingGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.guard.as_slice()
    }
}

impl Drop for MappingGuard<'_> {
    fn drop(&mut self) {
        trace!("Unmapped block {} (read)", self.id);
    }
}

/// Scoped writable host view of a device block.
pub struct MappingGuardMut<'a> {
    id: u64,
    guard: RwLockWriteGuard<'a, Vec<u8>>,
}

impl Deref for MappingGuardMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.guard.as_slice()
    }
}

impl DerefMut for MappingGuardMut<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.guard.as_mut_slice()
    }
}

impl Drop for MappingGuardMut<'_> {
    fn drop(&mut self) {
        trace!("Unmapped block {} (write)", self.id);
    }
}
