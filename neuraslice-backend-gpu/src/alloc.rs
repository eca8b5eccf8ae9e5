//! Allocateur mémoire GPU avec cache (PyTorch-like)

use crate::memory::DeviceMemory;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cache size used by [`CachingAllocator::new`].
pub const DEFAULT_CACHE_LIMIT_BYTES: usize = 256 * 1024 * 1024;

/// Size-bucketed cache of device memory blocks.
///
/// Freed blocks are kept per exact byte size and handed out again, zeroed,
/// on the next allocation of the same size. At most `limit_bytes` are parked;
/// a block released while the cache is full is freed instead.
#[derive(Debug)]
pub struct CachingAllocator {
    cache: Mutex<HashMap<usize, Vec<Vec<u8>>>>,
    live_bytes: AtomicUsize,
    limit_bytes: usize,
}

impl Default for CachingAllocator {
    fn default() -> Self {
        Self::with_limit(DEFAULT_CACHE_LIMIT_BYTES)
    }
}

impl CachingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator that parks at most `limit_bytes` of released blocks. `0` disables caching.
    pub fn with_limit(limit_bytes: usize) -> Self {
        CachingAllocator {
            cache: Mutex::new(HashMap::new()),
            live_bytes: AtomicUsize::new(0),
            limit_bytes,
        }
    }

    pub fn limit_bytes(&self) -> usize {
        self.limit_bytes
    }

    /// Allocates `size_bytes` of zeroed device memory.
    pub fn alloc(self: &Arc<Self>, size_bytes: usize) -> DeviceMemory {
        let reused = self
            .lock_cache()
            .get_mut(&size_bytes)
            .and_then(|blocks| blocks.pop());
        let bytes = match reused {
            Some(mut block) => {
                trace!("Reusing cached block of {} bytes", size_bytes);
                block.fill(0);
                block
            }
            None => {
                trace!("Allocating new block of {} bytes", size_bytes);
                vec![0u8; size_bytes]
            }
        };
        self.live_bytes.fetch_add(size_bytes, Ordering::Relaxed);
        DeviceMemory::new(bytes, Arc::clone(self))
    }

    /// Returns a block to the cache, or frees it if the cache is full.
    /// Called when a `DeviceMemory` is dropped.
    pub(crate) fn release(&self, block: Vec<u8>) {
        let size_bytes = block.len();
        self.live_bytes.fetch_sub(size_bytes, Ordering::Relaxed);
        let mut cache = self.lock_cache();
        if cached_size(&cache) + size_bytes > self.limit_bytes {
            trace!("Cache full, freeing block of {} bytes", size_bytes);
            return;
        }
        cache.entry(size_bytes).or_default().push(block);
    }

    /// Accounts for a block whose storage was dropped elsewhere (still referenced by a kernel).
    pub(crate) fn forget(&self, size_bytes: usize) {
        self.live_bytes.fetch_sub(size_bytes, Ordering::Relaxed);
    }

    /// Bytes currently held by live `DeviceMemory` handles.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }

    /// Bytes parked in the cache, ready for reuse.
    pub fn cached_bytes(&self) -> usize {
        cached_size(&self.lock_cache())
    }

    pub fn empty_cache(&self) {
        let mut cache = self.lock_cache();
        let freed = cached_size(&cache);
        cache.clear();
        debug!("Emptied allocator cache ({} bytes released)", freed);
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<usize, Vec<Vec<u8>>>> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn cached_size(cache: &HashMap<usize, Vec<Vec<u8>>>) -> usize {
    cache.iter().map(|(size, blocks)| size * blocks.len()).sum()
}
