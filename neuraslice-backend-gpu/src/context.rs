use crate::alloc::CachingAllocator;
use crate::config::DeviceConfig;
use crate::error::GpuBackendError;
use crate::memory::{DeviceMemory, MappingGuard, MappingGuardMut};
use crate::stream::GpuStream;
use log::{debug, error, info};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Number of devices exposed by the emulated runtime.
const EMULATED_DEVICE_COUNT: u32 = 1;
/// Nominal memory reported for each emulated device.
const EMULATED_TOTAL_MEMORY: usize = 4 * 1024 * 1024 * 1024;

static GPU_INITIALIZED: OnceCell<()> = OnceCell::new();
static DEFAULT_CONTEXT: OnceCell<GpuContext> = OnceCell::new();

/// Initializes the emulated GPU runtime and the logging system.
/// This function is idempotent and thread-safe.
///
/// The logging level can be controlled by the `RUST_LOG` environment variable
/// (e.g., `RUST_LOG=neuraslice_backend_gpu=debug`).
pub fn initialize_gpu_with_logging() -> Result<(), GpuBackendError> {
    // Only the first call has effect. Errors during logger init are reported
    // but don't stop device init (a test harness may own the logger).
    static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();
    LOGGER_INITIALIZED.get_or_init(|| {
        match env_logger::builder().is_test(false).try_init() {
            Ok(_) => info!("NeuraSlice GPU Backend Logger initialized."),
            Err(e) => debug!("Logger already initialized elsewhere: {}", e),
        };
    });

    GPU_INITIALIZED.get_or_init(|| {
        info!("Emulated GPU runtime initialized ({} device(s)).", EMULATED_DEVICE_COUNT);
    });
    Ok(())
}

/// Represents a GPU device with its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuDevice {
    pub id: u32,
    pub name: String,
    pub total_memory: usize,
}

/// Lists all available GPU devices.
pub fn list_devices() -> Result<Vec<GpuDevice>, GpuBackendError> {
    initialize_gpu_with_logging()?;
    if EMULATED_DEVICE_COUNT == 0 {
        return Err(GpuBackendError::NoDevicesFound);
    }
    let devices: Vec<GpuDevice> = (0..EMULATED_DEVICE_COUNT)
        .map(|id| GpuDevice {
            id,
            name: format!("NeuraSlice Emulated GPU {}", id),
            total_memory: EMULATED_TOTAL_MEMORY,
        })
        .collect();
    debug!("Found {} GPU device(s).", devices.len());
    Ok(devices)
}

/// Récupère un device GPU par son index.
pub fn get_device(index: u32) -> Result<GpuDevice, GpuBackendError> {
    list_devices()?
        .into_iter()
        .find(|d| d.id == index)
        .ok_or(GpuBackendError::InvalidDeviceId(index))
}

/// Retourne le nombre de devices GPU disponibles.
pub fn device_count() -> Result<usize, GpuBackendError> {
    Ok(list_devices()?.len())
}

/// Execution context bound to one device: its stream, its memory allocator and
/// its configuration.
#[derive(Debug)]
pub struct GpuContext {
    device_id: u32,
    config: DeviceConfig,
    stream: GpuStream,
    allocator: Arc<CachingAllocator>,
}

impl GpuContext {
    /// Creates a context on `device` with a fresh stream.
    pub fn new(device: &GpuDevice, config: DeviceConfig) -> Result<Self, GpuBackendError> {
        initialize_gpu_with_logging()?;
        config.validate()?;
        let stream = GpuStream::new(&format!("device{}", device.id), config.non_blocking_stream)?;
        let allocator = Arc::new(CachingAllocator::with_limit(config.cache_limit_bytes));
        info!("Created GPU context for device ID: {}", device.id);
        Ok(GpuContext {
            device_id: device.id,
            config,
            stream,
            allocator,
        })
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn stream(&self) -> &GpuStream {
        &self.stream
    }

    pub fn allocator(&self) -> &Arc<CachingAllocator> {
        &self.allocator
    }

    /// Allocates zeroed device memory.
    pub fn alloc_zeroed(&self, size_bytes: usize) -> DeviceMemory {
        self.allocator.alloc(size_bytes)
    }

    pub fn synchronize(&self) -> Result<(), GpuBackendError> {
        self.stream.synchronize()
    }

    /// Waits for the stream, then maps `memory` for host reads.
    ///
    /// # Errors
    /// Fails with the kernel error recorded on `memory` if the kernel that
    /// should have produced it failed or was skipped. Errors of kernels that
    /// did not write `memory` are left for [`GpuContext::synchronize`].
    pub fn map_read<'a>(&self, memory: &'a DeviceMemory) -> Result<MappingGuard<'a>, GpuBackendError> {
        self.stream.wait()?;
        memory.map_read()
    }

    /// Waits for the stream, then maps `memory` for host writes.
    pub fn map_write<'a>(&self, memory: &'a DeviceMemory) -> Result<MappingGuardMut<'a>, GpuBackendError> {
        self.stream.wait()?;
        memory.map_write()
    }
}

/// Returns the process-wide context on device 0, creating it on first use from
/// [`DeviceConfig::from_env`].
pub fn default_context() -> Result<&'static GpuContext, GpuBackendError> {
    DEFAULT_CONTEXT.get_or_try_init(|| {
        let device = get_device(0)?;
        let config = DeviceConfig::from_env().map_err(|e| {
            error!("Invalid GPU configuration from environment: {}", e);
            e
        })?;
        GpuContext::new(&device, config)
    })
}
