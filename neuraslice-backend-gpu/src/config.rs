//! Configuration du device GPU émulé

use crate::alloc::DEFAULT_CACHE_LIMIT_BYTES;
use crate::error::GpuBackendError;
use log::debug;
use std::env;

/// Environment variable overriding [`DeviceConfig::row_pitch_alignment`].
pub const ENV_ROW_ALIGN: &str = "NEURASLICE_GPU_ROW_ALIGN";
/// Environment variable overriding [`DeviceConfig::max_image_extent`].
pub const ENV_MAX_IMAGE_EXTENT: &str = "NEURASLICE_GPU_MAX_IMAGE_EXTENT";
/// Environment variable overriding [`DeviceConfig::cache_limit_bytes`].
pub const ENV_CACHE_LIMIT: &str = "NEURASLICE_GPU_CACHE_LIMIT";
/// Environment variable forcing a blocking stream when set to `1` or `true`.
pub const ENV_BLOCKING_STREAM: &str = "NEURASLICE_GPU_BLOCKING_STREAM";

/// Tunables of the emulated device.
///
/// Images are stored row by row; each row is padded up to `row_pitch_alignment`
/// bytes, the way texture memory is pitched on real hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Row pitch alignment of image memory, in bytes. Must be a power of two.
    pub row_pitch_alignment: usize,
    /// Maximum width and height of an image, in texels.
    pub max_image_extent: usize,
    /// If true, the execution stream does not wait on the host between submissions.
    pub non_blocking_stream: bool,
    /// Maximum bytes of released memory the allocator keeps for reuse.
    pub cache_limit_bytes: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            row_pitch_alignment: 64,
            max_image_extent: 16384,
            non_blocking_stream: true,
            cache_limit_bytes: DEFAULT_CACHE_LIMIT_BYTES,
        }
    }
}

impl DeviceConfig {
    /// Builds a configuration from the defaults, overridden by the `NEURASLICE_GPU_*`
    /// environment variables.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a variable is set but cannot be parsed, or if the
    /// resulting configuration does not pass [`DeviceConfig::validate`].
    pub fn from_env() -> Result<Self, GpuBackendError> {
        let mut config = DeviceConfig::default();
        if let Some(value) = read_var(ENV_ROW_ALIGN) {
            config.row_pitch_alignment = parse_usize(ENV_ROW_ALIGN, &value)?;
        }
        if let Some(value) = read_var(ENV_MAX_IMAGE_EXTENT) {
            config.max_image_extent = parse_usize(ENV_MAX_IMAGE_EXTENT, &value)?;
        }
        if let Some(value) = read_var(ENV_CACHE_LIMIT) {
            config.cache_limit_bytes = parse_usize(ENV_CACHE_LIMIT, &value)?;
        }
        if let Some(value) = read_var(ENV_BLOCKING_STREAM) {
            config.non_blocking_stream = !matches!(value.as_str(), "1" | "true" | "TRUE");
        }
        config.validate()?;
        debug!("Device configuration: {:?}", config);
        Ok(config)
    }

    /// Checks the invariants the image addressing relies on.
    pub fn validate(&self) -> Result<(), GpuBackendError> {
        if self.row_pitch_alignment == 0 || !self.row_pitch_alignment.is_power_of_two() {
            return Err(GpuBackendError::InvalidConfig(format!(
                "row_pitch_alignment must be a nonzero power of two, got {}",
                self.row_pitch_alignment
            )));
        }
        if self.max_image_extent == 0 {
            return Err(GpuBackendError::InvalidConfig(
                "max_image_extent must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Rounds `row_bytes` up to the configured pitch alignment.
    pub fn aligned_pitch(&self, row_bytes: usize) -> usize {
        let align = self.row_pitch_alignment;
        (row_bytes + align - 1) & !(align - 1)
    }

    /// Fails with `ImageTooLarge` if an image of `width` x `height` texels does not fit.
    pub fn check_image_extent(&self, width: usize, height: usize) -> Result<(), GpuBackendError> {
        if width > self.max_image_extent || height > self.max_image_extent {
            return Err(GpuBackendError::ImageTooLarge {
                width,
                height,
                max_extent: self.max_image_extent,
            });
        }
        Ok(())
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_usize(name: &str, value: &str) -> Result<usize, GpuBackendError> {
    value.parse::<usize>().map_err(|e| {
        GpuBackendError::InvalidConfig(format!("{}='{}' is not a valid integer: {}", name, value, e))
    })
}
