use std::fmt::Debug;

/// Represents the physical location where tensor data is stored.
///
/// Tensors can reside on different devices, influencing where computations
/// are performed and how their storage is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageDevice {
    /// Data is stored in main system memory (RAM).
    /// This is the default device.
    #[default]
    CPU,
    /// Data is stored as images on the GPU.
    GPU,
}

/// Physical arrangement of a tensor's storage.
///
/// Derived from the device, never chosen independently of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Flat, row-major, channel-last (NHWC) host storage.
    Buffer,
    /// Channel-packed texture storage on the GPU. Opaque to callers.
    Image,
}

impl StorageDevice {
    /// The only layout a tensor on this device may have.
    pub fn layout(self) -> Layout {
        match self {
            StorageDevice::CPU => Layout::Buffer,
            StorageDevice::GPU => Layout::Image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_follows_device() {
        assert_eq!(StorageDevice::CPU.layout(), Layout::Buffer);
        assert_eq!(StorageDevice::GPU.layout(), Layout::Image);
        assert_eq!(StorageDevice::default(), StorageDevice::CPU);
    }
}
