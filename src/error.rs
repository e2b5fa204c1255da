use thiserror::Error;

use crate::audio::device::PropertySelector;

/// Raw status code reported by the platform audio layer (an `OSStatus` on macOS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareStatus(pub i32);

impl std::fmt::Display for HardwareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumeError {
    #[error("no default output device could be resolved")]
    DeviceNotFound,

    #[error("device 0x{device:x} does not have the {property} property")]
    PropertyUnsupported {
        device: u32,
        property: PropertySelector,
    },

    #[error("the {property} property of device 0x{device:x} cannot be set")]
    PropertyNotSettable {
        device: u32,
        property: PropertySelector,
    },

    #[error("failed to {operation} {property} on device 0x{device:x}: {status}")]
    HardwareIo {
        device: u32,
        property: PropertySelector,
        operation: &'static str,
        status: HardwareStatus,
    },
}

pub type Result<T> = std::result::Result<T, VolumeError>;
