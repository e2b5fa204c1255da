use anyhow::Result;
use std::path::Path;

use crate::audio::device::{AudioObjectId, PropertyDescriptor};
use crate::error::HardwareStatus;

/// Trait for audio hardware property access - abstracts the CoreAudio object API
///
/// Every read or write must be preceded by `has_property` and, for writes,
/// `is_property_settable`. Implementations do not perform those checks on
/// the caller's behalf.
pub trait AudioHardwareInterface: Send + Sync {
    /// Whether the object exposes the property at all
    fn has_property(&self, object: AudioObjectId, property: &PropertyDescriptor) -> bool;

    /// Whether a present property may be written
    fn is_property_settable(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<bool, HardwareStatus>;

    /// Read a 32-bit unsigned property (object ids, flags)
    fn get_u32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<u32, HardwareStatus>;

    /// Write a 32-bit unsigned property
    fn set_u32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
        value: u32,
    ) -> std::result::Result<(), HardwareStatus>;

    /// Read a 32-bit float property (scalar volume)
    fn get_f32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<f32, HardwareStatus>;

    /// Write a 32-bit float property
    fn set_f32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
        value: f32,
    ) -> std::result::Result<(), HardwareStatus>;

    /// Read a string property (device name)
    fn get_string(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<String, HardwareStatus>;
}

/// Trait for timed waits - lets the fade loop run without real delays in tests
pub trait TimerInterface: Send + Sync {
    /// Sleep for the specified number of milliseconds
    fn sleep_ms(&self, milliseconds: u64);
}

/// Trait for file system operations - abstracts std::fs for testability
pub trait FileSystemInterface {
    /// Read the entire contents of a configuration file
    fn read_config_file(&self, path: &Path) -> Result<String>;

    /// Write configuration content to a file
    fn write_config_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Check if a configuration file exists
    fn config_file_exists(&self, path: &Path) -> bool;

    /// Create the directory structure for config files
    fn create_config_dir(&self, path: &Path) -> Result<()>;
}
