use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::audio::device::{AudioObjectId, PropertyDescriptor};
use crate::error::HardwareStatus;
use crate::system::traits::{AudioHardwareInterface, FileSystemInterface, TimerInterface};

#[cfg(target_os = "macos")]
pub use super::coreaudio::CoreAudioHardware;

/// Hardware backend for the current target
#[cfg(target_os = "macos")]
pub type PlatformAudioHardware = CoreAudioHardware;

/// Hardware backend for the current target
#[cfg(not(target_os = "macos"))]
pub type PlatformAudioHardware = UnsupportedHardware;

/// `kAudioHardwareUnknownPropertyError` ('who?')
const UNKNOWN_PROPERTY: HardwareStatus = HardwareStatus(0x77686F3F);

/// Fallback for targets without a supported audio HAL. Exposes no properties,
/// so every controller operation degrades to its safe default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedHardware;

impl UnsupportedHardware {
    pub fn new() -> Self {
        debug!("No audio hardware interface on this platform");
        Self
    }
}

impl AudioHardwareInterface for UnsupportedHardware {
    fn has_property(&self, _object: AudioObjectId, _property: &PropertyDescriptor) -> bool {
        false
    }

    fn is_property_settable(
        &self,
        _object: AudioObjectId,
        _property: &PropertyDescriptor,
    ) -> std::result::Result<bool, HardwareStatus> {
        Err(UNKNOWN_PROPERTY)
    }

    fn get_u32(
        &self,
        _object: AudioObjectId,
        _property: &PropertyDescriptor,
    ) -> std::result::Result<u32, HardwareStatus> {
        Err(UNKNOWN_PROPERTY)
    }

    fn set_u32(
        &self,
        _object: AudioObjectId,
        _property: &PropertyDescriptor,
        _value: u32,
    ) -> std::result::Result<(), HardwareStatus> {
        Err(UNKNOWN_PROPERTY)
    }

    fn get_f32(
        &self,
        _object: AudioObjectId,
        _property: &PropertyDescriptor,
    ) -> std::result::Result<f32, HardwareStatus> {
        Err(UNKNOWN_PROPERTY)
    }

    fn set_f32(
        &self,
        _object: AudioObjectId,
        _property: &PropertyDescriptor,
        _value: f32,
    ) -> std::result::Result<(), HardwareStatus> {
        Err(UNKNOWN_PROPERTY)
    }

    fn get_string(
        &self,
        _object: AudioObjectId,
        _property: &PropertyDescriptor,
    ) -> std::result::Result<String, HardwareStatus> {
        Err(UNKNOWN_PROPERTY)
    }
}

/// Production implementation of TimerInterface using the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTimer;

impl TimerInterface for StandardTimer {
    fn sleep_ms(&self, milliseconds: u64) {
        std::thread::sleep(Duration::from_millis(milliseconds));
    }
}

/// Production implementation of FileSystemInterface using std::fs
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFileSystem;

impl FileSystemInterface for StandardFileSystem {
    fn read_config_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))
    }

    fn write_config_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write config file: {}", e))
    }

    fn config_file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_config_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .map_err(|e| anyhow::anyhow!("Failed to create config directory: {}", e))
    }
}
