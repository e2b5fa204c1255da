use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::device::{AudioObjectId, PropertyDescriptor, PropertySelector, SYSTEM_OBJECT};
use crate::error::HardwareStatus;
use crate::system::traits::{AudioHardwareInterface, FileSystemInterface, TimerInterface};

/// 'who?' - the object does not have the property
pub const STATUS_UNKNOWN_PROPERTY: HardwareStatus = HardwareStatus(0x77686F3F);
/// 'nope' - the property is not settable
pub const STATUS_ILLEGAL_OPERATION: HardwareStatus = HardwareStatus(0x6E6F7065);
/// 'what' - injected failure
pub const STATUS_UNSPECIFIED: HardwareStatus = HardwareStatus(0x77686174);
/// '!obj' - no such object
pub const STATUS_BAD_OBJECT: HardwareStatus = HardwareStatus(0x216F626A);

/// One simulated output device
#[derive(Debug, Clone, PartialEq)]
pub struct MockDevice {
    pub name: Option<String>,
    pub volume: f32,
    pub has_volume: bool,
    pub volume_settable: bool,
    pub muted: bool,
    pub has_mute: bool,
    pub mute_settable: bool,
}

impl MockDevice {
    /// A fully capable, unmuted device at half volume
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            volume: 0.5,
            has_volume: true,
            volume_settable: true,
            muted: false,
            has_mute: true,
            mute_settable: true,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn without_volume(mut self) -> Self {
        self.has_volume = false;
        self
    }

    pub fn read_only_volume(mut self) -> Self {
        self.volume_settable = false;
        self
    }

    pub fn without_mute(mut self) -> Self {
        self.has_mute = false;
        self
    }

    pub fn read_only_mute(mut self) -> Self {
        self.mute_settable = false;
        self
    }

    pub fn without_name(mut self) -> Self {
        self.name = None;
        self
    }

    fn supports(&self, selector: PropertySelector) -> bool {
        match selector {
            PropertySelector::VirtualMainVolume => self.has_volume,
            PropertySelector::Mute => self.has_mute,
            PropertySelector::DeviceName => self.name.is_some(),
            PropertySelector::DefaultOutputDevice => false,
        }
    }

    fn settable(&self, selector: PropertySelector) -> bool {
        match selector {
            PropertySelector::VirtualMainVolume => self.has_volume && self.volume_settable,
            PropertySelector::Mute => self.has_mute && self.mute_settable,
            _ => false,
        }
    }
}

/// A write that reached the simulated hardware
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareWrite {
    Volume { device: AudioObjectId, value: f32 },
    Mute { device: AudioObjectId, muted: bool },
}

/// Mock audio hardware for testing - provides controllable property behavior
#[derive(Clone, Default)]
pub struct MockAudioHardware {
    pub devices: Arc<Mutex<HashMap<AudioObjectId, MockDevice>>>,
    /// `None` means the host does not expose a default output device property
    pub default_output: Arc<Mutex<Option<AudioObjectId>>>,
    pub writes: Arc<Mutex<Vec<HardwareWrite>>>,
    pub should_fail_default_lookup: Arc<AtomicBool>,
    pub should_fail_reads: Arc<AtomicBool>,
    pub should_fail_writes: Arc<AtomicBool>,
    pub should_fail_settable_query: Arc<AtomicBool>,
}

impl MockAudioHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// A system whose default output is the given device
    pub fn with_default_device(id: AudioObjectId, device: MockDevice) -> Self {
        let hardware = Self::new();
        hardware.add_device(id, device);
        hardware.set_mock_default_output(Some(id));
        hardware
    }

    /// Add a device to the mock system
    pub fn add_device(&self, id: AudioObjectId, device: MockDevice) {
        self.devices.lock().unwrap().insert(id, device);
    }

    /// Remove a device; the default output keeps pointing at it, as after a hot unplug
    pub fn remove_device(&self, id: AudioObjectId) {
        self.devices.lock().unwrap().remove(&id);
    }

    /// Set the default output device
    pub fn set_mock_default_output(&self, id: Option<AudioObjectId>) {
        *self.default_output.lock().unwrap() = id;
    }

    pub fn device(&self, id: AudioObjectId) -> Option<MockDevice> {
        self.devices.lock().unwrap().get(&id).cloned()
    }

    pub fn volume_of(&self, id: AudioObjectId) -> Option<f32> {
        self.device(id).map(|d| d.volume)
    }

    pub fn is_muted(&self, id: AudioObjectId) -> Option<bool> {
        self.device(id).map(|d| d.muted)
    }

    /// Get all writes that reached the hardware
    pub fn get_writes(&self) -> Vec<HardwareWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Only the volume values written, in order
    pub fn get_volume_writes(&self) -> Vec<f32> {
        self.get_writes()
            .into_iter()
            .filter_map(|w| match w {
                HardwareWrite::Volume { value, .. } => Some(value),
                HardwareWrite::Mute { .. } => None,
            })
            .collect()
    }

    /// Only the mute values written, in order
    pub fn get_mute_writes(&self) -> Vec<bool> {
        self.get_writes()
            .into_iter()
            .filter_map(|w| match w {
                HardwareWrite::Mute { muted, .. } => Some(muted),
                HardwareWrite::Volume { .. } => None,
            })
            .collect()
    }

    /// Clear the history of writes
    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }

    /// Configure the mock to fail reading the default output device
    pub fn set_default_lookup_failure(&self, should_fail: bool) {
        self.should_fail_default_lookup
            .store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail all device property reads
    pub fn set_read_failure(&self, should_fail: bool) {
        self.should_fail_reads.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail all device property writes
    pub fn set_write_failure(&self, should_fail: bool) {
        self.should_fail_writes.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail settability queries
    pub fn set_settable_query_failure(&self, should_fail: bool) {
        self.should_fail_settable_query
            .store(should_fail, Ordering::Relaxed);
    }

    fn with_device<R>(
        &self,
        object: AudioObjectId,
        f: impl FnOnce(&mut MockDevice) -> std::result::Result<R, HardwareStatus>,
    ) -> std::result::Result<R, HardwareStatus> {
        let mut devices = self.devices.lock().unwrap();
        match devices.get_mut(&object) {
            Some(device) => f(device),
            None => Err(STATUS_BAD_OBJECT),
        }
    }
}

impl AudioHardwareInterface for MockAudioHardware {
    fn has_property(&self, object: AudioObjectId, property: &PropertyDescriptor) -> bool {
        if object == SYSTEM_OBJECT {
            return property.selector == PropertySelector::DefaultOutputDevice
                && self.default_output.lock().unwrap().is_some();
        }
        self.devices
            .lock()
            .unwrap()
            .get(&object)
            .is_some_and(|d| d.supports(property.selector))
    }

    fn is_property_settable(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<bool, HardwareStatus> {
        if self.should_fail_settable_query.load(Ordering::Relaxed) {
            return Err(STATUS_UNSPECIFIED);
        }
        if object == SYSTEM_OBJECT {
            return Ok(false);
        }
        self.with_device(object, |d| Ok(d.settable(property.selector)))
    }

    fn get_u32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<u32, HardwareStatus> {
        if object == SYSTEM_OBJECT {
            if self.should_fail_default_lookup.load(Ordering::Relaxed) {
                return Err(STATUS_UNSPECIFIED);
            }
            return match property.selector {
                PropertySelector::DefaultOutputDevice => (*self.default_output.lock().unwrap())
                    .ok_or(STATUS_UNKNOWN_PROPERTY),
                _ => Err(STATUS_UNKNOWN_PROPERTY),
            };
        }
        if self.should_fail_reads.load(Ordering::Relaxed) {
            return Err(STATUS_UNSPECIFIED);
        }
        self.with_device(object, |d| match property.selector {
            PropertySelector::Mute if d.has_mute => Ok(d.muted as u32),
            _ => Err(STATUS_UNKNOWN_PROPERTY),
        })
    }

    fn set_u32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
        value: u32,
    ) -> std::result::Result<(), HardwareStatus> {
        if self.should_fail_writes.load(Ordering::Relaxed) {
            return Err(STATUS_UNSPECIFIED);
        }
        self.with_device(object, |d| match property.selector {
            PropertySelector::Mute if d.settable(PropertySelector::Mute) => {
                d.muted = value != 0;
                Ok(())
            }
            PropertySelector::Mute if d.has_mute => Err(STATUS_ILLEGAL_OPERATION),
            _ => Err(STATUS_UNKNOWN_PROPERTY),
        })?;

        self.writes.lock().unwrap().push(HardwareWrite::Mute {
            device: object,
            muted: value != 0,
        });
        Ok(())
    }

    fn get_f32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<f32, HardwareStatus> {
        if self.should_fail_reads.load(Ordering::Relaxed) {
            return Err(STATUS_UNSPECIFIED);
        }
        self.with_device(object, |d| match property.selector {
            PropertySelector::VirtualMainVolume if d.has_volume => Ok(d.volume),
            _ => Err(STATUS_UNKNOWN_PROPERTY),
        })
    }

    fn set_f32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
        value: f32,
    ) -> std::result::Result<(), HardwareStatus> {
        if self.should_fail_writes.load(Ordering::Relaxed) {
            return Err(STATUS_UNSPECIFIED);
        }
        self.with_device(object, |d| match property.selector {
            PropertySelector::VirtualMainVolume if d.settable(PropertySelector::VirtualMainVolume) => {
                d.volume = value;
                Ok(())
            }
            PropertySelector::VirtualMainVolume if d.has_volume => Err(STATUS_ILLEGAL_OPERATION),
            _ => Err(STATUS_UNKNOWN_PROPERTY),
        })?;

        self.writes.lock().unwrap().push(HardwareWrite::Volume {
            device: object,
            value,
        });
        Ok(())
    }

    fn get_string(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> std::result::Result<String, HardwareStatus> {
        if self.should_fail_reads.load(Ordering::Relaxed) {
            return Err(STATUS_UNSPECIFIED);
        }
        self.with_device(object, |d| match (property.selector, &d.name) {
            (PropertySelector::DeviceName, Some(name)) => Ok(name.clone()),
            _ => Err(STATUS_UNKNOWN_PROPERTY),
        })
    }
}

type SleepHook = Box<dyn Fn(usize) + Send + Sync>;

/// Mock timer for testing - records sleeps instead of blocking
#[derive(Clone, Default)]
pub struct MockTimer {
    pub sleep_calls: Arc<Mutex<Vec<u64>>>,
    on_sleep: Arc<Mutex<Option<SleepHook>>>,
}

impl MockTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on every sleep with the zero-based index of that sleep
    pub fn set_on_sleep(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.on_sleep.lock().unwrap() = Some(Box::new(hook));
    }

    /// Get all sleep calls that were made
    pub fn get_sleep_calls(&self) -> Vec<u64> {
        self.sleep_calls.lock().unwrap().clone()
    }

    pub fn total_slept_ms(&self) -> u64 {
        self.get_sleep_calls().iter().sum()
    }
}

impl TimerInterface for MockTimer {
    fn sleep_ms(&self, milliseconds: u64) {
        let index = {
            let mut calls = self.sleep_calls.lock().unwrap();
            calls.push(milliseconds);
            calls.len() - 1
        };
        // Don't actually sleep in tests
        if let Some(hook) = self.on_sleep.lock().unwrap().as_ref() {
            hook(index);
        }
    }
}

/// Mock file system for testing - provides controllable file operations
#[derive(Clone, Default)]
pub struct MockFileSystem {
    pub files: Arc<Mutex<HashMap<PathBuf, String>>>,
    pub write_calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub directory_creation_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub should_fail_read: Arc<AtomicBool>,
    pub should_fail_write: Arc<AtomicBool>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the mock file system
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: String) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content);
    }

    /// Get all write calls that were made
    pub fn get_write_calls(&self) -> Vec<(PathBuf, String)> {
        self.write_calls.lock().unwrap().clone()
    }

    /// Get all directory creation calls that were made
    pub fn get_directory_creation_calls(&self) -> Vec<PathBuf> {
        self.directory_creation_calls.lock().unwrap().clone()
    }

    /// Configure the mock to fail read operations
    pub fn set_read_failure(&self, should_fail: bool) {
        self.should_fail_read.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail write operations
    pub fn set_write_failure(&self, should_fail: bool) {
        self.should_fail_write.store(should_fail, Ordering::Relaxed);
    }
}

impl FileSystemInterface for MockFileSystem {
    fn read_config_file(&self, path: &Path) -> Result<String> {
        if self.should_fail_read.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock read failure"));
        }

        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }

    fn write_config_file(&self, path: &Path, content: &str) -> Result<()> {
        self.write_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));

        if self.should_fail_write.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock write failure"));
        }

        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn config_file_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_config_dir(&self, path: &Path) -> Result<()> {
        self.directory_creation_calls
            .lock()
            .unwrap()
            .push(path.to_path_buf());
        Ok(())
    }
}
