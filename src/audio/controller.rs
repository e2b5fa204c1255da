use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{HardwareStatus, Result, VolumeError};
use crate::system::{AudioHardwareInterface, PlatformAudioHardware, StandardTimer, TimerInterface};

use super::device::{
    DEFAULT_OUTPUT_DEVICE, DEVICE_NAME, MUTE, OutputDeviceHandle, OutputDeviceInfo,
    PropertyCapability, PropertyDescriptor, SYSTEM_OBJECT, VOLUME, VolumeLevel,
};

/// Tunables for volume writes and fades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Requested volumes below this are applied by muting instead
    pub mute_threshold: f32,
    pub max_fade_seconds: f32,
    pub fade_tick_ms: u64,
    /// Derive the fade step from the capped duration instead of the requested one
    pub fade_step_uses_clamped_duration: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            mute_threshold: 0.05,
            max_fade_seconds: 10.0,
            fade_tick_ms: 500,
            fade_step_uses_clamped_duration: false,
        }
    }
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            mute_threshold: config.volume.mute_threshold,
            max_fade_seconds: config.fade.max_seconds,
            fade_tick_ms: config.fade.tick_ms,
            fade_step_uses_clamped_duration: config.fade.step_uses_clamped_duration,
        }
    }
}

/// Result of a successful `try_set_volume`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeWrite {
    /// The level was below the mute threshold and the device was muted instead
    Muted,
    /// The volume property was written; `mute_cleared` is set when mute was also turned off
    Volume {
        level: VolumeLevel,
        mute_cleared: bool,
    },
}

/// Volume and mute control for whichever device is currently the default output.
///
/// Holds no device state: every operation resolves the default device again and
/// re-checks property support and settability before touching it. The `try_*`
/// operations report failures as `VolumeError`; the plain operations log them
/// and fall back to silence / unmuted / no-op.
pub struct VolumeController<H: AudioHardwareInterface, T: TimerInterface> {
    pub(crate) hardware: Arc<H>,
    pub(crate) timer: Arc<T>,
    pub(crate) settings: ControllerSettings,
    write_lock: Arc<Mutex<()>>,
}

impl<H: AudioHardwareInterface, T: TimerInterface> Clone for VolumeController<H, T> {
    fn clone(&self) -> Self {
        Self {
            hardware: Arc::clone(&self.hardware),
            timer: Arc::clone(&self.timer),
            settings: self.settings,
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<H: AudioHardwareInterface, T: TimerInterface> VolumeController<H, T> {
    pub fn new(hardware: H, timer: T, settings: ControllerSettings) -> Self {
        Self {
            hardware: Arc::new(hardware),
            timer: Arc::new(timer),
            settings,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_default_settings(hardware: H, timer: T) -> Self {
        Self::new(hardware, timer, ControllerSettings::default())
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Resolve the system-wide default output device
    pub fn resolve_default_output_device(&self) -> Result<OutputDeviceHandle> {
        if !self
            .hardware
            .has_property(SYSTEM_OBJECT, &DEFAULT_OUTPUT_DEVICE)
        {
            debug!("Default output device property is not available on this host");
            return Err(VolumeError::DeviceNotFound);
        }

        let id = self
            .hardware
            .get_u32(SYSTEM_OBJECT, &DEFAULT_OUTPUT_DEVICE)
            .map_err(|status| {
                debug!("Unable to get default audio device: {}", status);
                VolumeError::DeviceNotFound
            })?;

        let handle = OutputDeviceHandle(id);
        if !handle.is_known() {
            debug!("Default output device resolved to the unknown object");
            return Err(VolumeError::DeviceNotFound);
        }

        debug!("Resolved default output device 0x{:x}", id);
        Ok(handle)
    }

    /// Check whether a property is present and whether it can be written
    pub fn property_capability(
        &self,
        device: OutputDeviceHandle,
        property: &PropertyDescriptor,
    ) -> Result<PropertyCapability> {
        if !self.hardware.has_property(device.id(), property) {
            return Ok(PropertyCapability::Unsupported);
        }

        match self.hardware.is_property_settable(device.id(), property) {
            Ok(true) => Ok(PropertyCapability::Settable),
            Ok(false) => Ok(PropertyCapability::ReadOnly),
            Err(status) => Err(io_error(device, property, "query settability of", status)),
        }
    }

    // ---- Volume ----

    pub fn try_get_volume(&self) -> Result<VolumeLevel> {
        let device = self.resolve_default_output_device()?;
        self.read_volume(device)
    }

    /// Current volume, or silence when it cannot be read
    pub fn get_volume(&self) -> f32 {
        match self.try_get_volume() {
            Ok(level) => level.value(),
            Err(e) => {
                degraded("read volume", &e);
                0.0
            }
        }
    }

    /// Apply a volume level to the default output device.
    ///
    /// The level is clamped into [0, 1]. Levels below the mute threshold mute the
    /// device instead of writing the volume, unless the device cannot be muted.
    /// When `mute_off_on_set` is true a successful volume write also clears mute.
    pub fn try_set_volume(&self, level: f32, mute_off_on_set: bool) -> Result<VolumeWrite> {
        let device = self.resolve_default_output_device()?;

        let (target, changed) = VolumeLevel::clamp(level);
        if changed {
            warn!(
                "Tentative volume ({:5.2}) was out of range; reset to {:5.2}",
                level,
                target.value()
            );
        }

        let _guard = self.lock_writes();

        if target.value() < self.settings.mute_threshold {
            if self.mute_is_settable(device) {
                self.write_mute(device, true)?;
                debug!("Muted device 0x{:x} instead of writing volume {:.3}", device.id(), target.value());
                return Ok(VolumeWrite::Muted);
            }
            debug!(
                "Should mute device 0x{:x} but it cannot be muted; writing volume instead",
                device.id()
            );
        }

        self.require_settable(device, &VOLUME)?;
        self.hardware
            .set_f32(device.id(), &VOLUME, target.value())
            .map_err(|status| io_error(device, &VOLUME, "write", status))?;

        let mut mute_cleared = false;
        if mute_off_on_set && self.mute_is_settable(device) {
            match self.write_mute(device, false) {
                Ok(()) => mute_cleared = true,
                Err(e) => warn!("Volume set but mute could not be cleared: {}", e),
            }
        }

        debug!("Set volume of device 0x{:x} to {:.3}", device.id(), target.value());
        Ok(VolumeWrite::Volume {
            level: target,
            mute_cleared,
        })
    }

    /// Set the volume and clear mute. Failures are logged, never returned.
    pub fn set_volume(&self, level: f32) {
        self.set_volume_with(level, true);
    }

    /// Set the volume, clearing mute only when `mute_off_on_set` is true
    pub fn set_volume_with(&self, level: f32, mute_off_on_set: bool) {
        if let Err(e) = self.try_set_volume(level, mute_off_on_set) {
            degraded("set volume", &e);
        }
    }

    /// Move the volume by `delta` relative to its current reading
    pub fn adjust_volume(&self, delta: f32) {
        let current = self.get_volume();
        self.set_volume(current + delta);
    }

    // ---- Mute ----

    pub fn try_get_muted(&self) -> Result<bool> {
        let device = self.resolve_default_output_device()?;
        self.read_muted(device)
    }

    /// Current mute state, or unmuted when it cannot be determined
    pub fn get_muted(&self) -> bool {
        match self.try_get_muted() {
            Ok(muted) => muted,
            Err(e) => {
                degraded("read mute state", &e);
                false
            }
        }
    }

    pub fn try_set_muted(&self, muted: bool) -> Result<()> {
        let device = self.resolve_default_output_device()?;
        let _guard = self.lock_writes();
        self.require_settable(device, &MUTE)?;
        self.write_mute(device, muted)?;
        info!(
            "Device 0x{:x} {}",
            device.id(),
            if muted { "muted" } else { "unmuted" }
        );
        Ok(())
    }

    pub fn set_muted(&self, muted: bool) {
        if let Err(e) = self.try_set_muted(muted) {
            degraded("change mute state", &e);
        }
    }

    /// Flip the mute state, returning the new state
    pub fn try_toggle_muted(&self) -> Result<bool> {
        let muted = !self.try_get_muted()?;
        self.try_set_muted(muted)?;
        Ok(muted)
    }

    /// Flip the mute state; returns the state the device ends up in as far as it can be read
    pub fn toggle_muted(&self) -> bool {
        match self.try_toggle_muted() {
            Ok(muted) => muted,
            Err(e) => {
                degraded("toggle mute", &e);
                self.get_muted()
            }
        }
    }

    // ---- Discovery ----

    /// Resolve the default output device and read its name, volume and mute state
    pub fn describe_default_output(&self) -> Result<OutputDeviceInfo> {
        let device = self.resolve_default_output_device()?;

        let name = if self.hardware.has_property(device.id(), &DEVICE_NAME) {
            self.hardware
                .get_string(device.id(), &DEVICE_NAME)
                .map_err(|status| debug!("Failed to get device name: {}", status))
                .ok()
        } else {
            None
        };

        let volume = self.read_volume(device).unwrap_or_else(|e| {
            degraded("read volume", &e);
            VolumeLevel::SILENT
        });
        let muted = self.read_muted(device).unwrap_or_else(|e| {
            degraded("read mute state", &e);
            false
        });

        Ok(OutputDeviceInfo {
            handle: device,
            name,
            volume,
            muted,
        })
    }

    // ---- Internals ----

    fn read_volume(&self, device: OutputDeviceHandle) -> Result<VolumeLevel> {
        if !self.hardware.has_property(device.id(), &VOLUME) {
            return Err(unsupported(device, &VOLUME));
        }

        let raw = self
            .hardware
            .get_f32(device.id(), &VOLUME)
            .map_err(|status| io_error(device, &VOLUME, "read", status))?;

        let (level, changed) = VolumeLevel::clamp(raw);
        if changed {
            debug!("Device 0x{:x} reported out-of-range volume {}", device.id(), raw);
        }
        Ok(level)
    }

    fn read_muted(&self, device: OutputDeviceHandle) -> Result<bool> {
        // Mute is only trusted when it is also settable
        self.require_settable(device, &MUTE)?;

        let raw = self
            .hardware
            .get_u32(device.id(), &MUTE)
            .map_err(|status| io_error(device, &MUTE, "read", status))?;
        Ok(raw != 0)
    }

    fn write_mute(&self, device: OutputDeviceHandle, muted: bool) -> Result<()> {
        self.hardware
            .set_u32(device.id(), &MUTE, muted as u32)
            .map_err(|status| io_error(device, &MUTE, "write", status))
    }

    fn require_settable(&self, device: OutputDeviceHandle, property: &PropertyDescriptor) -> Result<()> {
        match self.property_capability(device, property)? {
            PropertyCapability::Settable => Ok(()),
            PropertyCapability::ReadOnly => Err(VolumeError::PropertyNotSettable {
                device: device.id(),
                property: property.selector,
            }),
            PropertyCapability::Unsupported => Err(unsupported(device, property)),
        }
    }

    fn mute_is_settable(&self, device: OutputDeviceHandle) -> bool {
        match self.property_capability(device, &MUTE) {
            Ok(capability) => capability.is_settable(),
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // The guarded data is (), so a poisoned lock carries nothing stale
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Production controller backed by the platform audio HAL and real sleeps
pub type SystemVolumeController = VolumeController<PlatformAudioHardware, StandardTimer>;

// Convenience constructor for production use
impl VolumeController<PlatformAudioHardware, StandardTimer> {
    pub fn new_production(config: &Config) -> Self {
        info!("Initializing volume controller");
        Self::new(
            PlatformAudioHardware::new(),
            StandardTimer,
            ControllerSettings::from(config),
        )
    }
}

fn unsupported(device: OutputDeviceHandle, property: &PropertyDescriptor) -> VolumeError {
    VolumeError::PropertyUnsupported {
        device: device.id(),
        property: property.selector,
    }
}

fn io_error(
    device: OutputDeviceHandle,
    property: &PropertyDescriptor,
    operation: &'static str,
    status: HardwareStatus,
) -> VolumeError {
    VolumeError::HardwareIo {
        device: device.id(),
        property: property.selector,
        operation,
        status,
    }
}

/// Log an error that a UI-facing operation is about to swallow
fn degraded(operation: &str, error: &VolumeError) {
    match error {
        VolumeError::DeviceNotFound | VolumeError::HardwareIo { .. } => {
            warn!("Unable to {}: {}", operation, error)
        }
        VolumeError::PropertyUnsupported { .. } | VolumeError::PropertyNotSettable { .. } => {
            debug!("Unable to {}: {}", operation, error)
        }
    }
}
