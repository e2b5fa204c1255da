use std::fmt;

/// Identifier of an object in the audio hardware object graph
pub type AudioObjectId = u32;

/// The hardware system object that owns the default-device properties
pub const SYSTEM_OBJECT: AudioObjectId = 1;

/// Sentinel for an object that could not be resolved
pub const UNKNOWN_OBJECT: AudioObjectId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertySelector {
    DefaultOutputDevice,
    VirtualMainVolume,
    Mute,
    DeviceName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyScope {
    Global,
    Output,
}

/// A (selector, scope, element) key addressing one property of an audio object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    pub selector: PropertySelector,
    pub scope: PropertyScope,
    pub element: u32,
}

pub const ELEMENT_MAIN: u32 = 0;

pub const DEFAULT_OUTPUT_DEVICE: PropertyDescriptor = PropertyDescriptor {
    selector: PropertySelector::DefaultOutputDevice,
    scope: PropertyScope::Global,
    element: ELEMENT_MAIN,
};

pub const VOLUME: PropertyDescriptor = PropertyDescriptor {
    selector: PropertySelector::VirtualMainVolume,
    scope: PropertyScope::Output,
    element: ELEMENT_MAIN,
};

pub const MUTE: PropertyDescriptor = PropertyDescriptor {
    selector: PropertySelector::Mute,
    scope: PropertyScope::Output,
    element: ELEMENT_MAIN,
};

pub const DEVICE_NAME: PropertyDescriptor = PropertyDescriptor {
    selector: PropertySelector::DeviceName,
    scope: PropertyScope::Global,
    element: ELEMENT_MAIN,
};

/// Handle to the default output device as resolved for a single operation.
/// Never cached: the default device can change between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputDeviceHandle(pub AudioObjectId);

impl OutputDeviceHandle {
    pub fn id(&self) -> AudioObjectId {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0 != UNKNOWN_OBJECT
    }
}

/// Normalized volume scalar, always within [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct VolumeLevel(f32);

impl VolumeLevel {
    pub const SILENT: VolumeLevel = VolumeLevel(0.0);
    pub const FULL: VolumeLevel = VolumeLevel(1.0);

    /// Clamp a raw value into range. The flag reports whether clamping changed it.
    pub fn clamp(raw: f32) -> (Self, bool) {
        if raw.is_nan() {
            return (Self::SILENT, true);
        }
        let clamped = raw.clamp(0.0, 1.0);
        (Self(clamped), clamped != raw)
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl From<VolumeLevel> for f32 {
    fn from(level: VolumeLevel) -> Self {
        level.0
    }
}

/// What the hardware allows for a given property on a given device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCapability {
    Unsupported,
    ReadOnly,
    Settable,
}

impl PropertyCapability {
    pub fn is_settable(&self) -> bool {
        matches!(self, PropertyCapability::Settable)
    }
}

/// Snapshot of the default output device, for display
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDeviceInfo {
    pub handle: OutputDeviceHandle,
    pub name: Option<String>,
    pub volume: VolumeLevel,
    pub muted: bool,
}

impl fmt::Display for PropertySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertySelector::DefaultOutputDevice => write!(f, "default output device"),
            PropertySelector::VirtualMainVolume => write!(f, "volume"),
            PropertySelector::Mute => write!(f, "mute"),
            PropertySelector::DeviceName => write!(f, "name"),
        }
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

impl fmt::Display for OutputDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (0x{:x}): {} [{}]",
            self.name.as_deref().unwrap_or("Unknown Device"),
            self.handle.id(),
            self.volume,
            if self.muted { "Muted" } else { "Unmuted" }
        )
    }
}
