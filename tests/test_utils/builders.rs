//! Test utility builders for wiring a controller to mock hardware
//!
//! Individual methods may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use audio_volume_control::system::{MockAudioHardware, MockDevice, MockTimer};
use audio_volume_control::{ControllerSettings, VolumeController};

pub const SPEAKERS_ID: u32 = 73;
pub const HEADPHONES_ID: u32 = 91;

pub type MockController = VolumeController<MockAudioHardware, MockTimer>;

/// A controller plus handles on the mocks behind it
pub struct Harness {
    pub controller: MockController,
    pub hardware: MockAudioHardware,
    pub timer: MockTimer,
}

impl Harness {
    pub fn volume(&self) -> f32 {
        self.hardware.volume_of(SPEAKERS_ID).expect("speakers present")
    }

    pub fn muted(&self) -> bool {
        self.hardware.is_muted(SPEAKERS_ID).expect("speakers present")
    }
}

/// Builder for a harness whose default output is a single speaker device
pub struct HarnessBuilder {
    device: MockDevice,
    settings: ControllerSettings,
    has_default: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            device: MockDevice::new("MacBook Pro Speakers"),
            settings: ControllerSettings::default(),
            has_default: true,
        }
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.device = self.device.with_volume(volume);
        self
    }

    pub fn muted(mut self) -> Self {
        self.device = self.device.muted(true);
        self
    }

    pub fn device(mut self, f: impl FnOnce(MockDevice) -> MockDevice) -> Self {
        self.device = f(self.device);
        self
    }

    pub fn settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The host reports no default output device at all
    pub fn no_default_device(mut self) -> Self {
        self.has_default = false;
        self
    }

    pub fn build(self) -> Harness {
        let hardware = MockAudioHardware::new();
        hardware.add_device(SPEAKERS_ID, self.device);
        if self.has_default {
            hardware.set_mock_default_output(Some(SPEAKERS_ID));
        }

        let timer = MockTimer::new();
        let controller = VolumeController::new(hardware.clone(), timer.clone(), self.settings);

        Harness {
            controller,
            hardware,
            timer,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
