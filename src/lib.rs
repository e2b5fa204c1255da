pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod system;

pub use audio::{
    ControllerSettings, FadeCancel, FadeHandle, FadeOutcome, SystemVolumeController,
    VolumeController, VolumeLevel, VolumeWrite,
};
pub use config::Config;
pub use error::VolumeError;
pub use system::{AudioHardwareInterface, TimerInterface};

#[cfg(any(test, feature = "test-mocks"))]
pub use system::{MockAudioHardware, MockDevice, MockTimer};
