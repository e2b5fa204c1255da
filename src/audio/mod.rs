pub mod controller;
pub mod device;
pub mod fade;

pub use controller::{ControllerSettings, SystemVolumeController, VolumeController, VolumeWrite};
pub use device::{
    OutputDeviceHandle, OutputDeviceInfo, PropertyCapability, PropertyDescriptor,
    PropertyScope, PropertySelector, VolumeLevel,
};
pub use fade::{FadeCancel, FadeHandle, FadeOutcome, FadePlan};
