use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};
use coreaudio_sys::*;
use std::os::raw::c_void;
use std::ptr;
use tracing::{debug, info};

use crate::audio::device::{AudioObjectId, PropertyDescriptor, PropertyScope, PropertySelector};
use crate::error::HardwareStatus;
use crate::system::traits::AudioHardwareInterface;

/// `kAudioHardwareServiceDeviceProperty_VirtualMainVolume` ('vmvc'). Lives in
/// AudioToolbox and is named differently across SDK versions, so it is spelled out here.
const VIRTUAL_MAIN_VOLUME: AudioObjectPropertySelector = u32::from_be_bytes(*b"vmvc");

/// Production implementation of AudioHardwareInterface using CoreAudio
pub struct CoreAudioHardware;

impl CoreAudioHardware {
    pub fn new() -> Self {
        info!("Initialized CoreAudio hardware interface");
        Self
    }

    fn address(property: &PropertyDescriptor) -> AudioObjectPropertyAddress {
        let selector = match property.selector {
            PropertySelector::DefaultOutputDevice => kAudioHardwarePropertyDefaultOutputDevice,
            PropertySelector::VirtualMainVolume => VIRTUAL_MAIN_VOLUME,
            PropertySelector::Mute => kAudioDevicePropertyMute,
            PropertySelector::DeviceName => kAudioDevicePropertyDeviceNameCFString,
        };
        let scope = match property.scope {
            PropertyScope::Global => kAudioObjectPropertyScopeGlobal,
            PropertyScope::Output => kAudioDevicePropertyScopeOutput,
        };

        AudioObjectPropertyAddress {
            mSelector: selector,
            mScope: scope,
            mElement: property.element,
        }
    }

    fn check(result: OSStatus) -> Result<(), HardwareStatus> {
        if result != kAudioHardwareNoError as i32 {
            return Err(HardwareStatus(result));
        }
        Ok(())
    }

    fn get_data<T: Copy>(
        object: AudioObjectId,
        property: &PropertyDescriptor,
        initial: T,
    ) -> Result<T, HardwareStatus> {
        let address = Self::address(property);
        let mut value = initial;
        let mut size = std::mem::size_of::<T>() as u32;

        let result = unsafe {
            AudioObjectGetPropertyData(
                object,
                &address,
                0,
                ptr::null(),
                &mut size,
                &mut value as *mut T as *mut c_void,
            )
        };
        Self::check(result)?;
        Ok(value)
    }

    fn set_data<T: Copy>(
        object: AudioObjectId,
        property: &PropertyDescriptor,
        value: T,
    ) -> Result<(), HardwareStatus> {
        let address = Self::address(property);

        let result = unsafe {
            AudioObjectSetPropertyData(
                object,
                &address,
                0,
                ptr::null(),
                std::mem::size_of::<T>() as u32,
                &value as *const T as *const c_void,
            )
        };
        Self::check(result)
    }
}

impl AudioHardwareInterface for CoreAudioHardware {
    fn has_property(&self, object: AudioObjectId, property: &PropertyDescriptor) -> bool {
        let address = Self::address(property);
        unsafe { AudioObjectHasProperty(object, &address) != 0 }
    }

    fn is_property_settable(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> Result<bool, HardwareStatus> {
        let address = Self::address(property);
        let mut settable: Boolean = 0;

        let result = unsafe { AudioObjectIsPropertySettable(object, &address, &mut settable) };
        Self::check(result)?;
        Ok(settable != 0)
    }

    fn get_u32(&self, object: AudioObjectId, property: &PropertyDescriptor) -> Result<u32, HardwareStatus> {
        Self::get_data(object, property, 0u32)
    }

    fn set_u32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
        value: u32,
    ) -> Result<(), HardwareStatus> {
        Self::set_data(object, property, value)
    }

    fn get_f32(&self, object: AudioObjectId, property: &PropertyDescriptor) -> Result<f32, HardwareStatus> {
        Self::get_data(object, property, 0f32)
    }

    fn set_f32(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
        value: f32,
    ) -> Result<(), HardwareStatus> {
        Self::set_data(object, property, value)
    }

    fn get_string(
        &self,
        object: AudioObjectId,
        property: &PropertyDescriptor,
    ) -> Result<String, HardwareStatus> {
        let cf_string: CFStringRef = Self::get_data(object, property, ptr::null())?;

        if cf_string.is_null() {
            debug!("Property {} of object 0x{:x} returned a null string", property.selector, object);
            return Err(HardwareStatus(kAudioHardwareUnspecifiedError as i32));
        }

        // The HAL hands out a +1 reference for CFString properties
        let cf_string = unsafe { CFString::wrap_under_create_rule(cf_string) };
        Ok(cf_string.to_string())
    }
}

impl Default for CoreAudioHardware {
    fn default() -> Self {
        Self::new()
    }
}
