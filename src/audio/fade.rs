use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::VolumeError;
use crate::system::{AudioHardwareInterface, TimerInterface};

use super::controller::{ControllerSettings, VolumeController};

/// Timing and step size of one fade, computed up front
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadePlan {
    /// Magnitude of the requested duration
    pub requested_seconds: f32,
    /// Requested duration capped to the configured maximum
    pub duration_seconds: f32,
    pub tick_ms: u64,
    pub ticks: u32,
    /// Volume removed on every tick
    pub step: f32,
}

impl FadePlan {
    pub fn new(seconds: f32, start_volume: f32, settings: &ControllerSettings) -> Self {
        // NaN has no magnitude; treat it as an immediate mute
        let requested_seconds = if seconds.is_nan() { 0.0 } else { seconds.abs() };
        let duration_seconds = requested_seconds.min(settings.max_fade_seconds);

        let tick_ms = settings.fade_tick_ms.max(1);
        let ticks_per_second = 1000.0 / tick_ms as f32;

        // Whole milliseconds first so tick counts don't pick up float error
        let duration_ms = if duration_seconds.is_finite() {
            (duration_seconds * 1000.0).round() as u64
        } else {
            0
        };
        let ticks = u32::try_from(duration_ms.div_ceil(tick_ms)).unwrap_or(u32::MAX);

        // The step is derived from the requested duration unless configured otherwise,
        // so fades capped to the maximum stop short of silence before muting.
        let step_seconds = if settings.fade_step_uses_clamped_duration {
            duration_seconds
        } else {
            requested_seconds
        };
        let step = if step_seconds > 0.0 {
            start_volume / (step_seconds * ticks_per_second)
        } else {
            0.0
        };

        Self {
            requested_seconds,
            duration_seconds,
            tick_ms,
            ticks,
            step,
        }
    }
}

/// How a fade ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeOutcome {
    /// The device was muted before the fade started; nothing was touched
    AlreadyMuted,
    /// No default output device could be resolved; nothing was touched
    NoDevice,
    /// The device is muted with `restored` written back underneath
    Completed { ticks: u32, restored: f32 },
    /// Stopped early; `restored` was written back and mute cleared
    Cancelled { ticks: u32, restored: f32 },
}

/// Shared flag for stopping a running fade
#[derive(Debug, Clone, Default)]
pub struct FadeCancel(Arc<AtomicBool>);

impl FadeCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A fade running on its own thread
pub struct FadeHandle {
    cancel: FadeCancel,
    worker: JoinHandle<FadeOutcome>,
}

impl FadeHandle {
    /// Ask the fade to stop after its current tick
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> FadeCancel {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the fade to end
    pub fn join(self) -> Result<FadeOutcome> {
        self.worker
            .join()
            .map_err(|_| anyhow::anyhow!("Fade worker panicked"))
    }
}

impl<H: AudioHardwareInterface, T: TimerInterface> VolumeController<H, T> {
    /// Ramp the volume down to mute on the calling thread.
    ///
    /// The starting volume is captured and written back (with mute left on) once
    /// the device is muted, so unmuting later resumes at the same loudness.
    pub fn run_fade(&self, seconds: f32, cancel: &FadeCancel) -> FadeOutcome {
        match self.try_get_muted() {
            Ok(true) => {
                debug!("Device already muted, skipping fade");
                return FadeOutcome::AlreadyMuted;
            }
            Err(VolumeError::DeviceNotFound) => {
                warn!("No default output device, skipping fade");
                return FadeOutcome::NoDevice;
            }
            Ok(false) | Err(_) => {}
        }

        let start = self.get_volume();
        let plan = FadePlan::new(seconds, start, &self.settings);
        if plan.requested_seconds > plan.duration_seconds {
            warn!(
                "Fade of {:.1}s capped to {:.1}s",
                plan.requested_seconds, plan.duration_seconds
            );
        }
        info!(
            "Fading volume {:.3} to mute over {:.1}s ({} ticks, step {:.4})",
            start, plan.duration_seconds, plan.ticks, plan.step
        );

        let mut ticks = 0;
        while ticks < plan.ticks {
            self.adjust_volume(-plan.step);
            self.timer.sleep_ms(plan.tick_ms);
            ticks += 1;
            debug!("Fade tick {}/{}", ticks, plan.ticks);

            if cancel.is_cancelled() {
                info!("Fade cancelled after {} ticks, restoring volume {:.3}", ticks, start);
                self.set_volume_with(start, true);
                return FadeOutcome::Cancelled {
                    ticks,
                    restored: start,
                };
            }
        }

        self.set_muted(true);
        self.set_volume_with(start, false);
        info!("Fade complete, device muted with volume {:.3} preserved", start);

        FadeOutcome::Completed {
            ticks,
            restored: start,
        }
    }

    /// Fade to mute. With `blocking` false the fade runs detached on its own thread
    /// and this returns at once; there is no way to observe or stop it.
    pub fn fade_to_mute(&self, seconds: f32, blocking: bool)
    where
        H: 'static,
        T: 'static,
    {
        if blocking {
            self.run_fade(seconds, &FadeCancel::new());
            return;
        }

        if self.get_muted() {
            debug!("Device already muted, not starting background fade");
            return;
        }

        if let Err(e) = self.spawn_fade(seconds) {
            warn!("Unable to start background fade: {:#}", e);
        }
    }

    /// Start a fade on a dedicated thread and return a handle to it
    pub fn spawn_fade(&self, seconds: f32) -> Result<FadeHandle>
    where
        H: 'static,
        T: 'static,
    {
        let controller = self.clone();
        let cancel = FadeCancel::new();
        let token = cancel.clone();

        let worker = thread::Builder::new()
            .name("volume-fade".to_string())
            .spawn(move || controller.run_fade(seconds, &token))
            .context("Failed to spawn fade thread")?;

        debug!("Spawned background fade of {:.1}s", seconds);
        Ok(FadeHandle { cancel, worker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ControllerSettings {
        ControllerSettings::default()
    }

    #[test]
    fn test_plan_three_seconds() {
        let plan = FadePlan::new(3.0, 0.6, &settings());
        assert_eq!(plan.ticks, 6);
        assert_eq!(plan.tick_ms, 500);
        assert!((plan.step - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_plan_negative_duration_uses_magnitude() {
        assert_eq!(
            FadePlan::new(-5.0, 0.8, &settings()),
            FadePlan::new(5.0, 0.8, &settings())
        );
    }

    #[test]
    fn test_plan_caps_duration_but_not_step() {
        let plan = FadePlan::new(20.0, 0.8, &settings());
        assert_eq!(plan.duration_seconds, 10.0);
        assert_eq!(plan.ticks, 20);
        // 0.8 / (20 * 2): the capped fade only removes half the volume
        assert!((plan.step - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_plan_step_from_clamped_duration() {
        let settings = ControllerSettings {
            fade_step_uses_clamped_duration: true,
            ..ControllerSettings::default()
        };
        let plan = FadePlan::new(20.0, 0.8, &settings);
        assert_eq!(plan.ticks, 20);
        assert!((plan.step - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_plan_partial_tick_rounds_up() {
        assert_eq!(FadePlan::new(0.2, 0.5, &settings()).ticks, 1);
        assert_eq!(FadePlan::new(1.25, 0.5, &settings()).ticks, 3);
    }

    #[test]
    fn test_plan_ticks_for_inexact_intervals() {
        let cases = [(100, 3.0, 30), (200, 1.0, 5), (300, 3.0, 10), (300, 1.0, 4)];
        for (tick_ms, seconds, expected) in cases {
            let settings = ControllerSettings {
                fade_tick_ms: tick_ms,
                ..ControllerSettings::default()
            };
            let plan = FadePlan::new(seconds, 0.5, &settings);
            assert_eq!(plan.ticks, expected, "tick_ms={} seconds={}", tick_ms, seconds);
        }
    }

    #[test]
    fn test_plan_huge_duration_terminates() {
        let settings = ControllerSettings {
            max_fade_seconds: 1.0e9,
            ..ControllerSettings::default()
        };
        let plan = FadePlan::new(1.0e9, 0.5, &settings);
        // 1e12 ms is not exact in f32, so only check the magnitude
        assert!(plan.ticks > 1_999_000_000);

        let unbounded = ControllerSettings {
            max_fade_seconds: f32::INFINITY,
            ..ControllerSettings::default()
        };
        let plan = FadePlan::new(f32::INFINITY, 0.5, &unbounded);
        assert_eq!(plan.ticks, 0);
        assert_eq!(plan.step, 0.0);
    }

    #[test]
    fn test_plan_zero_and_nan() {
        let zero = FadePlan::new(0.0, 0.5, &settings());
        assert_eq!(zero.ticks, 0);
        assert_eq!(zero.step, 0.0);

        let nan = FadePlan::new(f32::NAN, 0.5, &settings());
        assert_eq!(nan.ticks, 0);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let cancel = FadeCancel::new();
        let token = cancel.clone();
        assert!(!token.is_cancelled());
        cancel.cancel();
        assert!(token.is_cancelled());
    }
}
