use audio_volume_control::system::HardwareWrite;
use audio_volume_control::{ControllerSettings, FadeCancel, FadeOutcome};
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

mod test_utils;
use test_utils::{Harness, HarnessBuilder, SPEAKERS_ID, approx_eq};

fn wait_until(harness: &Harness, condition: impl Fn(&Harness) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition(harness) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Blocking fades driven by the mock timer
#[cfg(test)]
mod blocking_fade_tests {
    use super::*;

    #[test]
    fn test_fade_mutes_and_restores_volume() {
        let harness = HarnessBuilder::new().volume(0.6).build();

        let outcome = harness.controller.run_fade(3.0, &FadeCancel::new());

        assert_eq!(
            outcome,
            FadeOutcome::Completed {
                ticks: 6,
                restored: 0.6
            }
        );
        assert!(harness.muted());
        assert_eq!(harness.volume(), 0.6);
        assert_eq!(harness.timer.get_sleep_calls(), vec![500; 6]);
    }

    #[test]
    fn test_fade_steps_down_each_tick() {
        let harness = HarnessBuilder::new().volume(0.6).build();

        harness.controller.fade_to_mute(3.0, true);

        // Five audible steps, the sixth lands below the threshold and mutes,
        // then the starting volume is written back
        let volumes = harness.hardware.get_volume_writes();
        let expected = [0.5, 0.4, 0.3, 0.2, 0.1, 0.6];
        assert_eq!(volumes.len(), expected.len());
        for (written, expected) in volumes.iter().zip(expected) {
            assert!(approx_eq(*written, expected), "{} != {}", written, expected);
        }

        let writes = harness.hardware.get_writes();
        assert_eq!(
            writes.last(),
            Some(&HardwareWrite::Volume {
                device: SPEAKERS_ID,
                value: 0.6
            })
        );
        // Restoring must not clear the mute set just before it
        assert_eq!(
            writes[writes.len() - 2],
            HardwareWrite::Mute {
                device: SPEAKERS_ID,
                muted: true
            }
        );
    }

    #[test]
    fn test_fade_on_muted_device_is_noop() {
        let harness = HarnessBuilder::new().volume(0.6).muted().build();

        assert_eq!(
            harness.controller.run_fade(3.0, &FadeCancel::new()),
            FadeOutcome::AlreadyMuted
        );
        harness.controller.fade_to_mute(3.0, true);

        assert!(harness.hardware.get_writes().is_empty());
        assert!(harness.timer.get_sleep_calls().is_empty());
        assert_eq!(harness.volume(), 0.6);
        assert!(harness.muted());
    }

    #[test]
    fn test_fade_without_device_returns_at_once() {
        let harness = HarnessBuilder::new().no_default_device().build();

        assert_eq!(
            harness.controller.run_fade(3.0, &FadeCancel::new()),
            FadeOutcome::NoDevice
        );
        assert!(harness.timer.get_sleep_calls().is_empty());
        assert!(harness.hardware.get_writes().is_empty());
    }

    #[test]
    fn test_negative_duration_matches_positive() {
        let positive = HarnessBuilder::new().volume(0.8).build();
        let negative = HarnessBuilder::new().volume(0.8).build();

        let a = positive.controller.run_fade(5.0, &FadeCancel::new());
        let b = negative.controller.run_fade(-5.0, &FadeCancel::new());

        assert_eq!(a, b);
        assert_eq!(a, FadeOutcome::Completed { ticks: 10, restored: 0.8 });
        assert_eq!(
            positive.hardware.get_writes(),
            negative.hardware.get_writes()
        );
        assert_eq!(
            positive.timer.get_sleep_calls(),
            negative.timer.get_sleep_calls()
        );
    }

    #[test]
    fn test_long_fade_is_capped_to_ten_seconds() {
        let harness = HarnessBuilder::new().volume(0.8).build();

        let outcome = harness.controller.run_fade(20.0, &FadeCancel::new());

        assert_eq!(outcome, FadeOutcome::Completed { ticks: 20, restored: 0.8 });
        assert_eq!(harness.timer.total_slept_ms(), 10_000);
        assert!(harness.muted());
        assert_eq!(harness.volume(), 0.8);

        // The step follows the requested 20s, so the capped fade stops halfway down
        let volumes = harness.hardware.get_volume_writes();
        assert_eq!(volumes.len(), 21);
        assert!(approx_eq(volumes[19], 0.4));
    }

    #[test]
    fn test_step_from_clamped_duration_reaches_silence() {
        let harness = HarnessBuilder::new()
            .volume(0.8)
            .settings(ControllerSettings {
                fade_step_uses_clamped_duration: true,
                ..ControllerSettings::default()
            })
            .build();

        let outcome = harness.controller.run_fade(20.0, &FadeCancel::new());

        assert_eq!(outcome, FadeOutcome::Completed { ticks: 20, restored: 0.8 });
        let volumes = harness.hardware.get_volume_writes();
        // 18 audible steps down to 0.08, two muting ticks, then the restore
        assert_eq!(volumes.len(), 19);
        assert!(approx_eq(volumes[17], 0.08));
        assert_eq!(harness.volume(), 0.8);
    }

    #[test]
    fn test_custom_tick_interval() {
        let harness = HarnessBuilder::new()
            .volume(0.5)
            .settings(ControllerSettings {
                fade_tick_ms: 250,
                ..ControllerSettings::default()
            })
            .build();

        let outcome = harness.controller.run_fade(1.0, &FadeCancel::new());

        assert_eq!(outcome, FadeOutcome::Completed { ticks: 4, restored: 0.5 });
        assert_eq!(harness.timer.get_sleep_calls(), vec![250; 4]);
    }

    #[test]
    fn test_fade_without_mute_support_restores_volume() {
        let harness = HarnessBuilder::new()
            .volume(0.6)
            .device(|d| d.without_mute())
            .build();

        let outcome = harness.controller.run_fade(1.0, &FadeCancel::new());

        assert_eq!(outcome, FadeOutcome::Completed { ticks: 2, restored: 0.6 });
        assert!(!harness.muted());
        assert_eq!(harness.volume(), 0.6);
        assert!(harness.hardware.get_mute_writes().is_empty());
    }

    #[test]
    fn test_cancelled_fade_restores_audible_state() {
        let harness = HarnessBuilder::new().volume(0.6).build();
        let cancel = FadeCancel::new();
        let token = cancel.clone();
        harness.timer.set_on_sleep(move |index| {
            if index == 1 {
                token.cancel();
            }
        });

        let outcome = harness.controller.run_fade(3.0, &cancel);

        assert_eq!(outcome, FadeOutcome::Cancelled { ticks: 2, restored: 0.6 });
        assert_eq!(harness.timer.get_sleep_calls().len(), 2);
        assert_eq!(harness.volume(), 0.6);
        assert!(!harness.muted());
    }
}

/// Fades running on their own thread
#[cfg(test)]
mod background_fade_tests {
    use super::*;

    #[test]
    fn test_non_blocking_fade_returns_before_completion() {
        let harness = HarnessBuilder::new().volume(0.6).build();
        let (release, gate) = mpsc::channel::<()>();
        let gate = Mutex::new(gate);
        harness.timer.set_on_sleep(move |_| {
            let _ = gate.lock().unwrap().recv();
        });

        harness.controller.fade_to_mute(1.0, false);

        // The worker cannot get past its first sleep until released
        assert!(!harness.muted());

        release.send(()).unwrap();
        release.send(()).unwrap();

        assert!(wait_until(&harness, |h| {
            h.muted() && h.hardware.get_volume_writes().last() == Some(&0.6)
        }));
        assert_eq!(harness.timer.get_sleep_calls().len(), 2);
    }

    #[test]
    fn test_non_blocking_fade_on_muted_device_starts_no_worker() {
        let harness = HarnessBuilder::new().volume(0.6).muted().build();

        harness.controller.fade_to_mute(3.0, false);

        // A worker started anyway would now see an audible device and fade it
        harness.controller.set_muted(false);
        harness.hardware.clear_writes();
        thread::sleep(Duration::from_millis(100));

        assert!(harness.timer.get_sleep_calls().is_empty());
        assert!(harness.hardware.get_writes().is_empty());
        assert!(!harness.muted());
        assert_eq!(harness.volume(), 0.6);
    }

    #[test]
    fn test_spawned_fade_completes() {
        let harness = HarnessBuilder::new().volume(0.6).build();

        let handle = harness.controller.spawn_fade(3.0).unwrap();
        let outcome = handle.join().unwrap();

        assert_eq!(outcome, FadeOutcome::Completed { ticks: 6, restored: 0.6 });
        assert!(harness.muted());
        assert_eq!(harness.volume(), 0.6);
    }

    #[test]
    fn test_spawned_fade_can_be_cancelled() {
        let harness = HarnessBuilder::new().volume(0.6).build();
        let (release, gate) = mpsc::channel::<()>();
        let gate = Mutex::new(gate);
        harness.timer.set_on_sleep(move |_| {
            let _ = gate.lock().unwrap().recv();
        });

        let handle = harness.controller.spawn_fade(3.0).unwrap();
        handle.cancel();
        release.send(()).unwrap();

        let outcome = handle.join().unwrap();

        assert_eq!(outcome, FadeOutcome::Cancelled { ticks: 1, restored: 0.6 });
        assert_eq!(harness.volume(), 0.6);
        assert!(!harness.muted());
    }

    #[test]
    fn test_fade_racing_volume_writes_does_not_deadlock() {
        let harness = HarnessBuilder::new().volume(0.9).build();

        let handle = harness.controller.spawn_fade(5.0).unwrap();
        let controller = harness.controller.clone();
        let writer = thread::spawn(move || {
            for i in 0..100 {
                controller.set_volume(0.3 + (i % 5) as f32 * 0.1);
            }
        });

        writer.join().expect("writer thread panicked");
        assert!(matches!(
            handle.join().unwrap(),
            FadeOutcome::Completed { .. } | FadeOutcome::AlreadyMuted
        ));
    }
}
