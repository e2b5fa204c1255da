use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{debug, info};

use audio_volume_control::audio::OutputDeviceInfo;
use audio_volume_control::logging::{LoggingConfig, initialize_logging};
use audio_volume_control::{
    Config, FadeCancel, FadeOutcome, SystemVolumeController, VolumeError, VolumeWrite,
};

#[derive(Parser)]
#[command(name = "audio-volume-control")]
#[command(about = "Volume, mute and fade-to-mute control for the default macOS output device")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the default output device with its volume and mute state
    Status,
    /// Print the current volume (0.0 - 1.0)
    Get,
    /// Set the volume (0.0 - 1.0); very low levels mute instead
    Set {
        #[arg(allow_negative_numbers = true)]
        level: f32,
        /// Leave the mute state alone
        #[arg(short, long)]
        keep_mute: bool,
    },
    /// Mute the default output device
    Mute,
    /// Unmute the default output device
    Unmute,
    /// Flip the mute state
    ToggleMute,
    /// Fade the volume down to mute, keeping the current level for unmute
    Fade {
        /// Fade duration in seconds (defaults to the configured value)
        #[arg(short, long, allow_negative_numbers = true)]
        seconds: Option<f32>,
        /// Run the fade on a worker thread; Ctrl+C cancels it
        #[arg(short, long)]
        background: bool,
    },
    /// Print volume and mute changes until Ctrl+C
    Watch {
        /// Polling interval in milliseconds
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Validate configuration file
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    let (_log_guard, log_dir) =
        initialize_logging(LoggingConfig::from_general(&config.general, cli.verbose))?;
    if let Some(dir) = log_dir {
        debug!("Writing logs to {}", dir.display());
    }
    info!("Starting audio volume control");

    let controller = SystemVolumeController::new_production(&config);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => show_status(&controller)?,
        Commands::Get => {
            let level = controller.try_get_volume()?;
            println!("{:.2}", level.value());
        }
        Commands::Set { level, keep_mute } => set_volume(&controller, level, keep_mute)?,
        Commands::Mute => {
            controller.try_set_muted(true)?;
            println!("✓ Muted");
        }
        Commands::Unmute => {
            controller.try_set_muted(false)?;
            println!("✓ Unmuted");
        }
        Commands::ToggleMute => {
            let muted = controller.try_toggle_muted()?;
            println!("✓ {}", if muted { "Muted" } else { "Unmuted" });
        }
        Commands::Fade {
            seconds,
            background,
        } => {
            let seconds = seconds.unwrap_or(config.fade.default_seconds);
            fade(&controller, seconds, background).await?;
        }
        Commands::Watch { interval_ms } => watch(&controller, interval_ms).await?,
        Commands::CheckConfig => check_config(&config),
    }

    Ok(())
}

fn show_status(controller: &SystemVolumeController) -> Result<()> {
    info!("Showing default output device");

    match controller.describe_default_output() {
        Ok(device) => {
            println!("Default output: {}", device);
            println!("  Volume: {:.2}", device.volume.value());
            println!("  Muted:  {}", device.muted);
        }
        Err(VolumeError::DeviceNotFound) => println!("Default output: None available"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn set_volume(controller: &SystemVolumeController, level: f32, keep_mute: bool) -> Result<()> {
    info!("Manual volume change requested: {}", level);

    match controller.try_set_volume(level, !keep_mute)? {
        VolumeWrite::Muted => println!("✓ Level {:.2} is below the mute threshold; muted", level),
        VolumeWrite::Volume {
            level,
            mute_cleared,
        } => {
            println!("✓ Volume set to {:.2}", level.value());
            if mute_cleared {
                println!("  Mute cleared");
            }
        }
    }
    Ok(())
}

async fn fade(controller: &SystemVolumeController, seconds: f32, background: bool) -> Result<()> {
    let outcome = if background {
        let handle = controller.spawn_fade(seconds)?;
        let cancel = handle.cancel_token();
        println!("Fading to mute over {:.1}s (Ctrl+C to cancel)", seconds.abs());

        let mut worker = tokio::task::spawn_blocking(move || handle.join());
        tokio::select! {
            result = &mut worker => result??,
            _ = tokio::signal::ctrl_c() => {
                println!("Cancelling fade...");
                cancel.cancel();
                worker.await??
            }
        }
    } else {
        controller.run_fade(seconds, &FadeCancel::new())
    };

    match outcome {
        FadeOutcome::AlreadyMuted => println!("Already muted, nothing to do"),
        FadeOutcome::NoDevice => println!("✗ No default output device"),
        FadeOutcome::Completed { ticks, restored } => {
            println!("✓ Muted after {} steps; volume {:.2} kept for unmute", ticks, restored)
        }
        FadeOutcome::Cancelled { ticks, restored } => {
            println!("✗ Fade cancelled after {} steps; volume restored to {:.2}", ticks, restored)
        }
    }
    Ok(())
}

async fn watch(controller: &SystemVolumeController, interval_ms: u64) -> Result<()> {
    info!("Watching default output device every {}ms", interval_ms);
    println!("Watching default output device (Ctrl+C to stop)");

    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(50)));
    let mut last: Option<Option<OutputDeviceInfo>> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let current = controller.describe_default_output().ok();
                if last.as_ref() != Some(&current) {
                    match &current {
                        Some(device) => println!("{}", device),
                        None => println!("No default output device"),
                    }
                    last = Some(current);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("Watch stopped");
    Ok(())
}

fn check_config(config: &Config) {
    info!("Validating configuration");

    println!("Configuration validation:");
    println!("  ✓ Configuration file parsed successfully");
    println!("  ✓ Mute threshold: {:.2}", config.volume.mute_threshold);
    println!(
        "  ✓ Fade: {:.1}s default, {:.1}s max, {}ms ticks",
        config.fade.default_seconds, config.fade.max_seconds, config.fade.tick_ms
    );
    if config.fade.step_uses_clamped_duration {
        println!("  ✓ Fade step follows the capped duration");
    }
}
