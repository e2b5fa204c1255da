use anyhow::Result;
use audio_volume_control::{Config, SystemVolumeController};

fn main() -> Result<()> {
    // Initialize simple console logging
    tracing_subscriber::fmt::init();

    println!("Default Output Volume Example");
    println!("=============================");

    let controller = SystemVolumeController::new_production(&Config::default());

    match controller.describe_default_output() {
        Ok(device) => println!("Default Output: {}", device),
        Err(e) => {
            println!("Default Output: None ({})", e);
            return Ok(());
        }
    }

    println!("\n--- UI-facing reads ---");
    println!("Volume: {:.2}", controller.get_volume());
    println!("Muted:  {}", controller.get_muted());

    Ok(())
}
