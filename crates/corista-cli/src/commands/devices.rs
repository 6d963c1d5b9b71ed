//! Audio device listing.

use clap::Args;
use corista_engine::list_devices;

#[derive(Args)]
pub struct DevicesArgs {
    /// Only show capture-capable devices
    #[arg(long)]
    input_only: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;
    if devices.is_empty() {
        println!("No audio devices found");
        return Ok(());
    }

    println!("{:<40} {:>8} {:>8} {:>10}", "Device", "Input", "Output", "Rate");
    for device in devices {
        if args.input_only && !device.is_input {
            continue;
        }
        println!(
            "{:<40} {:>8} {:>8} {:>7} Hz",
            device.name,
            if device.is_input { "yes" } else { "-" },
            if device.is_output { "yes" } else { "-" },
            device.default_sample_rate,
        );
    }
    Ok(())
}
