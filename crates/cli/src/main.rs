//! trackball CLI: inspect the PMW3360 startup sequence and sensor configuration.
//!
//! No hardware is needed. `trace` runs the real driver against a simulated
//! sensor and prints what would go over the wire.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};
use trackball_core::config::{load_config, SensorConfig};
use trackball_core::firmware::{FirmwareImage, PMW3360_SROM_LEN};
use trackball_core::motion::MotionSample;
use trackball_core::protocol::LinkMode;
use trackball_core::registers::Register;
use trackball_core::safety;
use trackball_core::transport::recording::{summarize, RecordingBus};
use trackball_core::Sensor;

/// SROM_ID the simulated sensor reports after a download.
const SIMULATED_SROM_ID: u8 = 0x04;

#[derive(Parser)]
#[command(
    name = "trackball",
    version,
    about = "PMW3360 trackball sensor inspection tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full startup sequence against a simulated sensor.
    Trace {
        /// Resolution applied after startup (100-25600, rounded to nearest 100).
        #[arg(long, default_value_t = safety::RESOLUTION_DEFAULT)]
        resolution: u16,
        /// SROM image to upload. A zero-filled placeholder is used if omitted.
        #[arg(long)]
        firmware: Option<PathBuf>,
        /// Keep rest modes enabled after the download.
        #[arg(long)]
        wireless: bool,
        /// Print every bus event instead of register transactions.
        #[arg(long)]
        raw: bool,
    },
    /// Show the Config1 value for a resolution.
    EncodeResolution {
        /// Resolution in CPI.
        cpi: u16,
    },
    /// Decode delta register bytes into a motion sample.
    Decode {
        #[arg(value_parser = parse_byte)]
        x_high: u8,
        #[arg(value_parser = parse_byte)]
        x_low: u8,
        #[arg(value_parser = parse_byte)]
        y_high: u8,
        #[arg(value_parser = parse_byte)]
        y_low: u8,
    },
    /// Load and validate a configuration file.
    CheckConfig {
        /// Path to a JSON configuration file.
        path: PathBuf,
    },
    /// Print the default configuration as JSON.
    DefaultConfig,
}

/// Parse a hex byte, with or without a `0x` prefix.
fn parse_byte(s: &str) -> std::result::Result<u8, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(hex, 16).map_err(|e| format!("invalid byte '{s}': {e}"))
}

fn simulated_sensor() -> RecordingBus {
    let mut bus = RecordingBus::new();
    bus.set_register(Register::ProductId, 0x42)
        .set_register(Register::InverseProductId, 0xBD)
        .set_register(Register::RevisionId, 0x01)
        .set_register(Register::SromId, SIMULATED_SROM_ID);
    bus
}

fn trace(resolution: u16, firmware: Option<PathBuf>, wireless: bool, raw: bool) -> Result<()> {
    let resolution = safety::validate_resolution(resolution)?;
    let image = match firmware {
        Some(path) => {
            let bytes = std::fs::read(&path)
                .map_err(|e| anyhow::anyhow!("read firmware {}: {e}", path.display()))?;
            debug!(path = %path.display(), len = bytes.len(), "Loaded SROM image");
            bytes
        }
        None => {
            warn!("No SROM image given, uploading a zero-filled placeholder");
            vec![0u8; PMW3360_SROM_LEN]
        }
    };
    let link_mode = if wireless {
        LinkMode::Wireless
    } else {
        LinkMode::Wired
    };

    let mut sensor =
        Sensor::new(simulated_sensor(), FirmwareImage::new(&image)).with_link_mode(link_mode);
    sensor.initialize_sensor(resolution)?;
    let state = sensor.state();
    let bus = sensor.into_inner();

    if raw {
        for event in bus.events() {
            println!("{event}");
        }
    } else {
        for transaction in summarize(bus.events()) {
            println!("{transaction}");
        }
    }
    println!();
    println!("Image:      {} bytes", image.len());
    println!("Resolution: {resolution} CPI");
    println!("Link mode:  {link_mode:?}");
    println!("State:      {state:?}");
    println!("Bus time:   {:.3} ms", bus.elapsed_us() as f64 / 1000.0);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Trace {
            resolution,
            firmware,
            wireless,
            raw,
        } => trace(resolution, firmware, wireless, raw)?,
        Commands::EncodeResolution { cpi } => {
            let rounded = safety::validate_resolution(cpi)?;
            let value = safety::encode_resolution(rounded)?;
            if rounded != cpi {
                println!("{cpi} CPI rounded to {rounded} CPI");
            }
            println!("Config1 = 0x{value:02X} ({rounded} CPI)");
        }
        Commands::Decode {
            x_high,
            x_low,
            y_high,
            y_low,
        } => {
            let sample = MotionSample::from_registers(x_high, x_low, y_high, y_low);
            let oriented = sample.oriented(SensorConfig::default().orientation);
            println!("dx = {}, dy = {}", sample.dx, sample.dy);
            println!("reported: dx = {}, dy = {}", oriented.dx, oriented.dy);
        }
        Commands::CheckConfig { path } => {
            let config = load_config(&path)?;
            println!("Config OK: {}", path.display());
            println!("{}", config.to_json()?);
        }
        Commands::DefaultConfig => {
            println!("{}", SensorConfig::default().to_json()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_byte_formats() {
        assert_eq!(parse_byte("0xFF"), Ok(0xFF));
        assert_eq!(parse_byte("80"), Ok(0x80));
        assert_eq!(parse_byte("0Xad"), Ok(0xAD));
        assert!(parse_byte("0x100").is_err());
        assert!(parse_byte("zz").is_err());
    }

    #[test]
    fn cli_parses_trace_flags() {
        let cli = Cli::try_parse_from(["trackball", "trace", "--resolution", "1600", "--wireless"])
            .unwrap();
        match cli.command {
            Commands::Trace {
                resolution,
                firmware,
                wireless,
                raw,
            } => {
                assert_eq!(resolution, 1600);
                assert!(firmware.is_none());
                assert!(wireless);
                assert!(!raw);
            }
            _ => panic!("expected trace"),
        }
    }

    #[test]
    fn trace_rejects_out_of_range_resolution() {
        assert!(trace(50, None, false, false).is_err());
    }

    #[test]
    fn trace_runs_with_placeholder_image() {
        trace(800, None, false, true).unwrap();
    }
}
