//! Command-line readout of the auxiliary enclosure sensors.
//!
//! Subcommands:
//! - `environmentals`: temperature and humidity of both sections (default)
//! - `inclination`: top section inclination
//! - `imu`: pitch, roll and heading

use std::time::Duration;

use anyhow::Result;
use aux_sensors::{
    EnvironmentalReadingAssembler, SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_PORT,
    NOT_CONFIGURED_TOKEN, NO_RESPONSE_TOKEN,
};
use clap::{Parser, Subcommand};
use tracing::info;

/// Auxiliary sensor readout
#[derive(Parser, Debug)]
#[command(name = "aux_sensors")]
#[command(about = "Read temperature, humidity and inclination from the auxiliary sensor boards")]
#[command(version)]
struct Args {
    /// Serial device of the multiplexer board
    #[arg(long, global = true, default_value = DEFAULT_PORT)]
    port: String,

    /// Baud rate
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Read timeout per reply line in milliseconds
    #[arg(long, global = true, default_value = "2000")]
    timeout_ms: u64,

    /// Print the reading as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Temperature and relative humidity of both sections
    #[default]
    Environmentals,
    /// Inclination of the top section
    Inclination,
    /// Pitch, roll and heading of the top-section IMU
    Imu,
}

fn print_banner() {
    println!("{}", "*".repeat(80));
    println!("Reading the auxiliary sensors.");
    println!("Remember to switch on power to the aux board first.");
    println!("\nReturns:");
    println!("\t- {NO_RESPONSE_TOKEN}: no data was received. Check power and cabling (Rx/Tx swap?)");
    println!(
        "\t- {NOT_CONFIGURED_TOKEN}: there is communication with the boards,\n\t\tbut no sensor board is installed or the sensor could not be read"
    );
    println!("{}\n", "*".repeat(80));
}

fn print_entries<'a>(entries: impl IntoIterator<Item = &'a (&'static str, String)>) {
    for (key, value) in entries {
        if value == NO_RESPONSE_TOKEN || value == NOT_CONFIGURED_TOKEN {
            println!("Received {value} for {key}. Check explanation above for more info.");
        } else {
            println!("sensor {key}: {value}");
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = SerialConfig {
        port: args.port.clone(),
        baud_rate: args.baud,
        timeout: Duration::from_millis(args.timeout_ms),
    };

    info!("Opening {} at {} baud", config.port, config.baud_rate);
    let mut sensors = EnvironmentalReadingAssembler::open(&config)?;

    if !args.json {
        print_banner();
    }

    match args.command.unwrap_or_default() {
        Command::Environmentals => {
            let reading = sensors.get_environmentals()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&reading)?);
            } else {
                println!("Returned from sensors:");
                print_entries(&reading.entries());
            }
        }
        Command::Inclination => {
            let inclination = sensors.get_inclination()?;
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "inclination": inclination }))?
                );
            } else {
                print_entries(&[("inclination", inclination.to_string())]);
            }
        }
        Command::Imu => {
            let imu = sensors.get_imu()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&imu)?);
            } else {
                print_entries(&imu.entries());
            }
        }
    }

    Ok(())
}
