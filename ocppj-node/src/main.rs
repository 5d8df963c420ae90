//! OCPP-J Node - CLI for the ocppj endpoints
//!
//! Runs either side of an OCPP-J connection over WebSocket.
//!
//! # Usage
//!
//! ```bash
//! # CSMS on port 8887, accepting ws://host:8887/ocpp/<station id>
//! ocppj-node csms --port 8887 --path /ocpp
//!
//! # Station CS001 speaking OCPP 1.6J
//! ocppj-node --ocpp-version 1.6 station --id CS001 \
//!     --url ws://localhost:8887/ocpp
//! ```
//!
//! The CSMS answers BootNotification, Heartbeat, StatusNotification and
//! Authorize. The station boots, then heartbeats on the interval the CSMS
//! returns.

mod csms;
mod station;

use clap::{Parser, Subcommand, ValueEnum};
use ocppj::{EndpointConfig, OcppVersion};
use tracing_subscriber::EnvFilter;

/// OCPP-J central system or charging station
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OCPP version to speak
    #[arg(long, value_enum, default_value = "2.0.1", global = true)]
    ocpp_version: Version,

    /// Seconds to wait for a response to each request
    #[arg(long, default_value = "30", global = true)]
    response_timeout: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accept charging stations
    Csms {
        /// Listen port
        #[arg(short, long, default_value = "8887")]
        port: u16,

        /// URL path stations connect under
        #[arg(long, default_value = "/ocpp")]
        path: String,

        /// Heartbeat interval handed out in BootNotification responses (seconds)
        #[arg(long, default_value = "60")]
        heartbeat_interval: i32,
    },
    /// Connect to a CSMS as a charging station
    Station {
        /// Station identity (appended to the URL)
        #[arg(short, long, default_value = "EK3-001")]
        id: String,

        /// CSMS WebSocket URL
        #[arg(long, default_value = "ws://localhost:8887/ocpp")]
        url: String,

        /// Vendor name
        #[arg(long, default_value = "Elektrokombinacija")]
        vendor: String,

        /// Model name
        #[arg(long, default_value = "EK3-OCPP")]
        model: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Version {
    #[value(name = "1.6")]
    V16,
    #[value(name = "2.0.1")]
    V201,
}

impl From<Version> for OcppVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::V16 => OcppVersion::V16,
            Version::V201 => OcppVersion::V201,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    ocppj_profiles::register_enums();

    let config = EndpointConfig::new(args.ocpp_version.into())
        .with_response_timeout(std::time::Duration::from_secs(args.response_timeout));

    match args.command {
        Command::Csms {
            port,
            path,
            heartbeat_interval,
        } => {
            banner("CSMS", &[("Port", port.to_string()), ("Path", path.clone())], &config);
            csms::run(config, port, &path, heartbeat_interval).await?;
        }
        Command::Station {
            id,
            url,
            vendor,
            model,
        } => {
            banner("Charging Station", &[("Station", id.clone()), ("CSMS URL", truncate(&url, 50))], &config);
            station::run(config, &id, &url, &vendor, &model).await?;
        }
    }

    Ok(())
}

fn banner(role: &str, rows: &[(&str, String)], config: &EndpointConfig) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  OCPP-J Node - {:<45} ║", role);
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  {:<10}{:<50} ║", "OCPP:", config.version.to_string());
    for (label, value) in rows {
        println!("║  {:<10}{:<50} ║", format!("{label}:"), value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Truncate string with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("ws://short", 50), "ws://short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_parse_station_command() {
        let args = Args::try_parse_from([
            "ocppj-node",
            "--ocpp-version",
            "1.6",
            "station",
            "--id",
            "CS001",
        ])
        .unwrap();
        assert!(matches!(args.ocpp_version, Version::V16));
        assert!(matches!(args.command, Command::Station { ref id, .. } if id == "CS001"));
    }
}
