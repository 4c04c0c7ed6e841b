// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PI2PRINTER: mission briefings on a USB thermal printer.
//
// Entry point. Initialises logging, loads configuration, resolves the
// printer once, runs the requested command, and releases the printer.

mod services;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use pi2printer_core::PrinterConfig;
use pi2printer_core::error::Result;
use pi2printer_core::types::{MissionRecord, parse_record_json};
use pi2printer_print::KNOWN_THERMAL_PRINTERS;

use services::config_dir;
use services::printer_service::PrinterService;

#[derive(Debug, Parser)]
#[command(
    name = "pi2printer",
    about = "Print mission briefings on a USB thermal printer",
    version
)]
struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/pi2printer/config.json).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Name printed on the AGENT line.
    #[arg(long, global = true, value_name = "NAME")]
    agent: Option<String>,

    /// Characters per printed line.
    #[arg(long, global = true, value_name = "COLUMNS")]
    width: Option<std::num::NonZeroUsize>,

    /// Discard output instead of writing the fallback file when no printer is found.
    #[arg(long, global = true)]
    no_file_fallback: bool,

    /// Fallback file used when no printer is found.
    #[arg(long, global = true, value_name = "PATH")]
    fallback_file: Option<PathBuf>,

    /// Try this printer first, as VID:PID in hex (e.g. 04b8:0e15).
    #[arg(long, global = true, value_name = "VID:PID")]
    device: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a mission record or classifier analysis (JSON file, `-` for stdin).
    Print { record: PathBuf },
    /// Print the self-test page.
    Test,
    /// Show which output would be used.
    Status,
    /// List the known printers in probe order.
    Devices,
}

impl Cli {
    /// Layer command-line flags over the loaded settings.
    fn apply(&self, mut config: PrinterConfig) -> PrinterConfig {
        if let Some(agent) = &self.agent {
            config.agent_label = agent.clone();
        }
        if let Some(width) = self.width {
            config.column_width = width;
        }
        if self.no_file_fallback {
            config.allow_file_fallback = false;
        }
        if let Some(path) = &self.fallback_file {
            config.fallback_path = path.clone();
        }
        if let Some(device) = &self.device {
            config.preferred_device = Some(device.clone());
        }
        config
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "pi2printer failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    if let Command::Devices = cli.command {
        for device in KNOWN_THERMAL_PRINTERS {
            println!("{}  {}", device.usb_id(), device.name);
        }
        return Ok(true);
    }

    let config_path = cli.config.clone().unwrap_or_else(config_dir::config_path);
    let config = cli.apply(PrinterConfig::load_or_default(&config_path)?);
    info!(config = %config_path.display(), "PI2PRINTER starting");

    // Parse before touching the printer so bad input never claims the device.
    let record = match &cli.command {
        Command::Print { record } => Some(parse_record_json(&read_input(record)?)?),
        _ => None,
    };

    let mut service = PrinterService::init(&config)?;
    let ok = match (&cli.command, record) {
        (Command::Print { .. }, record) => {
            let record = record.unwrap_or_else(MissionRecord::no_task);
            let outcome = service.print_mission(&record);
            println!("{}", outcome.diagnostic);
            outcome.success
        }
        (Command::Test, _) => {
            let outcome = service.test_printer();
            println!("{}", outcome.diagnostic);
            outcome.success
        }
        (Command::Status | Command::Devices, _) => {
            println!("{}", service.printer_info());
            for attempt in service.attempts() {
                println!("  {}: {}", attempt.device, attempt.error);
            }
            true
        }
    };
    service.shutdown();
    Ok(ok)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_config() {
        let cli = Cli::try_parse_from([
            "pi2printer",
            "--agent",
            "Agent Roshin",
            "--width",
            "48",
            "--no-file-fallback",
            "--device",
            "04b8:0e15",
            "status",
        ])
        .unwrap();
        let config = cli.apply(PrinterConfig::default());
        assert_eq!(config.agent_label, "Agent Roshin");
        assert_eq!(config.column_width.get(), 48);
        assert!(!config.allow_file_fallback);
        assert_eq!(config.preferred_usb_id().unwrap(), Some((0x04b8, 0x0e15)));
    }

    #[test]
    fn zero_width_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["pi2printer", "--width", "0", "test"]).is_err());
    }

    #[test]
    fn print_takes_a_record_path() {
        let cli = Cli::try_parse_from(["pi2printer", "print", "-"]).unwrap();
        assert!(matches!(cli.command, Command::Print { ref record } if record.as_os_str() == "-"));
    }
}
