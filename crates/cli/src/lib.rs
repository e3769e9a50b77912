pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "haulquote",
    about = "Haulquote operator CLI",
    long_about = "Price shipments with the deterministic quote engine, relay test leads through the webhook dispatcher, and inspect configuration readiness.",
    after_help = "Examples:\n  haulquote quote --distance 2732 --vehicle car/truck/suv\n  haulquote send-test-lead --event-type final\n  haulquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a shipment with the deterministic quote engine")]
    Quote {
        #[arg(long, help = "Route distance in miles")]
        distance: f64,
        #[arg(long, help = "Vehicle type label, e.g. car/truck/suv")]
        vehicle: String,
        #[arg(long, help = "Pickup location as \"City, ST ZIP\"")]
        pickup: Option<String>,
        #[arg(long, help = "Dropoff location as \"City, ST ZIP\"")]
        dropoff: Option<String>,
        #[arg(long, help = "Requested ship date (YYYY-MM-DD)")]
        ship_date: Option<String>,
        #[arg(long, help = "Include the rule-by-rule pricing trace")]
        trace: bool,
    },
    #[command(
        name = "send-test-lead",
        about = "Relay a canned test lead through the configured webhook endpoints"
    )]
    SendTestLead {
        #[arg(
            long,
            value_parser = ["quote", "final"],
            default_value = "quote",
            help = "Submission kind to relay"
        )]
        event_type: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and webhook endpoint readiness checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[arg(long, help = "Also probe the configured webhook endpoints over HTTP")]
        probe: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Quote { distance, vehicle, pickup, dropoff, ship_date, trace } => {
            commands::quote::run(commands::quote::QuoteArgs {
                distance,
                vehicle,
                pickup,
                dropoff,
                ship_date,
                trace,
            })
        }
        Command::SendTestLead { event_type } => commands::send_test_lead::run(&event_type),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json, probe } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json, probe) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
