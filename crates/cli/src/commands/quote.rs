use chrono::NaiveDate;
use serde::Serialize;

use haulquote_core::pricing::{quote, PricingTrace, QuoteRequest};
use haulquote_core::VehicleSelection;

use crate::commands::CommandResult;

#[derive(Debug, Clone)]
pub struct QuoteArgs {
    pub distance: f64,
    pub vehicle: String,
    pub pickup: Option<String>,
    pub dropoff: Option<String>,
    pub ship_date: Option<String>,
    pub trace: bool,
}

#[derive(Debug, Serialize)]
struct QuoteReport {
    command: &'static str,
    vehicle: String,
    distance_miles: f64,
    open_transport: u32,
    enclosed_transport: u32,
    transit_time_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<PricingTrace>,
}

pub fn run(args: QuoteArgs) -> CommandResult {
    let ship_date = args
        .ship_date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());
    let vehicle = VehicleSelection::from_label(&args.vehicle);

    let result = quote(&QuoteRequest {
        distance_miles: args.distance,
        vehicle: vehicle.clone(),
        ship_date,
        pickup_location: args.pickup,
        dropoff_location: args.dropoff,
    });

    let report = QuoteReport {
        command: "quote",
        vehicle: vehicle.label().to_string(),
        distance_miles: args.distance,
        open_transport: result.open_transport,
        enclosed_transport: result.enclosed_transport,
        transit_time_days: result.transit_time_days,
        message: result.message,
        trace: args.trace.then_some(result.trace),
    };

    CommandResult { exit_code: 0, output: crate::commands::render_json("quote", &report) }
}
