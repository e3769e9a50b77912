use serde::Serialize;
use uuid::Uuid;

use haulquote_core::config::{AppConfig, LoadOptions};
use haulquote_core::payload::{EventType, LeadRecord};
use haulquote_core::pricing::{quote, QuoteRequest};
use haulquote_core::{VehicleSelection, VehicleType};
use haulquote_relay::{DiagnosticsLog, Dispatcher};

use crate::commands::CommandResult;

const TEST_DISTANCE_MILES: f64 = 1478.0;
const TEST_PICKUP: &str = "Miami, FL 33101";
const TEST_DROPOFF: &str = "Boston, MA 02108";

#[derive(Debug, Serialize)]
struct TestLeadReport {
    command: &'static str,
    status: &'static str,
    event_type: &'static str,
    endpoint: &'static str,
    request_id: String,
    submission_id: String,
    success: bool,
    message: String,
}

/// Push one canned, engine-priced lead through the real dispatcher so an
/// operator can verify the downstream automation mapping end to end.
pub fn run(event_type: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "send-test-lead",
                "config_validation",
                error.to_string(),
                2,
            )
        }
    };

    let event = if event_type == "final" {
        EventType::FinalSubmission
    } else {
        EventType::QuoteSubmission
    };
    let record = test_lead(event);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "send-test-lead",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        }
    };

    let diagnostics = DiagnosticsLog::new(config.relay.diagnostics_capacity);
    let dispatcher = match Dispatcher::new(config.relay.clone(), diagnostics) {
        Ok(dispatcher) => dispatcher,
        Err(error) => {
            return CommandResult::failure("send-test-lead", "relay_init", error.to_string(), 3)
        }
    };

    let report = runtime.block_on(dispatcher.dispatch(&record));

    let payload = TestLeadReport {
        command: "send-test-lead",
        status: if report.success { "ok" } else { "error" },
        event_type: event.as_str(),
        endpoint: report.endpoint.as_str(),
        request_id: report.request_id,
        submission_id: record.submission_id,
        success: report.success,
        message: report.message,
    };
    CommandResult {
        exit_code: if payload.success { 0 } else { 1 },
        output: crate::commands::render_json("send-test-lead", &payload),
    }
}

/// A deterministic shipment priced by the real engine, so the numbers in
/// the downstream automation always match what the form would have sent.
fn test_lead(event_type: EventType) -> LeadRecord {
    let pricing = quote(&QuoteRequest {
        distance_miles: TEST_DISTANCE_MILES,
        vehicle: VehicleSelection::Known(VehicleType::CarTruckSuv),
        ship_date: None,
        pickup_location: Some(TEST_PICKUP.to_string()),
        dropoff_location: Some(TEST_DROPOFF.to_string()),
    });

    LeadRecord {
        name: Some("Test Lead".to_string()),
        email: Some("test-lead@example.com".to_string()),
        phone: Some("555-0100".to_string()),
        pickup_location: Some(TEST_PICKUP.to_string()),
        dropoff_location: Some(TEST_DROPOFF.to_string()),
        distance_miles: Some(TEST_DISTANCE_MILES),
        transit_time_days: Some(pricing.transit_time_days),
        open_transport_price: Some(pricing.open_transport),
        enclosed_transport_price: Some(pricing.enclosed_transport),
        vehicle_year: Some("2019".to_string()),
        vehicle_make: Some("Honda".to_string()),
        vehicle_model: Some("Accord".to_string()),
        vehicle_type: Some(VehicleType::CarTruckSuv.label().to_string()),
        ship_date: Some("2026-09-01".to_string()),
        submission_id: format!("TEST-{}", Uuid::new_v4().simple()),
        submission_date: chrono::Utc::now().to_rfc3339(),
        event_type,
        referrer: Some("haulquote-cli".to_string()),
        ..LeadRecord::default()
    }
}
