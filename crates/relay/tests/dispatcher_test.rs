//! Dispatcher integration tests against a local stub receiver.
//!
//! The stub is a real axum server on an ephemeral port, scripted with a
//! queue of statuses to return; once the queue drains it answers 200.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use tokio::sync::Mutex;

use haulquote_core::config::RelayConfig;
use haulquote_core::payload::{EventType, LeadRecord};
use haulquote_relay::{AttemptPhase, DeliveryOutcome, DiagnosticsLog, Dispatcher};

#[derive(Clone, Debug)]
struct Hit {
    tag: String,
    request_id: String,
    retry_header: bool,
    body: serde_json::Value,
}

#[derive(Clone, Default)]
struct Receiver {
    hits: Arc<Mutex<Vec<Hit>>>,
    /// Status codes to answer with, in order; 0 means "sleep 2s then 200"
    /// to exercise the client timeout. Empty queue answers 200.
    statuses: Arc<Mutex<Vec<u16>>>,
}

async fn catch(
    State(receiver): State<Receiver>,
    Path(tag): Path<String>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let status = {
        let mut statuses = receiver.statuses.lock().await;
        if statuses.is_empty() {
            200
        } else {
            statuses.remove(0)
        }
    };

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    receiver.hits.lock().await.push(Hit {
        tag,
        request_id: header("x-request-id"),
        retry_header: headers.contains_key("x-retry"),
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    });

    if status == 0 {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        return StatusCode::OK;
    }
    StatusCode::from_u16(status).expect("scripted status")
}

async fn start_receiver(statuses: Vec<u16>) -> (String, Receiver) {
    let receiver = Receiver {
        hits: Arc::new(Mutex::new(Vec::new())),
        statuses: Arc::new(Mutex::new(statuses)),
    };
    let app = Router::new().route("/hooks/{tag}", post(catch)).with_state(receiver.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let base = format!("http://{}", listener.local_addr().expect("stub addr"));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub serve");
    });
    (base, receiver)
}

fn relay_config(base: &str) -> RelayConfig {
    RelayConfig {
        lead_url: format!("{base}/hooks/lead").into(),
        order_url: format!("{base}/hooks/order").into(),
        retry_url: format!("{base}/hooks/lead-alt").into(),
        timeout_secs: 5,
        retry_delay_secs: 0,
        user_agent: "Haulquote-Relay/1.0".to_string(),
        diagnostics_capacity: 16,
    }
}

fn dispatcher(base: &str) -> Dispatcher {
    Dispatcher::new(relay_config(base), DiagnosticsLog::new(16)).expect("dispatcher")
}

fn lead(event_type: EventType) -> LeadRecord {
    LeadRecord {
        name: Some("Test Lead".to_string()),
        email: Some("lead@example.com".to_string()),
        phone: Some("555-0100".to_string()),
        pickup_location: Some("Miami, FL 33101".to_string()),
        dropoff_location: Some("Boston, MA 02108".to_string()),
        distance_miles: Some(1478.0),
        transit_time_days: Some(5),
        open_transport_price: Some(1150),
        enclosed_transport_price: Some(1610),
        vehicle_year: Some("2019".to_string()),
        vehicle_make: Some("Honda".to_string()),
        vehicle_model: Some("Accord".to_string()),
        vehicle_type: Some("car/truck/suv".to_string()),
        ship_date: Some("2026-08-20".to_string()),
        submission_id: "AUTO-test".to_string(),
        submission_date: "2026-08-04T12:00:00Z".to_string(),
        event_type,
        ..LeadRecord::default()
    }
}

#[tokio::test]
async fn quote_submission_targets_the_lead_endpoint() {
    let (base, receiver) = start_receiver(vec![]).await;
    let report = dispatcher(&base).dispatch(&lead(EventType::QuoteSubmission)).await;

    assert!(report.success);
    assert_eq!(report.outcome, DeliveryOutcome::Delivered);

    let hits = receiver.hits.lock().await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tag, "lead");
    assert!(!hits[0].retry_header);
    assert_eq!(hits[0].body["eventType"], "quote_submission");
    // Both naming conventions ride in the same body.
    assert_eq!(hits[0].body["Contact Info Name"], hits[0].body["name"]);
    assert_eq!(hits[0].body["Route Details Pickup Zip"], "33101");
}

#[tokio::test]
async fn final_submission_targets_the_order_endpoint() {
    let (base, receiver) = start_receiver(vec![]).await;
    let report = dispatcher(&base).dispatch(&lead(EventType::FinalSubmission)).await;

    assert!(report.success);
    let hits = receiver.hits.lock().await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tag, "order");
    assert_eq!(hits[0].body["event_type"], "final_submission");
}

#[tokio::test]
async fn transient_502_retries_once_on_the_alternate_url() {
    let (base, receiver) = start_receiver(vec![502]).await;
    let relay = dispatcher(&base);
    let report = relay.dispatch(&lead(EventType::QuoteSubmission)).await;

    assert!(report.success);
    assert_eq!(report.outcome, DeliveryOutcome::RetriedDelivered);

    let hits = receiver.hits.lock().await;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].tag, "lead");
    assert_eq!(hits[1].tag, "lead-alt");
    assert!(hits[1].retry_header);
    assert!(hits[1].request_id.ends_with("_retry"));

    let recent = relay.diagnostics().recent().await;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].phase, AttemptPhase::Retry);
    assert!(recent[0].success);
    assert!(!recent[1].success);
    assert_eq!(recent[1].status, Some(502));
}

#[tokio::test]
async fn order_failures_still_retry_against_the_lead_alternate() {
    // Longstanding quirk, kept on purpose: the retry URL is fixed to the
    // lead endpoint's alternate form even when the order endpoint failed.
    let (base, receiver) = start_receiver(vec![502]).await;
    let report = dispatcher(&base).dispatch(&lead(EventType::FinalSubmission)).await;

    assert!(report.success);
    assert_eq!(report.outcome, DeliveryOutcome::RetriedDelivered);

    let hits = receiver.hits.lock().await;
    assert_eq!(hits[0].tag, "order");
    assert_eq!(hits[1].tag, "lead-alt");
}

#[tokio::test]
async fn failed_retry_still_reports_best_effort_success() {
    let (base, receiver) = start_receiver(vec![503, 500]).await;
    let relay = dispatcher(&base);
    let report = relay.dispatch(&lead(EventType::QuoteSubmission)).await;

    assert!(report.success);
    assert_eq!(report.outcome, DeliveryOutcome::RetryExhausted);
    assert_eq!(receiver.hits.lock().await.len(), 2);

    let stats = relay.diagnostics().stats().await;
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.failures, 2);
}

#[tokio::test]
async fn non_retryable_status_is_a_hard_failure() {
    let (base, receiver) = start_receiver(vec![500]).await;
    let report = dispatcher(&base).dispatch(&lead(EventType::QuoteSubmission)).await;

    assert!(!report.success);
    assert_eq!(report.outcome, DeliveryOutcome::HardFailure);
    assert!(report.message.contains("Webhook error (500)"));
    // No retry for plain server errors.
    assert_eq!(receiver.hits.lock().await.len(), 1);
}

#[tokio::test]
async fn network_error_on_first_attempt_is_a_hard_failure() {
    // Bind then drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let relay = dispatcher(&base);
    let report = relay.dispatch(&lead(EventType::QuoteSubmission)).await;

    assert!(!report.success);
    assert_eq!(report.outcome, DeliveryOutcome::HardFailure);
    assert!(report.message.starts_with("Network error"));

    let recent = relay.diagnostics().recent().await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].status, None);
}

#[tokio::test]
async fn first_attempt_timeout_is_a_hard_failure_not_a_retry() {
    let (base, receiver) = start_receiver(vec![0]).await;
    let mut config = relay_config(&base);
    config.timeout_secs = 1;
    let relay = Dispatcher::new(config, DiagnosticsLog::new(4)).expect("dispatcher");

    let report = relay.dispatch(&lead(EventType::QuoteSubmission)).await;

    assert!(!report.success);
    assert_eq!(report.outcome, DeliveryOutcome::HardFailure);
    assert!(report.message.contains("timed out"));
    // The stub saw the request, but no retry followed the timeout.
    assert_eq!(receiver.hits.lock().await.len(), 1);
}
