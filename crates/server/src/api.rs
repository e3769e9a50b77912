//! Quote and submission endpoints.
//!
//! Submissions answer HTTP 200 even when the relay reports a hard failure:
//! the form must be able to move the visitor forward regardless of a
//! third-party hiccup, so delivery status travels in the body.

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use haulquote_core::payload::{EventType, LeadRecord};
use haulquote_core::pricing::{quote, PricingTrace, QuoteRequest, QuoteResult};
use haulquote_core::VehicleSelection;
use haulquote_relay::spawn_attribution;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuoteBody {
    #[serde(alias = "distance")]
    pub distance_miles: f64,
    #[serde(alias = "vehicleType")]
    pub vehicle_type: String,
    #[serde(alias = "shipmentDate")]
    pub ship_date: Option<String>,
    #[serde(alias = "pickupLocation")]
    pub pickup_location: Option<String>,
    #[serde(alias = "dropoffLocation")]
    pub dropoff_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuoteQuery {
    pub trace: bool,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub open_transport: u32,
    pub enclosed_transport: u32,
    pub transit_time_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<PricingTrace>,
}

impl QuoteResponse {
    fn from_result(result: QuoteResult, include_trace: bool) -> Self {
        Self {
            open_transport: result.open_transport,
            enclosed_transport: result.enclosed_transport,
            transit_time_days: result.transit_time_days,
            message: result.message,
            trace: include_trace.then_some(result.trace),
        }
    }
}

pub async fn post_quote(
    Query(query): Query<QuoteQuery>,
    Json(body): Json<QuoteBody>,
) -> Json<QuoteResponse> {
    let ship_date = body
        .ship_date
        .as_deref()
        .and_then(|raw| chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());

    let result = quote(&QuoteRequest {
        distance_miles: body.distance_miles,
        vehicle: VehicleSelection::from_label(&body.vehicle_type),
        ship_date,
        pickup_location: body.pickup_location,
        dropoff_location: body.dropoff_location,
    });

    Json(QuoteResponse::from_result(result, query.trace))
}

/// Lead fields as the form posts them. Names follow the form's wire
/// convention; everything is optional so a partial submission still
/// relays whatever it carried.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LeadSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "pickupLocation")]
    pub pickup_location: Option<String>,
    #[serde(rename = "dropoffLocation")]
    pub dropoff_location: Option<String>,
    #[serde(rename = "pickupZip")]
    pub pickup_zip: Option<String>,
    #[serde(rename = "dropoffZip")]
    pub dropoff_zip: Option<String>,
    pub distance: Option<f64>,
    #[serde(rename = "transitTime")]
    pub transit_time: Option<u32>,
    #[serde(rename = "openTransportPrice")]
    pub open_transport_price: Option<u32>,
    #[serde(rename = "enclosedTransportPrice")]
    pub enclosed_transport_price: Option<u32>,
    pub year: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "shipmentDate")]
    pub shipment_date: Option<String>,
    #[serde(rename = "submissionId")]
    pub submission_id: Option<String>,
    #[serde(rename = "submissionDate")]
    pub submission_date: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub fbclid: Option<String>,
    pub referrer: Option<String>,
}

impl LeadSubmission {
    fn into_record(self, event_type: EventType) -> LeadRecord {
        LeadRecord {
            name: self.name,
            email: self.email,
            phone: self.phone,
            pickup_location: self.pickup_location,
            dropoff_location: self.dropoff_location,
            pickup_zip: self.pickup_zip,
            dropoff_zip: self.dropoff_zip,
            distance_miles: self.distance,
            transit_time_days: self.transit_time,
            open_transport_price: self.open_transport_price,
            enclosed_transport_price: self.enclosed_transport_price,
            vehicle_year: self.year,
            vehicle_make: self.make,
            vehicle_model: self.model,
            vehicle_type: self.vehicle_type,
            ship_date: self.shipment_date,
            submission_id: self
                .submission_id
                .unwrap_or_else(|| format!("AUTO-{}", Uuid::new_v4().simple())),
            submission_date: self.submission_date.unwrap_or_else(|| Utc::now().to_rfc3339()),
            event_type,
            utm_source: self.utm_source,
            utm_medium: self.utm_medium,
            utm_campaign: self.utm_campaign,
            utm_term: self.utm_term,
            utm_content: self.utm_content,
            fbclid: self.fbclid,
            referrer: self.referrer,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub request_id: String,
    pub submission_id: String,
}

pub async fn post_lead(
    State(state): State<AppState>,
    Json(submission): Json<LeadSubmission>,
) -> Json<SubmitResponse> {
    relay_submission(state, submission, EventType::QuoteSubmission).await
}

pub async fn post_order(
    State(state): State<AppState>,
    Json(submission): Json<LeadSubmission>,
) -> Json<SubmitResponse> {
    relay_submission(state, submission, EventType::FinalSubmission).await
}

async fn relay_submission(
    state: AppState,
    submission: LeadSubmission,
    event_type: EventType,
) -> Json<SubmitResponse> {
    let record = submission.into_record(event_type);

    spawn_attribution(state.dispatcher.http_client(), &state.attribution, &record);

    let report = state.dispatcher.dispatch(&record).await;
    info!(
        event_name = "api.submission.relayed",
        submission_id = %record.submission_id,
        event_type = event_type.as_str(),
        success = report.success,
        outcome = ?report.outcome,
        "submission relayed"
    );

    Json(SubmitResponse {
        success: report.success,
        message: report.message,
        request_id: report.request_id,
        submission_id: record.submission_id,
    })
}
