//! The canonical lead record and its webhook wire shape.
//!
//! Downstream automation maps fields by two different conventions, so the
//! wire body is one JSON object carrying both: machine-style keys
//! (snake_case plus camelCase duplicates and a nested `contactInfo`) and
//! human-labeled keys ("Contact Info Name", "Route Details Pickup City").
//! Both views always describe the same underlying value; the labeled view
//! wins on key collision.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::location::{extract_city, extract_state, extract_zip};

/// Placeholder for optional text fields the submitter left blank.
pub const NOT_PROVIDED: &str = "Not provided";

/// Discriminator deciding which automation endpoint receives the lead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    QuoteSubmission,
    FinalSubmission,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuoteSubmission => "quote_submission",
            Self::FinalSubmission => "final_submission",
        }
    }
}

impl Default for EventType {
    fn default() -> Self {
        Self::QuoteSubmission
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one submission carries, in one place. Wire shapes are derived
/// from this record by [`webhook_body`]; nothing else builds payload JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    /// Explicit ZIPs, when the form collected them separately. These win
    /// over values derived from the location strings.
    pub pickup_zip: Option<String>,
    pub dropoff_zip: Option<String>,

    pub distance_miles: Option<f64>,
    pub transit_time_days: Option<u32>,
    pub open_transport_price: Option<u32>,
    pub enclosed_transport_price: Option<u32>,

    pub vehicle_year: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_type: Option<String>,

    /// Raw shipment date as submitted; reformatted to MM/DD/YYYY on the
    /// wire when it parses, passed through verbatim when it does not.
    pub ship_date: Option<String>,

    pub submission_id: String,
    pub submission_date: String,
    pub event_type: EventType,

    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub fbclid: Option<String>,
    pub referrer: Option<String>,
}

impl LeadRecord {
    /// At least one of email/phone, the identifiers the attribution
    /// side-channel matches on.
    pub fn has_contact_identifier(&self) -> bool {
        let filled = |value: &Option<String>| {
            value.as_deref().map(|text| !text.trim().is_empty()).unwrap_or(false)
        };
        filled(&self.email) || filled(&self.phone)
    }
}

/// Render a submitted date as MM/DD/YYYY. Unparseable input comes back
/// verbatim; formatting never fails a dispatch.
pub fn format_shipment_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%m/%d/%Y").to_string();
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return stamp.date_naive().format("%m/%d/%Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return date.format("%m/%d/%Y").to_string();
    }
    raw.to_string()
}

fn text(value: &Option<String>) -> Value {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Value::from(text),
        _ => Value::from(NOT_PROVIDED),
    }
}

fn derived(value: Option<&str>) -> Value {
    match value {
        Some(text) => Value::from(text),
        None => Value::from(NOT_PROVIDED),
    }
}

/// Prices serialize as numbers, except zero and missing, which render as
/// the text sentinel (a zero-price quote is the short-haul sentinel case,
/// not a real price).
fn price(value: Option<u32>) -> Value {
    match value {
        Some(dollars) if dollars > 0 => Value::from(dollars),
        _ => Value::from(NOT_PROVIDED),
    }
}

fn nullable(value: &Option<String>) -> Value {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Value::from(text),
        _ => Value::Null,
    }
}

fn zip(explicit: &Option<String>, location: &Option<String>) -> Value {
    match explicit.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Value::from(text),
        _ => derived(location.as_deref().and_then(extract_zip)),
    }
}

/// Build the merged dual-convention webhook body for one lead.
pub fn webhook_body(record: &LeadRecord) -> Value {
    let shipment_date = record
        .ship_date
        .as_deref()
        .map(format_shipment_date)
        .unwrap_or_else(|| NOT_PROVIDED.to_string());
    let pickup = record.pickup_location.as_deref();
    let dropoff = record.dropoff_location.as_deref();

    let machine = json!({
        "contactInfo": {
            "name": text(&record.name),
            "email": text(&record.email),
            "phone": text(&record.phone),
        },
        "name": text(&record.name),
        "email": text(&record.email),
        "phone": text(&record.phone),

        "pickupLocation": text(&record.pickup_location),
        "dropoffLocation": text(&record.dropoff_location),
        "pickup_city": derived(pickup.and_then(extract_city)),
        "pickup_state": derived(pickup.and_then(extract_state)),
        "pickup_zip": zip(&record.pickup_zip, &record.pickup_location),
        "pickupZip": zip(&record.pickup_zip, &record.pickup_location),
        "dropoff_city": derived(dropoff.and_then(extract_city)),
        "dropoff_state": derived(dropoff.and_then(extract_state)),
        "dropoff_zip": zip(&record.dropoff_zip, &record.dropoff_location),
        "dropoffZip": zip(&record.dropoff_zip, &record.dropoff_location),

        "distance": record.distance_miles.unwrap_or(0.0),
        "transit_time": record.transit_time_days.unwrap_or(0),
        "transitTime": record.transit_time_days.unwrap_or(0),

        "open_transport_price": price(record.open_transport_price),
        "enclosed_transport_price": price(record.enclosed_transport_price),
        "openTransportPrice": price(record.open_transport_price),
        "enclosedTransportPrice": price(record.enclosed_transport_price),

        "vehicle_year": text(&record.vehicle_year),
        "vehicle_make": text(&record.vehicle_make),
        "vehicle_model": text(&record.vehicle_model),
        "vehicle_type": text(&record.vehicle_type),
        "year": text(&record.vehicle_year),
        "make": text(&record.vehicle_make),
        "model": text(&record.vehicle_model),
        "vehicleType": text(&record.vehicle_type),

        "shipment_date": shipment_date,
        "submission_date": record.submission_date,
        "shipmentDate": text(&record.ship_date),
        "submissionDate": record.submission_date,

        "submission_id": record.submission_id,
        "event_type": record.event_type.as_str(),
        "submissionId": record.submission_id,
        "eventType": record.event_type.as_str(),

        "fbclid": nullable(&record.fbclid),
        "utm_source": nullable(&record.utm_source),
        "utm_medium": nullable(&record.utm_medium),
        "utm_campaign": nullable(&record.utm_campaign),
        "utm_term": nullable(&record.utm_term),
        "utm_content": nullable(&record.utm_content),
        "referrer": record.referrer.clone().unwrap_or_default(),
    });

    let labeled = json!({
        "submissionId": record.submission_id,
        "submissionDate": record.submission_date,
        "eventType": record.event_type.as_str(),

        "Contact Info Name": text(&record.name),
        "Contact Info Email": text(&record.email),
        "Contact Info Phone (required)": text(&record.phone),

        "Route Details Pickup City": derived(pickup.and_then(extract_city)),
        "Route Details Pickup State": derived(pickup.and_then(extract_state)),
        "Route Details Pickup Zip": zip(&record.pickup_zip, &record.pickup_location),
        "Route Details Dropoff City": derived(dropoff.and_then(extract_city)),
        "Route Details Dropoff State": derived(dropoff.and_then(extract_state)),
        "Route Details Dropoff Zip": zip(&record.dropoff_zip, &record.dropoff_location),
        "Route Details Distance (in miles)": record.distance_miles.unwrap_or(0.0),
        "Route Details Estimated Transit Time": record.transit_time_days.unwrap_or(0),

        "Price Details Total Price (Open Transport Only)": price(record.open_transport_price),

        "Vehicle Details Year": text(&record.vehicle_year),
        "Vehicle Details Make": text(&record.vehicle_make),
        "Vehicle Details Model": text(&record.vehicle_model),

        "Route Details Shipment Date": shipment_date,

        "pickupLocation": text(&record.pickup_location),
        "dropoffLocation": text(&record.dropoff_location),
        "vehicleType": text(&record.vehicle_type),
        "shipmentDate": shipment_date,
        "enclosedTransportPrice": price(record.enclosed_transport_price),
    });

    let mut merged: Map<String, Value> = match machine {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(labeled) = labeled {
        for (key, value) in labeled {
            merged.insert(key, value);
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::{format_shipment_date, webhook_body, EventType, LeadRecord, NOT_PROVIDED};

    fn sample() -> LeadRecord {
        LeadRecord {
            name: Some("Ron Burgundy".to_string()),
            email: Some("ron@channel4.example".to_string()),
            phone: Some("619-555-0142".to_string()),
            pickup_location: Some("San Diego, CA 92101".to_string()),
            dropoff_location: Some("New York, NY 10001".to_string()),
            distance_miles: Some(2805.0),
            transit_time_days: Some(9),
            open_transport_price: Some(1723),
            enclosed_transport_price: Some(2412),
            vehicle_year: Some("1972".to_string()),
            vehicle_make: Some("Oldsmobile".to_string()),
            vehicle_model: Some("Cutlass".to_string()),
            vehicle_type: Some("car/truck/suv".to_string()),
            ship_date: Some("2026-08-20".to_string()),
            submission_id: "AUTO-test-1".to_string(),
            submission_date: "2026-08-04T12:00:00Z".to_string(),
            event_type: EventType::QuoteSubmission,
            referrer: Some("https://example.com".to_string()),
            ..LeadRecord::default()
        }
    }

    #[test]
    fn machine_and_labeled_views_agree() {
        let body = webhook_body(&sample());
        assert_eq!(body["Vehicle Details Year"], body["vehicle_year"]);
        assert_eq!(body["Vehicle Details Year"], body["year"]);
        assert_eq!(body["Contact Info Name"], body["name"]);
        assert_eq!(body["Route Details Pickup City"], body["pickup_city"]);
        assert_eq!(body["Route Details Dropoff Zip"], body["dropoff_zip"]);
        assert_eq!(
            body["Price Details Total Price (Open Transport Only)"],
            body["open_transport_price"]
        );
        assert_eq!(body["contactInfo"]["email"], body["email"]);
    }

    #[test]
    fn zips_derive_from_locations_and_explicit_values_win() {
        let mut record = sample();
        let body = webhook_body(&record);
        assert_eq!(body["pickup_zip"], "92101");
        assert_eq!(body["dropoff_zip"], "10001");

        record.pickup_zip = Some("92108".to_string());
        let body = webhook_body(&record);
        assert_eq!(body["pickup_zip"], "92108");
        assert_eq!(body["Route Details Pickup Zip"], "92108");
    }

    #[test]
    fn missing_fields_render_the_sentinel() {
        let record = LeadRecord {
            submission_id: "AUTO-test-2".to_string(),
            submission_date: "2026-08-04T12:00:00Z".to_string(),
            ..LeadRecord::default()
        };
        let body = webhook_body(&record);
        assert_eq!(body["name"], NOT_PROVIDED);
        assert_eq!(body["pickup_zip"], NOT_PROVIDED);
        assert_eq!(body["openTransportPrice"], NOT_PROVIDED);
        assert_eq!(body["distance"], 0.0);
        assert_eq!(body["utm_source"], serde_json::Value::Null);
        assert_eq!(body["referrer"], "");
    }

    #[test]
    fn labeled_shipment_date_overwrites_the_raw_one() {
        let body = webhook_body(&sample());
        // The machine view carries the raw date, but the labeled view's
        // formatted value wins the merge for the shared camelCase key.
        assert_eq!(body["shipment_date"], "08/20/2026");
        assert_eq!(body["shipmentDate"], "08/20/2026");
        assert_eq!(body["Route Details Shipment Date"], "08/20/2026");
    }

    #[test]
    fn date_formatting_accepts_common_shapes_and_falls_back() {
        assert_eq!(format_shipment_date("2026-08-20"), "08/20/2026");
        assert_eq!(format_shipment_date("2026-08-20T15:30:00Z"), "08/20/2026");
        assert_eq!(format_shipment_date("08/20/2026"), "08/20/2026");
        assert_eq!(format_shipment_date("whenever works"), "whenever works");
    }

    #[test]
    fn event_type_strings_match_the_wire_contract() {
        assert_eq!(EventType::QuoteSubmission.as_str(), "quote_submission");
        assert_eq!(EventType::FinalSubmission.as_str(), "final_submission");
        let body = webhook_body(&sample());
        assert_eq!(body["eventType"], "quote_submission");
        assert_eq!(body["event_type"], "quote_submission");
    }

    #[test]
    fn contact_identifier_requires_email_or_phone() {
        let mut record = LeadRecord::default();
        assert!(!record.has_contact_identifier());
        record.phone = Some("  ".to_string());
        assert!(!record.has_contact_identifier());
        record.email = Some("lead@example.com".to_string());
        assert!(record.has_contact_identifier());
    }
}
