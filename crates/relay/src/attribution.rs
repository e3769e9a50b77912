//! Marketing-attribution side-channel.
//!
//! Runs next to the main webhook, never instead of it: the payload carries
//! only the identifiers the CRM matches on plus the UTM/click parameters.
//! The POST happens on a spawned task with its own error boundary, so a
//! down analytics endpoint cannot slow down or fail a submission.

use serde::Serialize;
use tracing::{debug, warn};

use haulquote_core::config::AttributionConfig;
use haulquote_core::payload::LeadRecord;

const ATTRIBUTION_USER_AGENT: &str = "Haulquote-Attribution/1.0";
const TRACK_PATH: &str = "/track-lead-source";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttributionPayload {
    pub email: String,
    pub phone: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub fbclid: Option<String>,
    pub referrer: Option<String>,
}

impl AttributionPayload {
    pub fn from_lead(lead: &LeadRecord) -> Self {
        Self {
            email: lead.email.clone().unwrap_or_default(),
            phone: lead.phone.clone().unwrap_or_default(),
            utm_source: lead.utm_source.clone(),
            utm_medium: lead.utm_medium.clone(),
            utm_campaign: lead.utm_campaign.clone(),
            utm_term: lead.utm_term.clone(),
            utm_content: lead.utm_content.clone(),
            fbclid: lead.fbclid.clone(),
            referrer: lead.referrer.clone(),
        }
    }
}

/// Fire the attribution POST in the background, if it applies. Returns
/// whether a task was actually spawned, which is all the caller may depend
/// on - delivery results only ever show up in the logs.
pub fn spawn_attribution(
    client: reqwest::Client,
    config: &AttributionConfig,
    lead: &LeadRecord,
) -> bool {
    if !config.enabled {
        return false;
    }
    let Some(endpoint) = config.endpoint_url.as_deref() else {
        debug!(
            event_name = "relay.attribution.unconfigured",
            "attribution enabled but no endpoint configured, skipping"
        );
        return false;
    };
    if !lead.has_contact_identifier() {
        warn!(
            event_name = "relay.attribution.skipped",
            submission_id = %lead.submission_id,
            "no email or phone identifier available, skipping attribution"
        );
        return false;
    }

    let payload = AttributionPayload::from_lead(lead);
    let url = format!("{}{TRACK_PATH}", endpoint.trim_end_matches('/'));
    let submission_id = lead.submission_id.clone();

    tokio::spawn(async move {
        let result = client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("User-Agent", ATTRIBUTION_USER_AGENT)
            .header("X-Attribution-Source", "quote-calculator")
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(
                    event_name = "relay.attribution.delivered",
                    submission_id = %submission_id,
                    status = response.status().as_u16(),
                    "attribution data delivered"
                );
            }
            Ok(response) => {
                warn!(
                    event_name = "relay.attribution.rejected",
                    submission_id = %submission_id,
                    status = response.status().as_u16(),
                    "attribution endpoint rejected the payload"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "relay.attribution.failed",
                    submission_id = %submission_id,
                    error = %error,
                    "attribution delivery failed"
                );
            }
        }
    });

    true
}

#[cfg(test)]
mod tests {
    use haulquote_core::config::AttributionConfig;
    use haulquote_core::payload::LeadRecord;

    use super::{spawn_attribution, AttributionPayload};

    fn lead_with_email() -> LeadRecord {
        LeadRecord {
            email: Some("lead@example.com".to_string()),
            utm_source: Some("newsletter".to_string()),
            submission_id: "AUTO-attr-1".to_string(),
            ..LeadRecord::default()
        }
    }

    #[test]
    fn payload_keeps_identifiers_and_utm_fields() {
        let payload = AttributionPayload::from_lead(&lead_with_email());
        assert_eq!(payload.email, "lead@example.com");
        assert_eq!(payload.phone, "");
        assert_eq!(payload.utm_source.as_deref(), Some("newsletter"));
        assert_eq!(payload.fbclid, None);
    }

    #[tokio::test]
    async fn disabled_config_spawns_nothing() {
        let config = AttributionConfig { enabled: false, endpoint_url: None };
        assert!(!spawn_attribution(reqwest::Client::new(), &config, &lead_with_email()));
    }

    #[tokio::test]
    async fn missing_identifier_spawns_nothing() {
        let config = AttributionConfig {
            enabled: true,
            endpoint_url: Some("https://crm.example.com/api".to_string()),
        };
        let lead = LeadRecord::default();
        assert!(!spawn_attribution(reqwest::Client::new(), &config, &lead));
    }

    #[tokio::test]
    async fn identified_lead_spawns_the_side_channel() {
        let config = AttributionConfig {
            enabled: true,
            endpoint_url: Some("https://crm.example.com/api".to_string()),
        };
        assert!(spawn_attribution(reqwest::Client::new(), &config, &lead_with_email()));
    }
}
