use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use haulquote_core::config::RelayConfig;
use haulquote_core::payload::{webhook_body, EventType, LeadRecord};

use crate::diagnostics::{AttemptPhase, AttemptRecord, DiagnosticsLog, EndpointKind};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("could not build the relay HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Terminal state of one dispatch. Everything except `HardFailure` reports
/// overall success: a 502/503 means the platform hiccuped after receiving
/// the data, and the user-facing flow must not block on that.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// First POST answered 2xx.
    Delivered,
    /// First POST hit 502/503, the retry answered 2xx.
    RetriedDelivered,
    /// First POST hit 502/503 and the retry failed too; still best-effort
    /// delivered from the caller's point of view.
    RetryExhausted,
    /// Network error or timeout on the first POST, or a non-retryable
    /// error status.
    HardFailure,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::HardFailure)
    }
}

/// What the caller gets back from one dispatch.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    pub success: bool,
    pub message: String,
    pub outcome: DeliveryOutcome,
    pub endpoint: EndpointKind,
    pub request_id: String,
}

/// Outbound webhook sender. One per process is plenty; it is cheap to share
/// behind the server state and holds no per-dispatch state of its own.
pub struct Dispatcher {
    client: reqwest::Client,
    config: RelayConfig,
    diagnostics: DiagnosticsLog,
}

impl Dispatcher {
    pub fn new(config: RelayConfig, diagnostics: DiagnosticsLog) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RelayError::ClientBuild)?;
        Ok(Self { client, config, diagnostics })
    }

    pub fn diagnostics(&self) -> &DiagnosticsLog {
        &self.diagnostics
    }

    /// A client sharing the dispatcher's timeout, for side-channels.
    pub fn http_client(&self) -> reqwest::Client {
        self.client.clone()
    }

    /// Relay one lead to the automation platform.
    ///
    /// Never returns an error: delivery problems are reported through the
    /// `success`/`message` fields so the submission flow can decide how much
    /// to care.
    pub async fn dispatch(&self, lead: &LeadRecord) -> DispatchReport {
        let endpoint = match lead.event_type {
            EventType::FinalSubmission => EndpointKind::Order,
            EventType::QuoteSubmission => EndpointKind::Lead,
        };
        let url = match endpoint {
            EndpointKind::Order => self.config.order_url.expose_secret().to_string(),
            EndpointKind::Lead => self.config.lead_url.expose_secret().to_string(),
        };

        let json_payload = webhook_body(lead).to_string();
        let payload_bytes = json_payload.len();
        let request_id = format!("req_{}", Uuid::new_v4().simple());

        info!(
            event_name = "relay.dispatch.start",
            request_id = %request_id,
            endpoint = endpoint.as_str(),
            event_type = lead.event_type.as_str(),
            payload_bytes,
            "sending lead to automation platform"
        );

        let started = Instant::now();
        let response = self
            .post(&url, &json_payload, &request_id, payload_bytes, false)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match response {
            Ok(response) => response,
            Err(error) => {
                let detail = if error.is_timeout() {
                    format!("request timed out after {elapsed_ms}ms")
                } else {
                    error.to_string()
                };
                self.record(&request_id, endpoint, lead, AttemptPhase::Initial, None, false, elapsed_ms, payload_bytes, Some(detail.clone())).await;
                warn!(
                    event_name = "relay.dispatch.network_error",
                    request_id = %request_id,
                    endpoint = endpoint.as_str(),
                    error = %detail,
                    "webhook request failed before a response arrived"
                );
                return DispatchReport {
                    success: false,
                    message: format!("Network error while sending webhook: {detail}"),
                    outcome: DeliveryOutcome::HardFailure,
                    endpoint,
                    request_id,
                };
            }
        };

        let status = response.status();

        if status.is_success() {
            self.record(&request_id, endpoint, lead, AttemptPhase::Initial, Some(status.as_u16()), true, elapsed_ms, payload_bytes, None).await;
            info!(
                event_name = "relay.dispatch.delivered",
                request_id = %request_id,
                endpoint = endpoint.as_str(),
                status = status.as_u16(),
                elapsed_ms,
                "webhook delivered"
            );
            return DispatchReport {
                success: true,
                message: "Webhook sent successfully".to_string(),
                outcome: DeliveryOutcome::Delivered,
                endpoint,
                request_id,
            };
        }

        if status == StatusCode::BAD_GATEWAY || status == StatusCode::SERVICE_UNAVAILABLE {
            self.record(&request_id, endpoint, lead, AttemptPhase::Initial, Some(status.as_u16()), false, elapsed_ms, payload_bytes, Some(format!("platform returned {status}"))).await;
            warn!(
                event_name = "relay.dispatch.platform_transient",
                request_id = %request_id,
                endpoint = endpoint.as_str(),
                status = status.as_u16(),
                "automation platform transient failure, retrying once"
            );
            return self.retry(lead, endpoint, &json_payload, payload_bytes, request_id).await;
        }

        let detail = format!(
            "Webhook error ({}): {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status")
        );
        self.record(&request_id, endpoint, lead, AttemptPhase::Initial, Some(status.as_u16()), false, elapsed_ms, payload_bytes, Some(detail.clone())).await;
        warn!(
            event_name = "relay.dispatch.rejected",
            request_id = %request_id,
            endpoint = endpoint.as_str(),
            status = status.as_u16(),
            "webhook rejected with a non-retryable status"
        );
        DispatchReport {
            success: false,
            message: detail,
            outcome: DeliveryOutcome::HardFailure,
            endpoint,
            request_id,
        }
    }

    /// One retry after a transient platform failure. The target is the
    /// fixed `retry_url` - historically the lead endpoint's alternate form
    /// regardless of which endpoint the first POST hit. Both retry outcomes
    /// report overall success; the data was handed over twice in good
    /// faith.
    async fn retry(
        &self,
        lead: &LeadRecord,
        endpoint: EndpointKind,
        json_payload: &str,
        payload_bytes: usize,
        request_id: String,
    ) -> DispatchReport {
        tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;

        let retry_id = format!("{request_id}_retry");
        let retry_url = self.config.retry_url.expose_secret().to_string();

        let started = Instant::now();
        let response = self
            .post(&retry_url, json_payload, &retry_id, payload_bytes, true)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match response {
            Ok(response) if response.status().is_success() => {
                self.record(&retry_id, endpoint, lead, AttemptPhase::Retry, Some(response.status().as_u16()), true, elapsed_ms, payload_bytes, None).await;
                info!(
                    event_name = "relay.retry.delivered",
                    request_id = %retry_id,
                    status = response.status().as_u16(),
                    elapsed_ms,
                    "retry accepted on the alternate URL"
                );
                DispatchReport {
                    success: true,
                    message: "Webhook delivered after retry".to_string(),
                    outcome: DeliveryOutcome::RetriedDelivered,
                    endpoint,
                    request_id,
                }
            }
            Ok(response) => {
                let status = response.status().as_u16();
                self.record(&retry_id, endpoint, lead, AttemptPhase::Retry, Some(status), false, elapsed_ms, payload_bytes, Some(format!("retry returned {status}"))).await;
                warn!(
                    event_name = "relay.retry.rejected",
                    request_id = %retry_id,
                    status,
                    "retry rejected; reporting best-effort delivery anyway"
                );
                DispatchReport {
                    success: true,
                    message: "Webhook delivery attempted but the automation platform returned errors".to_string(),
                    outcome: DeliveryOutcome::RetryExhausted,
                    endpoint,
                    request_id,
                }
            }
            Err(error) => {
                let detail = if error.is_timeout() {
                    format!("retry timed out after {elapsed_ms}ms")
                } else {
                    error.to_string()
                };
                self.record(&retry_id, endpoint, lead, AttemptPhase::Retry, None, false, elapsed_ms, payload_bytes, Some(detail.clone())).await;
                warn!(
                    event_name = "relay.retry.network_error",
                    request_id = %retry_id,
                    error = %detail,
                    "retry failed; reporting best-effort delivery anyway"
                );
                DispatchReport {
                    success: true,
                    message: "Webhook delivery attempted but the automation platform was unavailable".to_string(),
                    outcome: DeliveryOutcome::RetryExhausted,
                    endpoint,
                    request_id,
                }
            }
        }
    }

    async fn post(
        &self,
        url: &str,
        json_payload: &str,
        request_id: &str,
        payload_bytes: usize,
        is_retry: bool,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("User-Agent", &self.config.user_agent)
            .header("X-Request-ID", request_id)
            .header("X-Payload-Size", payload_bytes.to_string())
            .body(json_payload.to_string());
        if is_retry {
            request = request.header("X-Retry", "true");
        }
        request.send().await
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        request_id: &str,
        endpoint: EndpointKind,
        lead: &LeadRecord,
        phase: AttemptPhase,
        status: Option<u16>,
        success: bool,
        elapsed_ms: u64,
        payload_bytes: usize,
        error: Option<String>,
    ) {
        self.diagnostics
            .record(AttemptRecord {
                request_id: request_id.to_string(),
                endpoint,
                event_type: lead.event_type.as_str().to_string(),
                phase,
                status,
                success,
                elapsed_ms,
                payload_bytes,
                error,
                recorded_at: Utc::now(),
            })
            .await;
    }
}
