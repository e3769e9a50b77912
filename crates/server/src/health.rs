use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Consecutive relay failures before the service reports itself degraded.
const RELAY_DEGRADED_AFTER: u64 = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub relay: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let relay = relay_check(&state).await;
    let ready = relay.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "haulquote-server runtime initialized".to_string(),
        },
        relay,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn relay_check(state: &AppState) -> HealthCheck {
    let stats = state.diagnostics.stats().await;
    if stats.consecutive_failures >= RELAY_DEGRADED_AFTER {
        return HealthCheck {
            status: "degraded",
            detail: format!(
                "last {} webhook attempts failed in a row",
                stats.consecutive_failures
            ),
        };
    }
    HealthCheck {
        status: "ready",
        detail: format!(
            "{} of {} webhook attempts delivered",
            stats.successes, stats.total_attempts
        ),
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use chrono::Utc;

    use haulquote_core::config::{AttributionConfig, RelayConfig};
    use haulquote_relay::{AttemptPhase, AttemptRecord, DiagnosticsLog, Dispatcher, EndpointKind};

    use crate::state::AppState;

    use super::health;

    fn test_state() -> AppState {
        let config = RelayConfig {
            lead_url: "https://hooks.example.com/catch/lead".to_string().into(),
            order_url: "https://hooks.example.com/catch/order".to_string().into(),
            retry_url: "https://hooks.example.com/catch/lead-alt".to_string().into(),
            timeout_secs: 15,
            retry_delay_secs: 2,
            user_agent: "Haulquote-Relay/1.0".to_string(),
            diagnostics_capacity: 8,
        };
        let dispatcher =
            Dispatcher::new(config, DiagnosticsLog::new(8)).expect("dispatcher should build");
        AppState::new(dispatcher, AttributionConfig { enabled: false, endpoint_url: None })
    }

    fn failed_attempt(request_id: &str) -> AttemptRecord {
        AttemptRecord {
            request_id: request_id.to_string(),
            endpoint: EndpointKind::Lead,
            event_type: "quote_submission".to_string(),
            phase: AttemptPhase::Initial,
            status: Some(500),
            success: false,
            elapsed_ms: 20,
            payload_bytes: 512,
            error: Some("Webhook error (500)".to_string()),
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn health_is_ready_with_no_relay_history() {
        let state = test_state();
        let (status, payload) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.0.status, "ready");
        assert_eq!(payload.0.relay.status, "ready");
    }

    #[tokio::test]
    async fn health_degrades_after_a_failure_streak() {
        let state = test_state();
        for id in ["a", "b", "c"] {
            state.diagnostics.record(failed_attempt(id)).await;
        }

        let (status, payload) = health(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.0.status, "degraded");
        assert_eq!(payload.0.relay.status, "degraded");
    }
}
