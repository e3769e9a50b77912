use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use haulquote_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// Render the effective configuration with per-field source attribution.
/// Webhook catch URLs are capability secrets and never printed.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "relay.lead_url",
        redact_url(config.relay.lead_url.expose_secret()),
        source("relay.lead_url", "HAULQUOTE_RELAY_LEAD_URL"),
    ));
    lines.push(render_line(
        "relay.order_url",
        redact_url(config.relay.order_url.expose_secret()),
        source("relay.order_url", "HAULQUOTE_RELAY_ORDER_URL"),
    ));
    lines.push(render_line(
        "relay.retry_url",
        redact_url(config.relay.retry_url.expose_secret()),
        source("relay.retry_url", "HAULQUOTE_RELAY_RETRY_URL"),
    ));
    lines.push(render_line(
        "relay.timeout_secs",
        &config.relay.timeout_secs.to_string(),
        source("relay.timeout_secs", "HAULQUOTE_RELAY_TIMEOUT_SECS"),
    ));
    lines.push(render_line(
        "relay.retry_delay_secs",
        &config.relay.retry_delay_secs.to_string(),
        source("relay.retry_delay_secs", "HAULQUOTE_RELAY_RETRY_DELAY_SECS"),
    ));
    lines.push(render_line(
        "relay.user_agent",
        &config.relay.user_agent,
        source("relay.user_agent", "HAULQUOTE_RELAY_USER_AGENT"),
    ));
    lines.push(render_line(
        "relay.diagnostics_capacity",
        &config.relay.diagnostics_capacity.to_string(),
        source("relay.diagnostics_capacity", "HAULQUOTE_RELAY_DIAGNOSTICS_CAPACITY"),
    ));

    lines.push(render_line(
        "attribution.enabled",
        &config.attribution.enabled.to_string(),
        source("attribution.enabled", "HAULQUOTE_ATTRIBUTION_ENABLED"),
    ));
    lines.push(render_line(
        "attribution.endpoint_url",
        config.attribution.endpoint_url.as_deref().unwrap_or("<unset>"),
        source("attribution.endpoint_url", "HAULQUOTE_ATTRIBUTION_ENDPOINT_URL"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "HAULQUOTE_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "HAULQUOTE_SERVER_PORT"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "HAULQUOTE_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "HAULQUOTE_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("  {key} = {value} [{source}]")
}

fn redact_url(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("haulquote.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/haulquote.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(doc: &Value, key_path: &str) -> bool {
    let mut current = doc;
    for part in key_path.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}
