use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub relay: RelayConfig,
    pub attribution: AttributionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Outbound webhook delivery settings. The catch URLs are capability
/// secrets: anyone holding one can inject leads downstream, so they are
/// kept out of Debug output.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub lead_url: SecretString,
    pub order_url: SecretString,
    /// Fixed retry target used after a 502/503. This is always the lead
    /// endpoint's alternate form, even when the failing call went to the
    /// order endpoint - longstanding behavior, kept as-is.
    pub retry_url: SecretString,
    pub timeout_secs: u64,
    pub retry_delay_secs: u64,
    pub user_agent: String,
    pub diagnostics_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct AttributionConfig {
    pub enabled: bool,
    pub endpoint_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub relay_lead_url: Option<String>,
    pub relay_order_url: Option<String>,
    pub relay_retry_url: Option<String>,
    pub attribution_endpoint_url: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig {
                lead_url: String::new().into(),
                order_url: String::new().into(),
                retry_url: String::new().into(),
                timeout_secs: 15,
                retry_delay_secs: 2,
                user_agent: "Haulquote-Relay/1.0".to_string(),
                diagnostics_capacity: 50,
            },
            attribution: AttributionConfig { enabled: false, endpoint_url: None },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("haulquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(relay) = patch.relay {
            if let Some(lead_url_value) = relay.lead_url {
                self.relay.lead_url = secret_value(lead_url_value);
            }
            if let Some(order_url_value) = relay.order_url {
                self.relay.order_url = secret_value(order_url_value);
            }
            if let Some(retry_url_value) = relay.retry_url {
                self.relay.retry_url = secret_value(retry_url_value);
            }
            if let Some(timeout_secs) = relay.timeout_secs {
                self.relay.timeout_secs = timeout_secs;
            }
            if let Some(retry_delay_secs) = relay.retry_delay_secs {
                self.relay.retry_delay_secs = retry_delay_secs;
            }
            if let Some(user_agent) = relay.user_agent {
                self.relay.user_agent = user_agent;
            }
            if let Some(diagnostics_capacity) = relay.diagnostics_capacity {
                self.relay.diagnostics_capacity = diagnostics_capacity;
            }
        }

        if let Some(attribution) = patch.attribution {
            if let Some(enabled) = attribution.enabled {
                self.attribution.enabled = enabled;
            }
            if let Some(endpoint_url) = attribution.endpoint_url {
                self.attribution.endpoint_url = Some(endpoint_url);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HAULQUOTE_RELAY_LEAD_URL") {
            self.relay.lead_url = secret_value(value);
        }
        if let Some(value) = read_env("HAULQUOTE_RELAY_ORDER_URL") {
            self.relay.order_url = secret_value(value);
        }
        if let Some(value) = read_env("HAULQUOTE_RELAY_RETRY_URL") {
            self.relay.retry_url = secret_value(value);
        }
        if let Some(value) = read_env("HAULQUOTE_RELAY_TIMEOUT_SECS") {
            self.relay.timeout_secs = parse_u64("HAULQUOTE_RELAY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("HAULQUOTE_RELAY_RETRY_DELAY_SECS") {
            self.relay.retry_delay_secs = parse_u64("HAULQUOTE_RELAY_RETRY_DELAY_SECS", &value)?;
        }
        if let Some(value) = read_env("HAULQUOTE_RELAY_USER_AGENT") {
            self.relay.user_agent = value;
        }
        if let Some(value) = read_env("HAULQUOTE_RELAY_DIAGNOSTICS_CAPACITY") {
            self.relay.diagnostics_capacity =
                parse_usize("HAULQUOTE_RELAY_DIAGNOSTICS_CAPACITY", &value)?;
        }

        if let Some(value) = read_env("HAULQUOTE_ATTRIBUTION_ENABLED") {
            self.attribution.enabled = parse_bool("HAULQUOTE_ATTRIBUTION_ENABLED", &value)?;
        }
        if let Some(value) = read_env("HAULQUOTE_ATTRIBUTION_ENDPOINT_URL") {
            self.attribution.endpoint_url = Some(value);
        }

        if let Some(value) = read_env("HAULQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HAULQUOTE_SERVER_PORT") {
            self.server.port = parse_u16("HAULQUOTE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("HAULQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("HAULQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("HAULQUOTE_LOGGING_LEVEL").or_else(|| read_env("HAULQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HAULQUOTE_LOGGING_FORMAT").or_else(|| read_env("HAULQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(lead_url) = overrides.relay_lead_url {
            self.relay.lead_url = secret_value(lead_url);
        }
        if let Some(order_url) = overrides.relay_order_url {
            self.relay.order_url = secret_value(order_url);
        }
        if let Some(retry_url) = overrides.relay_retry_url {
            self.relay.retry_url = secret_value(retry_url);
        }
        if let Some(endpoint_url) = overrides.attribution_endpoint_url {
            self.attribution.endpoint_url = Some(endpoint_url);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_relay(&self.relay)?;
        validate_attribution(&self.attribution)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("haulquote.toml"), PathBuf::from("config/haulquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{field} is required. Paste the automation platform's catch URL for this endpoint"
        )));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_relay(relay: &RelayConfig) -> Result<(), ConfigError> {
    validate_url("relay.lead_url", relay.lead_url.expose_secret())?;
    validate_url("relay.order_url", relay.order_url.expose_secret())?;
    validate_url("relay.retry_url", relay.retry_url.expose_secret())?;

    if relay.timeout_secs == 0 || relay.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "relay.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if relay.retry_delay_secs > 60 {
        return Err(ConfigError::Validation(
            "relay.retry_delay_secs must be 60 or less".to_string(),
        ));
    }
    if relay.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation("relay.user_agent must not be empty".to_string()));
    }
    if relay.diagnostics_capacity == 0 {
        return Err(ConfigError::Validation(
            "relay.diagnostics_capacity must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_attribution(attribution: &AttributionConfig) -> Result<(), ConfigError> {
    if attribution.enabled {
        match &attribution.endpoint_url {
            Some(url) => validate_url("attribution.endpoint_url", url)?,
            None => {
                return Err(ConfigError::Validation(
                    "attribution.enabled is true but attribution.endpoint_url is not set"
                        .to_string(),
                ))
            }
        }
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    relay: Option<RelayPatch>,
    attribution: Option<AttributionPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RelayPatch {
    lead_url: Option<String>,
    order_url: Option<String>,
    retry_url: Option<String>,
    timeout_secs: Option<u64>,
    retry_delay_secs: Option<u64>,
    user_agent: Option<String>,
    diagnostics_capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct AttributionPatch {
    enabled: Option<bool>,
    endpoint_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn set_required_urls() {
        env::set_var("HAULQUOTE_RELAY_LEAD_URL", "https://hooks.example.com/catch/lead");
        env::set_var("HAULQUOTE_RELAY_ORDER_URL", "https://hooks.example.com/catch/order");
        env::set_var("HAULQUOTE_RELAY_RETRY_URL", "https://hooks.example.com/catch/lead-alt");
    }

    const URL_VARS: [&str; 3] = [
        "HAULQUOTE_RELAY_LEAD_URL",
        "HAULQUOTE_RELAY_ORDER_URL",
        "HAULQUOTE_RELAY_RETRY_URL",
    ];

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_LEAD_HOOK", "https://hooks.example.com/catch/from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("haulquote.toml");
            fs::write(
                &path,
                r#"
[relay]
lead_url = "${TEST_LEAD_HOOK}"
order_url = "https://hooks.example.com/catch/order"
retry_url = "https://hooks.example.com/catch/lead-alt"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.relay.lead_url.expose_secret() == "https://hooks.example.com/catch/from-env",
                "lead url should be interpolated from the environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_LEAD_HOOK"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_urls();
        env::set_var("HAULQUOTE_LOG_LEVEL", "warn");
        env::set_var("HAULQUOTE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should come from env alias")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should come from env alias",
            )?;
            Ok(())
        })();

        clear_vars(&URL_VARS);
        clear_vars(&["HAULQUOTE_LOG_LEVEL", "HAULQUOTE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HAULQUOTE_RELAY_LEAD_URL", "https://hooks.example.com/catch/from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("haulquote.toml");
            fs::write(
                &path,
                r#"
[relay]
lead_url = "https://hooks.example.com/catch/from-file"
order_url = "https://hooks.example.com/catch/order"
retry_url = "https://hooks.example.com/catch/lead-alt"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.relay.lead_url.expose_secret()
                    == "https://hooks.example.com/catch/from-env",
                "env lead url should win over the file value",
            )?;
            ensure(config.logging.level == "debug", "programmatic log level should win")?;
            Ok(())
        })();

        clear_vars(&["HAULQUOTE_RELAY_LEAD_URL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HAULQUOTE_RELAY_LEAD_URL", "ftp://not-a-web-hook");
        env::set_var("HAULQUOTE_RELAY_ORDER_URL", "https://hooks.example.com/catch/order");
        env::set_var("HAULQUOTE_RELAY_RETRY_URL", "https://hooks.example.com/catch/lead-alt");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("relay.lead_url")
            );
            ensure(has_message, "validation failure should mention relay.lead_url")
        })();

        clear_vars(&URL_VARS);
        result
    }

    #[test]
    fn secret_urls_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_urls();

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("hooks.example.com/catch"),
                "debug output should not contain webhook catch URLs",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&URL_VARS);
        result
    }

    #[test]
    fn missing_required_file_is_reported() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("load should fail without the required file");

        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }
}
