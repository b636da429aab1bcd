use crate::presentation::config::Settings;

pub const DEFAULT_FILTER: &str = "info,kinabalu=debug,tower_http=debug";

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub filter: String,
}

impl TracingConfig {
    /// `LOG_FORMAT=json` and `RUST_LOG` win over the loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let json_format = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(settings.logging.json);

        let filter = std::env::var("RUST_LOG")
            .ok()
            .or_else(|| settings.logging.filter.clone())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            environment: settings.environment.to_string(),
            json_format,
            filter,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            json_format: false,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}
