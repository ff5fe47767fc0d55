use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `OPSDASH__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_store_database")]
    pub database: String,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// strftime pattern for daily chart category labels.
    #[serde(default = "default_chart_date_format")]
    pub chart_date_format: String,
}

fn default_store_url() -> String {
    "http://localhost:8123".to_string()
}
fn default_store_database() -> String {
    "opsdash".to_string()
}
fn default_query_timeout_ms() -> u64 {
    10_000
}
fn default_currency() -> String {
    "MYR".to_string()
}
fn default_chart_date_format() -> String {
    "%d/%m".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            database: default_store_database(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            chart_date_format: default_chart_date_format(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("OPSDASH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.reporting.default_currency, "MYR");
        assert_eq!(cfg.reporting.chart_date_format, "%d/%m");
        assert_eq!(cfg.store.query_timeout_ms, 10_000);
    }
}
