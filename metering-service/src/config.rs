use serde::Deserialize;
use std::fs;

/// `uri = "memory"` selects the in-process store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.uri == "memory"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

/// Defaults applied to generation requests that leave a parameter out, and
/// an upper bound on how many readings one request may produce.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_interval_minutes")]
    pub default_interval_minutes: i64,
    #[serde(default = "default_base_value")]
    pub default_base_value: f64,
    #[serde(default = "default_variance")]
    pub default_variance: f64,
    #[serde(default = "default_max_points")]
    pub max_points: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_interval_minutes: default_interval_minutes(),
            default_base_value: default_base_value(),
            default_variance: default_variance(),
            max_points: default_max_points(),
        }
    }
}

fn default_interval_minutes() -> i64 {
    15
}

fn default_base_value() -> f64 {
    10.0
}

fn default_variance() -> f64 {
    2.0
}

fn default_max_points() -> u64 {
    200_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub generator: GeneratorConfig,
    pub import: ImportConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("METERING_CONFIG").unwrap_or_else(|_| "metering-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_section_is_optional() {
        let cfg = AppConfig::from_toml(
            r#"
            [database]
            uri = "memory"
            max_connections = 1

            [http]
            bind_addr = "127.0.0.1:8080"

            [import]
            batch_size = 100
            max_retries = 2
            retry_backoff_ms = 10
            "#,
        )
        .unwrap();

        assert!(cfg.database.is_memory());
        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.generator.default_interval_minutes, 15);
        assert_eq!(cfg.generator.default_base_value, 10.0);
        assert_eq!(cfg.generator.default_variance, 2.0);
    }

    #[test]
    fn example_config_parses() {
        let cfg = AppConfig::from_toml(include_str!("../../metering-config.example.toml")).unwrap();
        assert!(!cfg.database.is_memory());
        assert_eq!(cfg.import.batch_size, 1000);
        assert_eq!(cfg.generator.max_points, 200_000);
        assert!(cfg.metrics.is_some());
    }
}
