use std::env;

use super::env::{
    AppConfig, ClassifierConfig, ConfigError, DirectoryConfig, FetchConfig, LoggingConfig,
    SchedulerConfig, ServerConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let server = ServerConfig {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
        };

        let fetch = FetchConfig {
            timeout: std::time::Duration::from_millis(
                env::var("FEED_FETCH_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(10_000),
            ),
        };

        let alpha_raw = env::var("CLASSIFIER_ALPHA").unwrap_or_else(|_| "1.0".to_string());
        let alpha = alpha_raw
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or(ConfigError::Invalid {
                key: "CLASSIFIER_ALPHA",
                value: alpha_raw,
            })?;
        let classifier = ClassifierConfig { alpha };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "FeedHistory.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let scheduler = SchedulerConfig {
            cron_specs: env::var("MAINTENANCE_CRONS")
                .map(|value| {
                    value
                        .split(';')
                        .map(|part| part.trim().to_string())
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_else(|_| vec!["0 */15 * * * *".to_string()]),
        };

        Ok(Self {
            server,
            fetch,
            classifier,
            directories,
            logging,
            scheduler,
        })
    }
}
