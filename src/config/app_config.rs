//! Application configuration structures
//!
//! This module contains the main configuration structures for the application.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use validator::Validate;

/// Payment gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Endpoint for payment initiation requests
    #[validate(url)]
    pub initiate_url: String,

    /// Endpoint for status queries; the attempt reference is appended as a
    /// query parameter
    #[validate(url)]
    pub status_url: String,

    /// API key sent with every gateway request
    #[validate(length(min = 1))]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,
}

/// Polling configuration
///
/// The total confirmation budget is `interval_seconds * max_attempts`
/// (default 3 s x 40 = 2 minutes).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PollingConfig {
    /// Seconds between status checks
    #[validate(range(min = 1, max = 60))]
    pub interval_seconds: u64,

    /// Maximum number of status checks before the attempt times out
    #[validate(range(min = 1, max = 1000))]
    pub max_attempts: u32,

    /// Seconds a finished attempt stays queryable before it is evicted
    #[validate(range(min = 60, max = 86400))]
    pub retention_seconds: u64,
}

/// Session/entitlement service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Endpoint that returns the caller's current entitlement state
    #[validate(url)]
    pub refresh_url: String,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server address to bind to
    pub bind_address: IpAddr,

    /// Server port
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    /// Maximum request size in bytes
    #[validate(range(min = 1024, max = 10485760))] // 1KB to 10MB
    pub max_request_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level
    #[validate(length(min = 1))]
    pub level: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Payment gateway configuration
    pub gateway: GatewayConfig,

    /// Polling configuration
    pub polling: PollingConfig,

    /// Session service configuration
    pub session: SessionConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                initiate_url: "http://127.0.0.1:9700/payments".to_string(),
                status_url: "http://127.0.0.1:9700/payments/status".to_string(),
                api_key: "gateway-api-key".to_string(),
                timeout_seconds: 10,
            },
            polling: PollingConfig {
                interval_seconds: 3,
                max_attempts: 40,
                retention_seconds: 900,
            },
            session: SessionConfig {
                refresh_url: "http://127.0.0.1:9800/session/entitlement".to_string(),
                timeout_seconds: 10,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".parse().unwrap(),
                port: 8080,
                max_request_size: 64 * 1024,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> crate::shared::error::AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("Conf").required(false))
            .add_source(config::Environment::with_prefix("MALIPO").separator("__"))
            .build()
            .map_err(|e| {
                crate::shared::error::AppError::Config(format!(
                    "Failed to build configuration: {}",
                    e
                ))
            })?;

        let config: AppConfig = config.try_deserialize().map_err(|e| {
            crate::shared::error::AppError::Config(format!(
                "Failed to deserialize configuration: {}",
                e
            ))
        })?;

        config.validate_config().map_err(|e| {
            crate::shared::error::AppError::Validation(format!(
                "Configuration validation failed: {}",
                e
            ))
        })?;

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_config(&self) -> Result<(), validator::ValidationErrors> {
        self.gateway.validate()?;
        self.polling.validate()?;
        self.session.validate()?;
        self.server.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    /// Total confirmation budget as a duration
    pub fn confirmation_budget(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.polling.interval_seconds * self.polling.max_attempts as u64,
        )
    }
}
