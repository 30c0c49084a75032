//! Configuration management module
//!
//! This module handles loading, validation, and access to application
//! settings.

pub mod app_config;

pub use app_config::{
    AppConfig, GatewayConfig, LoggingConfig, PollingConfig, ServerConfig, SessionConfig,
};
