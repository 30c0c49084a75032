//! Logging utilities module
//!
//! Centralized logging initialization and structured logging helpers for the
//! confirmation flow.

use tracing::{info, warn};

/// Logging utilities for the application
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging with the specified configuration
    pub fn initialize(level: &str) -> crate::shared::error::AppResult<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            crate::shared::error::AppError::Internal(format!("Failed to initialize logging: {}", e))
        })?;

        Ok(())
    }

    /// Log a payment initiation
    pub fn log_initiation(request_id: &str, reference: &str, amount: f64, currency: &str) {
        info!(
            request_id = %request_id,
            reference = %reference,
            amount = %amount,
            currency = %currency,
            "Payment attempt initiated"
        );
    }

    /// Log a terminal outcome for an attempt
    pub fn log_outcome(reference: &str, outcome: &str, polls: u32) {
        info!(
            reference = %reference,
            outcome = %outcome,
            polls = %polls,
            "Payment attempt reached terminal state"
        );
    }

    /// Log a transient poll failure (loop continues)
    pub fn log_transient_poll_error(reference: &str, attempt: u32, error: &str) {
        warn!(
            reference = %reference,
            attempt = %attempt,
            error = %error,
            "Status check failed, will retry on next tick"
        );
    }

    /// Generate a unique request ID
    pub fn generate_request_id() -> String {
        format!("req_{}", uuid::Uuid::new_v4().simple())
    }
}
