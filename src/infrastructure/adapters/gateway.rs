//! HTTP payment gateway adapter
//!
//! Speaks the gateway's JSON contract: initiation returns `{ "reference" }`
//! or an error payload `{ "message" }`; status queries are keyed by
//! reference and return `{ "status" }`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::PaymentGateway;
use crate::config::AppConfig;
use crate::domain::{GatewayPaymentState, InitiateRequest};
use crate::shared::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct InitiateResponseBody {
    reference: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponseBody {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Adapter for the external payment gateway
pub struct HttpPaymentGateway {
    config: Arc<AppConfig>,
    client: reqwest::Client,
}

impl HttpPaymentGateway {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gateway.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => format!("HTTP {}", status),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn initiate_payment(&self, request: &InitiateRequest) -> AppResult<String> {
        debug!(
            purpose_ref = %request.purpose_ref,
            amount = %request.amount,
            "Sending initiation request to gateway"
        );

        let response = self
            .client
            .post(&self.config.gateway.initiate_url)
            .header("x-api-key", &self.config.gateway.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Initiation(format!("gateway unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Initiation(Self::error_message(response).await));
        }

        let body: InitiateResponseBody = response
            .json()
            .await
            .map_err(|e| AppError::Initiation(format!("invalid gateway response: {}", e)))?;

        Ok(body.reference)
    }

    async fn check_status(&self, reference: &str) -> AppResult<GatewayPaymentState> {
        let response = self
            .client
            .get(&self.config.gateway.status_url)
            .query(&[("reference", reference)])
            .header("x-api-key", &self.config.gateway.api_key)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("status check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(Self::error_message(response).await));
        }

        let body: StatusResponseBody = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("invalid status response: {}", e)))?;

        Ok(GatewayPaymentState::parse(&body.status))
    }
}
