//! HTTP session store adapter
//!
//! Reads the authenticated user's entitlement state from the session
//! service and caches the last observed value in memory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ports::SessionStore;
use crate::config::AppConfig;
use crate::domain::Entitlement;
use crate::shared::error::{AppError, AppResult};

/// Adapter for the session/entitlement service
pub struct HttpSessionStore {
    config: Arc<AppConfig>,
    client: reqwest::Client,
    cached: RwLock<Option<Entitlement>>,
}

impl HttpSessionStore {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.session.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            cached: RwLock::new(None),
        })
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn refresh(&self) -> AppResult<Entitlement> {
        debug!("Refreshing entitlement from session service");

        let response = self
            .client
            .get(&self.config.session.refresh_url)
            .send()
            .await
            .map_err(|e| AppError::SessionRefresh(format!("session service unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SessionRefresh(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let entitlement: Entitlement = response
            .json()
            .await
            .map_err(|e| AppError::SessionRefresh(format!("invalid entitlement payload: {}", e)))?;

        *self.cached.write().await = Some(entitlement.clone());
        Ok(entitlement)
    }

    async fn current(&self) -> Option<Entitlement> {
        self.cached.read().await.clone()
    }
}
