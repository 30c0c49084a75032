//! Server assembly and startup

use std::sync::Arc;

use tracing::{info, instrument};
use warp::{Filter, Reply};

use crate::application::ports::SessionStore;
use crate::application::services::ConfirmationService;
use crate::config::AppConfig;
use crate::infrastructure::adapters::{HttpPaymentGateway, HttpSessionStore};
use crate::infrastructure::http::PaymentRoutes;
use crate::shared::error::{AppError, AppResult};
use crate::shared::metrics::MetricsUtils;

/// Main server implementation
pub struct ConfirmServer {
    config: AppConfig,
    service: Arc<ConfirmationService>,
    sessions: Arc<dyn SessionStore>,
    metrics: Arc<MetricsUtils>,
}

impl ConfirmServer {
    /// Create a new server instance with HTTP-backed adapters
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let shared_config = Arc::new(config.clone());
        let gateway = Arc::new(HttpPaymentGateway::new(Arc::clone(&shared_config))?);
        let sessions: Arc<dyn SessionStore> =
            Arc::new(HttpSessionStore::new(Arc::clone(&shared_config))?);
        let metrics = Arc::new(MetricsUtils::new());
        let service = Arc::new(ConfirmationService::new(
            shared_config,
            gateway,
            Arc::clone(&sessions),
            Arc::clone(&metrics),
        ));

        Ok(Self {
            config,
            service,
            sessions,
            metrics,
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let addr = self.config.server_address();
        info!("Starting server on {}", addr);

        let addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;

        let routes = self.create_routes();

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Create the application routes
    fn create_routes(self) -> impl Filter<Extract = impl Reply> + Clone {
        PaymentRoutes::create_routes(self.config, self.service, self.sessions, self.metrics)
    }
}
