//! Payments routes

use std::sync::Arc;
use warp::Filter;

use crate::application::ports::SessionStore;
use crate::application::services::ConfirmationService;
use crate::config::AppConfig;
use crate::infrastructure::http::handlers::{
    handle_cancel, handle_entitlement, handle_initiate, handle_metrics, handle_status,
};
use crate::shared::metrics::MetricsUtils;

pub struct PaymentRoutes;

impl PaymentRoutes {
    pub fn create_routes(
        config: AppConfig,
        service: Arc<ConfirmationService>,
        sessions: Arc<dyn SessionStore>,
        metrics: Arc<MetricsUtils>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let initiate = warp::path("payments")
            .and(warp::path("initiate"))
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::content_length_limit(
                config.server.max_request_size as u64,
            ))
            .and(warp::body::json())
            .and(Self::with_service(service.clone()))
            .and_then(handle_initiate);

        let status = warp::path("payments")
            .and(warp::path("status"))
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::get())
            .and(Self::with_service(service.clone()))
            .and_then(handle_status);

        let cancel = warp::path("payments")
            .and(warp::path("cancel"))
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::post())
            .and(Self::with_service(service))
            .and_then(handle_cancel);

        let entitlement = warp::path("session")
            .and(warp::path("entitlement"))
            .and(warp::path::end())
            .and(warp::get())
            .and(Self::with_sessions(sessions))
            .and_then(handle_entitlement);

        let health = warp::path("health")
            .and(warp::get())
            .map(|| warp::reply::json(&serde_json::json!({"status": "healthy"})));

        let metrics_route = warp::path("metrics")
            .and(warp::get())
            .and(Self::with_metrics(metrics))
            .and_then(handle_metrics);

        initiate
            .or(status)
            .or(cancel)
            .or(entitlement)
            .or(health)
            .or(metrics_route)
    }

    fn with_service(
        service: Arc<ConfirmationService>,
    ) -> impl Filter<Extract = (Arc<ConfirmationService>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || service.clone())
    }

    fn with_sessions(
        sessions: Arc<dyn SessionStore>,
    ) -> impl Filter<Extract = (Arc<dyn SessionStore>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || sessions.clone())
    }

    fn with_metrics(
        metrics: Arc<MetricsUtils>,
    ) -> impl Filter<Extract = (Arc<MetricsUtils>,), Error = std::convert::Infallible> + Clone {
        warp::any().map(move || metrics.clone())
    }
}
