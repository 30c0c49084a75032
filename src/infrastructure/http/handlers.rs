//! Payments HTTP handlers

use std::sync::Arc;

use tracing::info;
use warp::Reply;

use crate::application::ports::SessionStore;
use crate::application::services::ConfirmationService;
use crate::domain::InitiateRequest;
use crate::shared::error::AppResult;
use crate::shared::logging::LoggingUtils;
use crate::shared::metrics::MetricsUtils;

fn reply_for<T: serde::Serialize>(
    result: AppResult<T>,
    ok_status: warp::http::StatusCode,
) -> impl Reply {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), ok_status),
        Err(e) => warp::reply::with_status(
            warp::reply::json(&e.to_error_body()),
            e.http_status_code(),
        ),
    }
}

pub async fn handle_initiate(
    body: InitiateRequest,
    service: Arc<ConfirmationService>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let request_id = LoggingUtils::generate_request_id();
    info!(
        request_id = %request_id,
        purpose_ref = %body.purpose_ref,
        "Processing payment initiation"
    );

    let result = service.initiate(body).await;
    Ok(reply_for(result, warp::http::StatusCode::CREATED))
}

pub async fn handle_status(
    reference: String,
    service: Arc<ConfirmationService>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let result = service.status(&reference).await;
    Ok(reply_for(result, warp::http::StatusCode::OK))
}

pub async fn handle_cancel(
    reference: String,
    service: Arc<ConfirmationService>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let result = service.cancel(&reference).await;
    Ok(reply_for(result, warp::http::StatusCode::OK))
}

pub async fn handle_entitlement(
    sessions: Arc<dyn SessionStore>,
) -> Result<impl Reply, warp::reject::Rejection> {
    match sessions.current().await {
        Some(entitlement) => Ok(warp::reply::with_status(
            warp::reply::json(&entitlement),
            warp::http::StatusCode::OK,
        )),
        None => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "message": "no entitlement observed yet" })),
            warp::http::StatusCode::NOT_FOUND,
        )),
    }
}

pub async fn handle_metrics(
    metrics: Arc<MetricsUtils>,
) -> Result<impl Reply, warp::reject::Rejection> {
    Ok(warp::reply::json(&metrics.get_metrics()))
}
