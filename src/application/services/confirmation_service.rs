//! Payment confirmation service
//!
//! Drives a single payment attempt per checkout flow from initiation to a
//! terminal outcome. The gateway settles the charge out-of-band (a PIN
//! prompt on the payer's phone), so after initiation the service polls the
//! gateway status on a fixed interval until the gateway reports success or
//! failure, or the confirmation budget runs out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::application::ports::{PaymentGateway, SessionStore};
use crate::application::services::scheduler::{self, TaskHandle, TickFlow};
use crate::config::AppConfig;
use crate::domain::{
    AttemptSnapshot, AttemptStatus, GatewayPaymentState, InitiateRequest, PaymentAttempt,
    PollOutcome,
};
use crate::shared::error::{AppError, AppResult};
use crate::shared::logging::LoggingUtils;
use crate::shared::metrics::MetricsUtils;

type SharedAttempt = Arc<Mutex<PaymentAttempt>>;
type FlowIndex = Arc<RwLock<HashMap<String, String>>>;

/// A registered attempt together with its polling task
#[derive(Clone)]
struct AttemptEntry {
    attempt: SharedAttempt,
    task: Arc<TaskHandle>,
    created_at: Instant,
}

/// Orchestrates payment attempts against the gateway and session service
pub struct ConfirmationService {
    config: Arc<AppConfig>,
    gateway: Arc<dyn PaymentGateway>,
    sessions: Arc<dyn SessionStore>,
    metrics: Arc<MetricsUtils>,
    /// Attempts queryable by gateway reference; finished attempts are
    /// evicted once the retention window lapses
    attempts: RwLock<HashMap<String, AttemptEntry>>,
    /// Reference of the attempt currently owning each checkout flow;
    /// released when the attempt finishes or is cancelled
    active_flows: FlowIndex,
}

impl ConfirmationService {
    pub fn new(
        config: Arc<AppConfig>,
        gateway: Arc<dyn PaymentGateway>,
        sessions: Arc<dyn SessionStore>,
        metrics: Arc<MetricsUtils>,
    ) -> Self {
        Self {
            config,
            gateway,
            sessions,
            metrics,
            attempts: RwLock::new(HashMap::new()),
            active_flows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Initiate a payment and start the polling loop.
    ///
    /// The gateway initiation call is made exactly once; if it fails, the
    /// error is returned synchronously and no attempt is registered. A prior
    /// attempt still owning the same checkout flow is cancelled and
    /// discarded before the new one takes over.
    pub async fn initiate(&self, request: InitiateRequest) -> AppResult<AttemptSnapshot> {
        request.validate()?;
        self.evict_stale().await;

        let reference = self.gateway.initiate_payment(&request).await?;

        let attempt = PaymentAttempt::new(reference.clone(), &request);
        let snapshot = attempt.snapshot();
        let attempt = Arc::new(Mutex::new(attempt));

        let entry = AttemptEntry {
            task: self.spawn_polling(Arc::clone(&attempt)),
            attempt,
            created_at: Instant::now(),
        };

        {
            let mut flows = self.active_flows.write().await;
            if let Some(previous) = flows.insert(request.purpose_ref.clone(), reference.clone()) {
                self.discard(&previous).await;
            }
            self.attempts.write().await.insert(reference.clone(), entry);
        }

        self.metrics.increment_attempts_initiated();
        LoggingUtils::log_initiation(
            &LoggingUtils::generate_request_id(),
            &reference,
            request.amount,
            &request.currency,
        );

        Ok(snapshot)
    }

    /// Current view of an attempt
    pub async fn status(&self, reference: &str) -> AppResult<AttemptSnapshot> {
        let entry = self.entry(reference).await?;
        let attempt = entry.attempt.lock().await;
        Ok(attempt.snapshot())
    }

    /// Stop polling for an attempt without contacting the gateway.
    ///
    /// Idempotent: cancelling an already-terminal or already-cancelled
    /// attempt is a no-op; in particular the polling task is left alone once
    /// the attempt is terminal, so an entitlement refresh that is still in
    /// flight after a success always runs to completion. Any in-flight
    /// status response is discarded on arrival because the attempt is
    /// flagged inactive.
    pub async fn cancel(&self, reference: &str) -> AppResult<AttemptSnapshot> {
        let entry = self.entry(reference).await?;

        let mut attempt = entry.attempt.lock().await;
        if !attempt.active || attempt.status.is_terminal() {
            return Ok(attempt.snapshot());
        }

        entry.task.cancel();
        attempt.active = false;
        self.metrics.increment_cancelled();
        info!(
            reference = %attempt.reference,
            polls = %attempt.attempts_made,
            "Payment attempt cancelled"
        );

        let snapshot = attempt.snapshot();
        let purpose_ref = attempt.purpose_ref.clone();
        drop(attempt);
        Self::release_flow(&self.active_flows, &purpose_ref, reference).await;

        Ok(snapshot)
    }

    async fn entry(&self, reference: &str) -> AppResult<AttemptEntry> {
        self.attempts
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| AppError::UnknownAttempt(reference.to_string()))
    }

    /// Remove a superseded attempt outright; a new attempt for the flow has
    /// taken over, so the old one is no longer queryable. The polling task
    /// is only aborted while the attempt is non-terminal, never while a
    /// post-success entitlement refresh may still be running.
    async fn discard(&self, reference: &str) {
        let entry = self.attempts.write().await.remove(reference);
        if let Some(entry) = entry {
            let mut attempt = entry.attempt.lock().await;
            if attempt.active && !attempt.status.is_terminal() {
                entry.task.cancel();
                attempt.active = false;
                self.metrics.increment_cancelled();
                info!(reference = %attempt.reference, "Payment attempt superseded");
            }
        }
    }

    /// Drop finished attempts once they have been around longer than the
    /// retention window. Runs on each initiation; entries whose lock is
    /// momentarily held are picked up on a later pass.
    async fn evict_stale(&self) {
        let retention = Duration::from_secs(self.config.polling.retention_seconds);
        let mut stale = Vec::new();
        {
            let attempts = self.attempts.read().await;
            for (reference, entry) in attempts.iter() {
                if entry.created_at.elapsed() < retention {
                    continue;
                }
                if let Ok(attempt) = entry.attempt.try_lock() {
                    if attempt.status.is_terminal() || !attempt.active {
                        stale.push(reference.clone());
                    }
                }
            }
        }
        if !stale.is_empty() {
            let mut attempts = self.attempts.write().await;
            for reference in &stale {
                attempts.remove(reference);
            }
            info!(evicted = stale.len(), "Evicted finished payment attempts");
        }
    }

    /// Release the checkout flow owned by an attempt, if it still owns it
    async fn release_flow(flows: &FlowIndex, purpose_ref: &str, reference: &str) {
        let mut flows = flows.write().await;
        if flows.get(purpose_ref).map(String::as_str) == Some(reference) {
            flows.remove(purpose_ref);
        }
    }

    fn spawn_polling(&self, attempt: SharedAttempt) -> Arc<TaskHandle> {
        let interval = Duration::from_secs(self.config.polling.interval_seconds);
        let max_attempts = self.config.polling.max_attempts;
        let gateway = Arc::clone(&self.gateway);
        let sessions = Arc::clone(&self.sessions);
        let metrics = Arc::clone(&self.metrics);
        let flows = Arc::clone(&self.active_flows);

        scheduler::spawn_repeating(interval, move |tick| {
            let gateway = Arc::clone(&gateway);
            let sessions = Arc::clone(&sessions);
            let metrics = Arc::clone(&metrics);
            let flows = Arc::clone(&flows);
            let attempt = Arc::clone(&attempt);
            async move {
                Self::poll_tick(
                    &gateway,
                    &sessions,
                    &metrics,
                    &flows,
                    &attempt,
                    max_attempts,
                    tick,
                )
                .await
            }
        })
    }

    /// One polling tick: increment the poll counter, query the gateway, and
    /// apply the resulting transition. The first terminal transition wins;
    /// responses arriving for cancelled or already-terminal attempts are
    /// discarded.
    async fn poll_tick(
        gateway: &Arc<dyn PaymentGateway>,
        sessions: &Arc<dyn SessionStore>,
        metrics: &Arc<MetricsUtils>,
        flows: &FlowIndex,
        shared: &SharedAttempt,
        max_attempts: u32,
        tick: u32,
    ) -> TickFlow {
        let reference = {
            let mut attempt = shared.lock().await;
            if !attempt.active || attempt.status.is_terminal() {
                return TickFlow::Stop;
            }
            attempt.attempts_made = attempt.attempts_made.saturating_add(1);
            attempt.reference.clone()
        };

        metrics.increment_polls_issued();
        let outcome = Self::poll_once(gateway, metrics, &reference, tick).await;

        let mut attempt = shared.lock().await;
        if !attempt.active || attempt.status.is_terminal() {
            // Late response racing a cancel or timeout: discard it
            return TickFlow::Stop;
        }

        match outcome {
            PollOutcome::Success => {
                attempt.transition(AttemptStatus::Success);
                metrics.increment_succeeded();
                LoggingUtils::log_outcome(&reference, "success", attempt.attempts_made);
                let purpose_ref = attempt.purpose_ref.clone();
                drop(attempt);
                Self::release_flow(flows, &purpose_ref, &reference).await;
                Self::refresh_entitlement(sessions, metrics, shared, &reference).await;
                TickFlow::Stop
            }
            PollOutcome::Failed => {
                attempt.transition(AttemptStatus::Failed);
                metrics.increment_declined();
                LoggingUtils::log_outcome(&reference, "failed", attempt.attempts_made);
                let purpose_ref = attempt.purpose_ref.clone();
                drop(attempt);
                Self::release_flow(flows, &purpose_ref, &reference).await;
                TickFlow::Stop
            }
            PollOutcome::StillPending => {
                if attempt.attempts_made >= max_attempts {
                    attempt.transition(AttemptStatus::TimedOut);
                    metrics.increment_timed_out();
                    LoggingUtils::log_outcome(&reference, "timed_out", attempt.attempts_made);
                    let purpose_ref = attempt.purpose_ref.clone();
                    drop(attempt);
                    Self::release_flow(flows, &purpose_ref, &reference).await;
                    TickFlow::Stop
                } else {
                    TickFlow::Continue
                }
            }
        }
    }

    /// Query the gateway once and map its answer to a poll outcome.
    ///
    /// A transport failure is transient and equivalent to still-pending; it
    /// only counts against the shared confirmation budget. Unrecognized
    /// gateway states are also treated as still-pending rather than errors.
    async fn poll_once(
        gateway: &Arc<dyn PaymentGateway>,
        metrics: &Arc<MetricsUtils>,
        reference: &str,
        tick: u32,
    ) -> PollOutcome {
        match gateway.check_status(reference).await {
            Ok(GatewayPaymentState::Success) => PollOutcome::Success,
            Ok(GatewayPaymentState::Failed) => PollOutcome::Failed,
            Ok(GatewayPaymentState::Pending) => PollOutcome::StillPending,
            Ok(GatewayPaymentState::Unrecognized(raw)) => {
                warn!(
                    reference = %reference,
                    state = %raw,
                    "Unrecognized gateway state, treating as pending"
                );
                PollOutcome::StillPending
            }
            Err(e) => {
                metrics.increment_transient_poll_errors();
                LoggingUtils::log_transient_poll_error(reference, tick, &e.to_string());
                PollOutcome::StillPending
            }
        }
    }

    /// Refresh entitlement exactly once after a successful payment. A refresh
    /// failure never regresses the payment outcome; it is recorded as a
    /// secondary warning on the attempt.
    async fn refresh_entitlement(
        sessions: &Arc<dyn SessionStore>,
        metrics: &Arc<MetricsUtils>,
        shared: &SharedAttempt,
        reference: &str,
    ) {
        match sessions.refresh().await {
            Ok(entitlement) => {
                info!(
                    reference = %reference,
                    plan_id = %entitlement.plan_id,
                    "Entitlement refreshed after successful payment"
                );
            }
            Err(e) => {
                metrics.increment_refresh_warnings();
                warn!(
                    reference = %reference,
                    error = %e,
                    "Entitlement refresh failed; access may not be immediately visible"
                );
                let mut attempt = shared.lock().await;
                attempt.entitlement_warning =
                    Some("entitlement may not be immediately visible".to_string());
            }
        }
    }
}
