//! Application ports - interfaces to external collaborators
//!
//! The gateway and the session service are reachable only through these
//! traits, keeping the confirmation state machine testable in isolation.

use async_trait::async_trait;

use crate::domain::{Entitlement, GatewayPaymentState, InitiateRequest};
use crate::shared::error::AppResult;

/// External payment processor, consumed through two black-box operations
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request a new charge. Called exactly once per attempt, with no
    /// internal retries; a failure here is fatal to the attempt.
    async fn initiate_payment(&self, request: &InitiateRequest) -> AppResult<String>;

    /// Query the gateway for the current state of a charge. Failures are
    /// transient from the caller's point of view.
    async fn check_status(&self, reference: &str) -> AppResult<GatewayPaymentState>;
}

/// Holder of the authenticated user's entitlement state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Re-read entitlement state from the session service. Called exactly
    /// once after a successful payment.
    async fn refresh(&self) -> AppResult<Entitlement>;

    /// Last entitlement state observed, if any
    async fn current(&self) -> Option<Entitlement>;
}
