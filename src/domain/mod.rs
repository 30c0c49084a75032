//! Domain layer - Core business logic and domain models
//!
//! This module contains the payment confirmation state machine and domain
//! models, independent of HTTP and gateway concerns.

pub mod entitlement;
pub mod payment;

pub use entitlement::Entitlement;
pub use payment::{
    AttemptSnapshot, AttemptStatus, GatewayPaymentState, InitiateRequest, PaymentAttempt,
    PollOutcome,
};
