//! Payment domain models and types

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::shared::error::{AppError, AppResult};

/// Status of a payment attempt
///
/// Transitions move only forward: `Pending` is the sole initial state and
/// the other three are terminal. No attempt re-enters `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Success,
    Failed,
    TimedOut,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
            AttemptStatus::TimedOut => "timed_out",
        }
    }
}

/// Gateway-reported payment state
///
/// `"success"` and `"completed"` are synonyms. Anything the gateway reports
/// that is not a known terminal state is kept as `Unrecognized` and treated
/// as pending-equivalent by the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayPaymentState {
    Pending,
    Success,
    Failed,
    Unrecognized(String),
}

impl GatewayPaymentState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => GatewayPaymentState::Pending,
            "success" | "completed" => GatewayPaymentState::Success,
            "failed" => GatewayPaymentState::Failed,
            _ => GatewayPaymentState::Unrecognized(raw.to_string()),
        }
    }
}

/// Outcome of a single status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    StillPending,
    Success,
    Failed,
}

/// Payment initiation request as received from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub amount: f64,
    pub currency: String,
    /// Phone number (mobile money) or card token
    pub payer_contact: String,
    /// Identifier of the plan or live session being paid for; one active
    /// attempt is allowed per purpose at a time
    pub purpose_ref: String,
}

fn payer_contact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Local or international phone form, or an opaque card token
    PATTERN.get_or_init(|| Regex::new(r"^(\+?[0-9]{9,15}|tok_[A-Za-z0-9]{8,64})$").unwrap())
}

impl InitiateRequest {
    /// Validate the request before any gateway call is made
    pub fn validate(&self) -> AppResult<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::Validation("amount must be positive".into()));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AppError::Validation(
                "currency must be a 3-letter ISO code".into(),
            ));
        }
        if !payer_contact_pattern().is_match(&self.payer_contact) {
            return Err(AppError::Validation(
                "payerContact must be a phone number or card token".into(),
            ));
        }
        if self.purpose_ref.trim().is_empty() {
            return Err(AppError::Validation("purposeRef must not be empty".into()));
        }
        Ok(())
    }
}

/// One in-flight or completed payment confirmation cycle
///
/// The gateway, not this service, is the durable record; attempts live only
/// for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    /// Opaque identifier assigned by the gateway at initiation, immutable
    /// thereafter
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub payer_contact: String,
    pub purpose_ref: String,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    /// Count of status-check polls issued so far
    pub attempts_made: u32,
    /// False once the attempt has been cancelled or superseded; late poll
    /// responses for inactive attempts are discarded
    pub active: bool,
    /// Set when entitlement refresh failed after a successful payment
    pub entitlement_warning: Option<String>,
}

impl PaymentAttempt {
    pub fn new(reference: String, request: &InitiateRequest) -> Self {
        Self {
            reference,
            amount: request.amount,
            currency: request.currency.clone(),
            payer_contact: request.payer_contact.clone(),
            purpose_ref: request.purpose_ref.clone(),
            status: AttemptStatus::Pending,
            started_at: Utc::now(),
            attempts_made: 0,
            active: true,
            entitlement_warning: None,
        }
    }

    /// Apply a forward state transition. The first terminal transition wins;
    /// any later write is rejected, as is any write to an inactive attempt.
    pub fn transition(&mut self, next: AttemptStatus) -> bool {
        if self.status.is_terminal() || !self.active {
            return false;
        }
        if next == AttemptStatus::Pending {
            return false;
        }
        self.status = next;
        true
    }

    pub fn snapshot(&self) -> AttemptSnapshot {
        AttemptSnapshot {
            reference: self.reference.clone(),
            status: self.status,
            amount: self.amount,
            currency: self.currency.clone(),
            purpose_ref: self.purpose_ref.clone(),
            started_at: self.started_at,
            attempts_made: self.attempts_made,
            active: self.active,
            entitlement_warning: self.entitlement_warning.clone(),
        }
    }
}

/// UI-facing view of an attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSnapshot {
    pub reference: String,
    pub status: AttemptStatus,
    pub amount: f64,
    pub currency: String,
    pub purpose_ref: String,
    pub started_at: DateTime<Utc>,
    pub attempts_made: u32,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement_warning: Option<String>,
}
