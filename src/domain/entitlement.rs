//! Entitlement domain model
//!
//! The subscription/access level granted to a user, refreshed from the
//! session service after a successful payment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current entitlement state for the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    /// Identifier of the plan the user is entitled to
    pub plan_id: String,
    /// Whether the entitlement is currently active
    pub active: bool,
    /// When the entitlement lapses, if bounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}
