//! Malipo Confirm - payment confirmation service
//!
//! Initiates charges against an external payment gateway (mobile money or
//! card rails) and polls the gateway status until a terminal outcome or
//! timeout, refreshing the user's entitlement after a successful payment.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod shared;


pub use config::AppConfig;
pub use server::ConfirmServer;
pub use shared::error::{AppError, AppResult};
