//! Application layer - use cases and ports over the domain

pub mod ports;
pub mod services;

pub use ports::{PaymentGateway, SessionStore};
pub use services::ConfirmationService;
