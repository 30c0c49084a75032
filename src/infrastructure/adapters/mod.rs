//! Infrastructure adapters module
//!
//! Adapters implementing the application ports against external HTTP
//! services.

pub mod gateway;
pub mod session_store;

pub use gateway::HttpPaymentGateway;
pub use session_store::HttpSessionStore;
