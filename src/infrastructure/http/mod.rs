//! HTTP surface: handlers and route wiring

pub mod handlers;
pub mod routes;

pub use routes::PaymentRoutes;
