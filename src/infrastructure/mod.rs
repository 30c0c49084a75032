//! Infrastructure layer - adapters for external services and the HTTP
//! surface

pub mod adapters;
pub mod http;
