//! Application services - Orchestration of domain logic

pub mod confirmation_service;
pub mod scheduler;

pub use confirmation_service::ConfirmationService;
