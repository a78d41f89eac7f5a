//! service-core: Shared infrastructure for the push-gateway service.
pub mod config;
pub mod error;
pub mod observability;
