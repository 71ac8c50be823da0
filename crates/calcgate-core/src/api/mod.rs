//! REST API client module for the calculator gateway.
//!
//! This module provides the `ApiClient` for registering, signing in and
//! running authenticated operations (expression evaluation, random strings,
//! balance lookups).
//!
//! Authenticated calls carry the JWT bearer token returned by `/auth/login`.

pub mod client;
pub mod error;
pub mod service;

pub use client::ApiClient;
pub use error::ApiError;
pub use service::CalculatorService;
