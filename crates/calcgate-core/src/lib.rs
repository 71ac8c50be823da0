//! calcgate core - session handling, route protection and the calculator
//! gateway client.
//!
//! The terminal front end lives in `calcgate-tui`; everything it needs that
//! is not drawing or key handling is here.

pub mod api;
pub mod auth;
pub mod calculator;
pub mod config;
pub mod home;
pub mod nav;
pub mod notify;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, CalculatorService};
pub use auth::{GuardState, RouteGuard, SessionRecord, SessionStore};
pub use calculator::{Calculator, Key, OperationRequest};
pub use config::{Config, SessionBackend};
pub use home::Dashboard;
pub use nav::Route;
pub use notify::{Level, Notification, Notifications};
pub use validation::{Credentials, FieldErrors};
