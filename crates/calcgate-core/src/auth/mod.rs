//! Authentication module for sessions and route protection.
//!
//! This module provides:
//! - `SessionStore`: the current session, written through to a `SessionStorage`
//! - `TokenClaims`: expiry read from the bearer token payload
//! - `RouteGuard`: decides whether protected routes may render
//! - `flow`: sign-in, sign-up and sign-out
//! - `CredentialStore`: remembered passwords via the OS keychain

pub mod claims;
pub mod credentials;
pub mod flow;
pub mod guard;
pub mod session;
pub mod storage;

pub use claims::{ClaimsError, TokenClaims};
pub use credentials::CredentialStore;
pub use guard::{authorize, GuardState, RouteGuard};
pub use session::{SessionRecord, SessionStore};
pub use storage::{storage_for, FileStorage, KeyringStorage, MemoryStorage, SessionStorage};
