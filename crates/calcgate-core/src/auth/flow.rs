//! Sign-in, sign-up and sign-out.
//!
//! Each network flow comes in two halves: the async wrapper that talks to the
//! gateway, and a `finish_*` function that applies the result. The UI runs the
//! request on a background task and calls `finish_*` on the main loop.

use anyhow::Result;
use tracing::{error, info};

use super::session::{SessionRecord, SessionStore};
use crate::api::CalculatorService;
use crate::nav::Route;
use crate::notify::Notifications;
use crate::validation::Credentials;

pub const LOGIN_SUCCESS: &str = "Login success!";
pub const LOGIN_FAILED: &str = "An error occurred during login, please contact support";
pub const REGISTER_SUCCESS: &str = "User created successfully!";
pub const REGISTER_FAILED: &str = "Error creating a user";

/// Store a fresh session. Returns where to go next on success.
pub fn finish_sign_in(
    store: &mut SessionStore,
    notifications: &mut Notifications,
    result: Result<SessionRecord>,
) -> Option<Route> {
    match result {
        Ok(record) => {
            info!(user_id = record.user_id, "Login successful");
            store.set(Some(record));
            notifications.success(LOGIN_SUCCESS);
            Some(Route::Home)
        }
        Err(e) => {
            error!(error = %e, "Login failed");
            notifications.error(LOGIN_FAILED);
            None
        }
    }
}

pub async fn sign_in<S: CalculatorService + ?Sized>(
    api: &S,
    store: &mut SessionStore,
    notifications: &mut Notifications,
    credentials: &Credentials,
) -> Option<Route> {
    let result = api.login(credentials).await;
    finish_sign_in(store, notifications, result)
}

pub fn finish_sign_up(notifications: &mut Notifications, result: Result<()>) -> Option<Route> {
    match result {
        Ok(()) => {
            notifications.success(REGISTER_SUCCESS);
            Some(Route::Login)
        }
        Err(e) => {
            error!(error = %e, "Error creating a user");
            notifications.error(REGISTER_FAILED);
            None
        }
    }
}

pub async fn sign_up<S: CalculatorService + ?Sized>(
    api: &S,
    notifications: &mut Notifications,
    credentials: &Credentials,
) -> Option<Route> {
    let result = api.register(credentials).await;
    finish_sign_up(notifications, result)
}

/// Drop the session and go back to the sign-in view
pub fn sign_out(store: &mut SessionStore, notifications: &mut Notifications) -> Route {
    if store.token().is_some() {
        store.clear();
        notifications.info("Signed out");
    }
    Route::Login
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStorage;
    use crate::notify::Level;
    use crate::testing::MockService;
    use chrono::Utc;

    fn credentials() -> Credentials {
        Credentials::validate("alice", "secret").unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_persists_session_and_navigates_home() {
        let api = MockService::default().with_login_result(Ok(SessionRecord {
            token: "abc".to_string(),
            user_id: 1,
        }));
        let storage = MemoryStorage::new();
        let mut store = SessionStore::open(Box::new(storage.clone()));
        let mut notes = Notifications::new();

        let next = sign_in(&api, &mut store, &mut notes, &credentials()).await;
        assert_eq!(next, Some(Route::Home));
        assert_eq!(api.login_calls(), 1);
        assert_eq!(store.token(), Some("abc"));

        let stored = storage.stored().unwrap();
        assert_eq!(stored.token, "abc");
        assert_eq!(stored.user_id, 1);

        let note = notes.latest(Utc::now()).unwrap();
        assert_eq!(note.level, Level::Success);
        assert_eq!(note.message, LOGIN_SUCCESS);
    }

    #[tokio::test]
    async fn test_sign_in_failure_keeps_signed_out() {
        let api = MockService::default().with_login_result(Err(anyhow::anyhow!("401")));
        let storage = MemoryStorage::new();
        let mut store = SessionStore::open(Box::new(storage.clone()));
        let mut notes = Notifications::new();

        assert_eq!(sign_in(&api, &mut store, &mut notes, &credentials()).await, None);
        assert_eq!(store.token(), None);
        assert_eq!(storage.stored(), None);
        assert_eq!(notes.latest(Utc::now()).unwrap().message, LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_sign_up_success_goes_to_login() {
        let api = MockService::default().with_register_result(Ok(()));
        let mut notes = Notifications::new();

        assert_eq!(sign_up(&api, &mut notes, &credentials()).await, Some(Route::Login));
        assert_eq!(api.register_calls(), 1);
        assert_eq!(notes.latest(Utc::now()).unwrap().message, REGISTER_SUCCESS);
    }

    #[tokio::test]
    async fn test_sign_up_failure_stays() {
        let api = MockService::default().with_register_result(Err(anyhow::anyhow!("409")));
        let mut notes = Notifications::new();

        assert_eq!(sign_up(&api, &mut notes, &credentials()).await, None);
        assert_eq!(notes.latest(Utc::now()).unwrap().level, Level::Error);
    }

    #[test]
    fn test_sign_out_clears_store() {
        let storage = MemoryStorage::with_record(SessionRecord {
            token: "abc".to_string(),
            user_id: 1,
        });
        let mut store = SessionStore::open(Box::new(storage.clone()));
        let mut notes = Notifications::new();

        assert_eq!(sign_out(&mut store, &mut notes), Route::Login);
        assert_eq!(store.token(), None);
        assert_eq!(storage.stored(), None);
    }
}
