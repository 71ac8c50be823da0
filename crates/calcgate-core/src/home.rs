//! Home view state: balance and the random-string feature.

use anyhow::Result;
use tracing::debug;

use crate::auth::SessionStore;
use crate::notify::Notifications;

const MISSING_TOKEN: &str = "Unable to get user token";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub balance: Option<f64>,
    pub random_string: Option<String>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// User id for an authenticated action, or a notification when signed out
    pub fn authorize(session: &SessionStore, notifications: &mut Notifications) -> Option<i64> {
        if session.token().is_none() {
            notifications.error(MISSING_TOKEN);
            return None;
        }
        session.user_id()
    }

    /// A failed lookup keeps the last known balance
    pub fn apply_balance(&mut self, result: Result<f64>, notifications: &mut Notifications) {
        match result {
            Ok(balance) => {
                debug!(balance, "Balance updated");
                self.balance = Some(balance);
            }
            Err(e) => notifications.error(format!(
                "An error occurred while getting the current balance: {}",
                e
            )),
        }
    }

    /// Returns true when a new string was stored
    pub fn apply_random_string(
        &mut self,
        result: Result<String>,
        notifications: &mut Notifications,
    ) -> bool {
        match result {
            Ok(value) if value.is_empty() => false,
            Ok(value) => {
                self.random_string = Some(value);
                true
            }
            Err(e) => {
                notifications.error(format!(
                    "An error occurred while generating the random string: {}",
                    e
                ));
                false
            }
        }
    }

    /// Balance formatted for display; whole amounts drop the decimals
    pub fn balance_display(&self) -> String {
        match self.balance {
            None => "-".to_string(),
            Some(b) if b.fract() == 0.0 && b.abs() < 1e15 => format!("{}", b as i64),
            Some(b) => format!("{:.2}", b),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CalculatorService;
    use crate::auth::{MemoryStorage, SessionRecord};
    use crate::testing::MockService;
    use chrono::Utc;

    #[test]
    fn test_authorize_without_session_notifies() {
        let store = SessionStore::open(Box::new(MemoryStorage::new()));
        let mut notes = Notifications::new();

        assert_eq!(Dashboard::authorize(&store, &mut notes), None);
        assert_eq!(notes.latest(Utc::now()).unwrap().message, MISSING_TOKEN);
    }

    #[test]
    fn test_authorize_with_session() {
        let store = SessionStore::open(Box::new(MemoryStorage::with_record(SessionRecord {
            token: "t".to_string(),
            user_id: 4,
        })));
        let mut notes = Notifications::new();

        assert_eq!(Dashboard::authorize(&store, &mut notes), Some(4));
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_balance_failure_keeps_previous_value() {
        let mut dashboard = Dashboard::new();
        let mut notes = Notifications::new();

        let ok = MockService::default().with_balance_result(Ok(12.0));
        dashboard.apply_balance(ok.balance(1).await, &mut notes);
        assert_eq!(dashboard.balance, Some(12.0));

        let failing = MockService::default().with_balance_result(Err(anyhow::anyhow!("down")));
        dashboard.apply_balance(failing.balance(1).await, &mut notes);
        assert_eq!(dashboard.balance, Some(12.0));
        assert_eq!(failing.balance_calls(), 1);
        assert!(notes.latest(Utc::now()).unwrap().message.contains("down"));
    }

    #[tokio::test]
    async fn test_random_string_ignores_empty_body() {
        let mut dashboard = Dashboard::new();
        let mut notes = Notifications::new();

        let api = MockService::default().with_random_result(Ok("abc123".to_string()));
        assert!(dashboard.apply_random_string(api.random_string(1).await, &mut notes));
        assert_eq!(api.random_calls(), 1);
        assert_eq!(dashboard.random_string.as_deref(), Some("abc123"));

        assert!(!dashboard.apply_random_string(Ok(String::new()), &mut notes));
        assert_eq!(dashboard.random_string.as_deref(), Some("abc123"));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_random_string_failure_notifies() {
        let mut dashboard = Dashboard::new();
        let mut notes = Notifications::new();
        assert!(!dashboard.apply_random_string(Err(anyhow::anyhow!("nope")), &mut notes));
        assert!(notes.latest(Utc::now()).unwrap().message.contains("nope"));
    }

    #[test]
    fn test_balance_display() {
        let mut dashboard = Dashboard::new();
        assert_eq!(dashboard.balance_display(), "-");
        dashboard.balance = Some(100.0);
        assert_eq!(dashboard.balance_display(), "100");
        dashboard.balance = Some(99.5);
        assert_eq!(dashboard.balance_display(), "99.50");
    }
}
