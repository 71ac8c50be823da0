use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use tracing::{debug, warn};

use super::storage::SessionStorage;

/// The persisted session: bearer token bound to the user it was issued for.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "userToken")]
    pub token: String,
    /// The gateway sometimes sends the id as a numeric string
    #[serde(rename = "userId")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub user_id: i64,
}

/// Single source of truth for the current session.
///
/// Every `set` writes through to durable storage. The store never looks at
/// token expiry; that belongs to the route guard.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    record: Option<SessionRecord>,
    revision: u64,
}

impl SessionStore {
    /// Create a store seeded from durable storage
    pub fn open(storage: Box<dyn SessionStorage>) -> Self {
        let record = match storage.load() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to load stored session, starting signed out");
                None
            }
        };
        debug!(has_session = record.is_some(), "Session store opened");

        Self {
            storage,
            record,
            revision: 0,
        }
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.token.as_str())
    }

    /// Get the user ID if a session exists
    pub fn user_id(&self) -> Option<i64> {
        self.record.as_ref().map(|r| r.user_id)
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    /// Replace the current session and write it through to storage.
    /// `None` removes the stored entry.
    pub fn set(&mut self, record: Option<SessionRecord>) {
        let result = match record {
            Some(ref record) => self.storage.save(record),
            None => self.storage.remove(),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }

        self.record = record;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Clear session data
    pub fn clear(&mut self) {
        self.set(None);
    }

    /// Bumped on every `set`, so observers can tell the token changed
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::MemoryStorage;

    fn record(token: &str, user_id: i64) -> SessionRecord {
        SessionRecord {
            token: token.to_string(),
            user_id,
        }
    }

    #[test]
    fn test_open_seeds_from_storage() {
        let storage = MemoryStorage::with_record(record("abc", 7));
        let store = SessionStore::open(Box::new(storage));
        assert_eq!(store.token(), Some("abc"));
        assert_eq!(store.user_id(), Some(7));
    }

    #[test]
    fn test_set_then_get_returns_token() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::open(Box::new(storage.clone()));
        assert_eq!(store.token(), None);

        store.set(Some(record("t1", 1)));
        assert_eq!(store.token(), Some("t1"));
        assert_eq!(storage.stored(), Some(record("t1", 1)));
    }

    #[test]
    fn test_set_none_removes_durable_entry() {
        let storage = MemoryStorage::with_record(record("t1", 1));
        let mut store = SessionStore::open(Box::new(storage.clone()));

        store.set(None);
        assert_eq!(store.token(), None);
        assert_eq!(store.user_id(), None);
        assert_eq!(storage.stored(), None);
    }

    #[test]
    fn test_revision_bumps_on_every_set() {
        let mut store = SessionStore::open(Box::new(MemoryStorage::new()));
        assert_eq!(store.revision(), 0);
        store.set(Some(record("a", 1)));
        store.set(Some(record("a", 1)));
        store.clear();
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record("abc", 1)).unwrap();
        assert_eq!(json, serde_json::json!({"userToken": "abc", "userId": 1}));
    }

    #[test]
    fn test_record_accepts_string_user_id() {
        let parsed: SessionRecord =
            serde_json::from_str(r#"{"userToken":"abc","userId":"1"}"#).unwrap();
        assert_eq!(parsed, record("abc", 1));

        let numeric: SessionRecord =
            serde_json::from_str(r#"{"userToken":"abc","userId":12}"#).unwrap();
        assert_eq!(numeric.user_id, 12);
    }

    #[test]
    fn test_record_rejects_non_numeric_user_id() {
        let parsed = serde_json::from_str::<SessionRecord>(r#"{"userToken":"abc","userId":"x"}"#);
        assert!(parsed.is_err());
    }
}
