use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::claims::TokenClaims;
use super::session::SessionStore;
use crate::nav::Route;

/// Upper bound on the recheck interval (one day)
const MAX_RECHECK_SECS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No check has run yet
    Unknown,
    Authorized,
    Unauthorized,
}

/// What a stored token turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenStatus {
    Absent,
    Undecodable,
    Expired,
    Live,
}

fn inspect(token: Option<&str>, now: DateTime<Utc>) -> TokenStatus {
    let Some(token) = token else {
        return TokenStatus::Absent;
    };

    match TokenClaims::decode(token) {
        Ok(claims) if claims.is_expired_at(now) => {
            debug!(exp = claims.exp, now = now.timestamp(), "Token expired");
            TokenStatus::Expired
        }
        Ok(_) => TokenStatus::Live,
        Err(e) => {
            debug!(error = %e, "Token could not be decoded");
            TokenStatus::Undecodable
        }
    }
}

/// Decide whether a token may open protected routes at `now`.
/// Missing, undecodable and expired tokens are all unauthorized.
pub fn authorize(token: Option<&str>, now: DateTime<Utc>) -> GuardState {
    match inspect(token, now) {
        TokenStatus::Live => GuardState::Authorized,
        TokenStatus::Absent | TokenStatus::Undecodable | TokenStatus::Expired => {
            GuardState::Unauthorized
        }
    }
}

/// Gatekeeper for protected routes.
///
/// Checks run on every navigation into a protected route. While such a route
/// stays open, `poll` re-checks when the session changes and, if an interval
/// is configured, whenever that interval elapses.
pub struct RouteGuard {
    state: GuardState,
    recheck_interval: Option<Duration>,
    checked_at: Option<DateTime<Utc>>,
    checked_revision: Option<u64>,
}

impl RouteGuard {
    /// `recheck_secs == 0` disables interval re-checks
    pub fn new(recheck_secs: u64) -> Self {
        let recheck_interval = if recheck_secs == 0 {
            None
        } else {
            Some(Duration::seconds(recheck_secs.min(MAX_RECHECK_SECS) as i64))
        };

        Self {
            state: GuardState::Unknown,
            recheck_interval,
            checked_at: None,
            checked_revision: None,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Evaluate the current session. Only an expired token is dropped from
    /// the store; an undecodable one is refused but left in place.
    pub fn check(&mut self, session: &mut SessionStore, now: DateTime<Utc>) -> GuardState {
        let status = inspect(session.token(), now);
        let state = if status == TokenStatus::Live {
            GuardState::Authorized
        } else {
            GuardState::Unauthorized
        };

        if status == TokenStatus::Expired {
            info!("Stored session has expired, clearing it");
            session.clear();
        }

        self.state = state;
        self.checked_at = Some(now);
        self.checked_revision = Some(session.revision());
        state
    }

    /// Where a navigation to `target` actually lands
    pub fn resolve(
        &mut self,
        target: Route,
        session: &mut SessionStore,
        now: DateTime<Utc>,
    ) -> Route {
        if !target.is_protected() {
            return target;
        }

        match self.check(session, now) {
            GuardState::Authorized => target,
            GuardState::Unknown | GuardState::Unauthorized => {
                debug!(target = target.path(), "Redirecting to unauthorized view");
                Route::Unauthorized
            }
        }
    }

    /// Re-check while `current` is showing. Returns the redirect target when
    /// the session stopped being valid.
    pub fn poll(
        &mut self,
        current: Route,
        session: &mut SessionStore,
        now: DateTime<Utc>,
    ) -> Option<Route> {
        if !current.is_protected() || !self.is_due(session, now) {
            return None;
        }

        match self.check(session, now) {
            GuardState::Authorized => None,
            GuardState::Unknown | GuardState::Unauthorized => Some(Route::Unauthorized),
        }
    }

    fn is_due(&self, session: &SessionStore, now: DateTime<Utc>) -> bool {
        if self.checked_revision != Some(session.revision()) {
            return true;
        }
        match (self.recheck_interval, self.checked_at) {
            (Some(interval), Some(checked_at)) => now - checked_at >= interval,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
