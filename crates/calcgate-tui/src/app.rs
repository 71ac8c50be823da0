//! Application state management for calcgate.
//!
//! This module contains the `App` struct that owns the session store, route
//! guard, API client and view state, and coordinates the background tasks
//! that talk to the gateway.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use calcgate_core::auth::{
    flow, storage_for, CredentialStore, MemoryStorage, SessionStorage, TokenClaims,
};
use calcgate_core::config::{ENV_PASSWORD, ENV_USERNAME};
use calcgate_core::validation::{can_add_password_char, can_add_username_char};
use calcgate_core::{
    ApiClient, Calculator, CalculatorService, Config, Credentials, Dashboard, FieldErrors, Key,
    Notifications, Route, RouteGuard, SessionRecord, SessionStore,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Credential form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Username,
    Password,
    Button,
    /// Link to the other form (sign in <-> sign up)
    Link,
}

impl FormFocus {
    pub fn next(&self) -> Self {
        match self {
            FormFocus::Username => FormFocus::Password,
            FormFocus::Password => FormFocus::Button,
            FormFocus::Button => FormFocus::Link,
            FormFocus::Link => FormFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormFocus::Username => FormFocus::Link,
            FormFocus::Password => FormFocus::Username,
            FormFocus::Button => FormFocus::Password,
            FormFocus::Link => FormFocus::Button,
        }
    }
}

/// Username/password form shared by the sign-in and sign-up views
#[derive(Debug, Clone)]
pub struct CredentialForm {
    pub username: String,
    pub password: String,
    pub focus: FormFocus,
    pub errors: FieldErrors,
    pub submitting: bool,
}

impl CredentialForm {
    pub fn new(username: String, password: String) -> Self {
        let focus = if username.is_empty() {
            FormFocus::Username
        } else {
            FormFocus::Password
        };
        Self {
            username,
            password,
            focus,
            errors: FieldErrors::default(),
            submitting: false,
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            FormFocus::Username => {
                if can_add_username_char(self.username.chars().count(), c) {
                    self.username.push(c);
                }
            }
            FormFocus::Password => {
                if can_add_password_char(self.password.chars().count(), c) {
                    self.password.push(c);
                }
            }
            FormFocus::Button | FormFocus::Link => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            FormFocus::Username => {
                self.username.pop();
            }
            FormFocus::Password => {
                self.password.pop();
            }
            FormFocus::Button | FormFocus::Link => {}
        }
    }

    /// Run validation; field messages are kept for rendering
    pub fn validate(&mut self) -> Option<Credentials> {
        match Credentials::validate(&self.username, &self.password) {
            Ok(credentials) => {
                self.errors = FieldErrors::default();
                Some(credentials)
            }
            Err(errors) => {
                self.focus = if errors.username.is_some() {
                    FormFocus::Username
                } else {
                    FormFocus::Password
                };
                self.errors = errors;
                None
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(String::new(), String::new());
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from background requests to the main loop.
enum BackgroundResult {
    Login {
        credentials: Credentials,
        result: Result<SessionRecord>,
    },
    Register(Result<()>),
    /// Result of a signed-in request, tagged with the session it was made for
    Home {
        revision: u64,
        result: HomeResult,
    },
}

enum HomeResult {
    Operation(Result<String>),
    RandomString(Result<String>),
    Balance(Result<f64>),
}

/// Startup switches from the command line
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Keep the session in memory only
    pub ephemeral: bool,
}

pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionStore,
    pub guard: RouteGuard,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub route: Route,
    pub login_form: CredentialForm,
    pub register_form: CredentialForm,
    pub calculator: Calculator,
    pub dashboard: Dashboard,
    pub notifications: Notifications,

    /// Requests still in flight
    pub pending: usize,

    // Background task channel
    result_rx: mpsc::Receiver<BackgroundResult>,
    result_tx: mpsc::Sender<BackgroundResult>,
}

/// Open the session store the config asks for
pub fn open_session_store(config: &Config, ephemeral: bool) -> SessionStore {
    let storage: Box<dyn SessionStorage> = if ephemeral {
        Box::new(MemoryStorage::new())
    } else {
        let data_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
        storage_for(config.session_backend, &data_dir)
    };
    SessionStore::open(storage)
}

impl App {
    /// Create a new application instance
    pub fn new(options: &StartOptions) -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(api_url = %config.api_url, backend = ?config.session_backend, "Config loaded");

        let session = open_session_store(&config, options.ephemeral);
        let mut app = Self::with_session(config, session)?;

        // Prefill sign-in from env vars, then config
        let login_username = std::env::var(ENV_USERNAME)
            .ok()
            .or_else(|| app.config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var(ENV_PASSWORD)
            .ok()
            .or_else(|| Self::remembered_password(&app.config, &login_username))
            .unwrap_or_default();
        app.login_form = CredentialForm::new(login_username, login_password);

        Ok(app)
    }

    /// Build around an already opened session, with empty forms
    pub fn with_session(config: Config, session: SessionStore) -> Result<Self> {
        let guard = RouteGuard::new(config.expiry_check_interval_secs);
        let api = ApiClient::new(&config.api_url, config.request_timeout())?;
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            session,
            guard,
            api,

            state: AppState::Normal,
            route: Route::Login,
            login_form: CredentialForm::new(String::new(), String::new()),
            register_form: CredentialForm::new(String::new(), String::new()),
            calculator: Calculator::new(),
            dashboard: Dashboard::new(),
            notifications: Notifications::new(),

            pending: 0,

            result_rx: rx,
            result_tx: tx,
        })
    }

    fn remembered_password(config: &Config, username: &str) -> Option<String> {
        if !config.remember_password || username.is_empty() {
            return None;
        }
        if !CredentialStore::has_credentials(username) {
            return None;
        }
        match CredentialStore::get_password(username) {
            Ok(password) => Some(password),
            Err(e) => {
                warn!(error = %e, "Failed to read remembered password");
                None
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate through the route guard
    pub fn navigate(&mut self, target: Route) {
        let landed = self.guard.resolve(target, &mut self.session, Utc::now());
        info!(from = self.route.path(), to = landed.path(), "Navigate");

        let entering_home = landed == Route::Home && self.route != Route::Home;
        self.route = landed;

        if entering_home {
            self.refresh_balance();
        }
        if landed == Route::Unauthorized {
            self.dashboard.clear();
            self.calculator.clear();
        }
    }

    /// Start at Home when the stored session is still good, otherwise sign in
    pub fn start(&mut self, requested: Option<Route>) {
        let target = requested.unwrap_or(if self.session.token().is_some() {
            Route::Home
        } else {
            Route::Login
        });
        self.navigate(target);
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn submit_login(&mut self) {
        if self.login_form.submitting {
            return;
        }
        let Some(credentials) = self.login_form.validate() else {
            return;
        };

        self.login_form.submitting = true;
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.login(&credentials).await;
            BackgroundResult::Login {
                credentials,
                result,
            }
        });
    }

    pub fn submit_register(&mut self) {
        if self.register_form.submitting {
            return;
        }
        let Some(credentials) = self.register_form.validate() else {
            return;
        };

        self.register_form.submitting = true;
        let api = self.api.clone();
        self.spawn(async move { BackgroundResult::Register(api.register(&credentials).await) });
    }

    pub fn sign_out(&mut self) {
        let route = flow::sign_out(&mut self.session, &mut self.notifications);
        self.dashboard.clear();
        self.calculator.clear();
        self.navigate(route);
    }

    fn remember_login(&mut self, credentials: &Credentials) {
        self.config.last_username = Some(credentials.user_name.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        let stored = if self.config.remember_password {
            CredentialStore::store(&credentials.user_name, &credentials.password)
        } else if CredentialStore::has_credentials(&credentials.user_name) {
            // Remembering was switched off since the last sign-in
            CredentialStore::delete(&credentials.user_name)
        } else {
            Ok(())
        };
        if let Err(e) = stored {
            warn!(error = %e, "Failed to update remembered credentials");
        }
    }

    // =========================================================================
    // Home actions
    // =========================================================================

    /// API client carrying the current token
    fn authorized_api(&self) -> Option<ApiClient> {
        self.session
            .record()
            .map(|record| self.api.with_token(record.token.clone()))
    }

    /// Seconds until the current token expires, if it can be read
    pub fn session_expires_in(&self, now: DateTime<Utc>) -> Option<i64> {
        let token = self.session.token()?;
        TokenClaims::decode(token)
            .ok()
            .map(|claims| claims.seconds_until_expiry(now))
    }

    pub fn press_key(&mut self, key: Key) {
        self.calculator.press(key);
    }

    pub fn evaluate(&mut self) {
        let request = match self.calculator.prepare(&self.session) {
            Ok(request) => request,
            Err(e) => {
                self.calculator.reject(e, &mut self.notifications);
                return;
            }
        };
        let Some(api) = self.authorized_api() else {
            return;
        };

        debug!(expression = %request.expression, "Submitting operation");
        self.spawn_home(async move { HomeResult::Operation(api.execute_operation(&request).await) });
    }

    pub fn generate_random_string(&mut self) {
        let Some(user_id) = Dashboard::authorize(&self.session, &mut self.notifications) else {
            return;
        };
        let Some(api) = self.authorized_api() else {
            return;
        };
        self.spawn_home(async move { HomeResult::RandomString(api.random_string(user_id).await) });
    }

    pub fn refresh_balance(&mut self) {
        let Some(user_id) = Dashboard::authorize(&self.session, &mut self.notifications) else {
            return;
        };
        let Some(api) = self.authorized_api() else {
            return;
        };
        self.spawn_home(async move { HomeResult::Balance(api.balance(user_id).await) });
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = BackgroundResult> + Send + 'static,
    {
        let tx = self.result_tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let result = task.await;
            if tx.send(result).await.is_err() {
                warn!("Failed to deliver background result - receiver dropped");
            }
        });
    }

    /// Spawn a signed-in request; its result is dropped if the session
    /// changes before it lands
    fn spawn_home<F>(&mut self, task: F)
    where
        F: Future<Output = HomeResult> + Send + 'static,
    {
        let revision = self.session.revision();
        self.spawn(async move {
            BackgroundResult::Home {
                revision,
                result: task.await,
            }
        });
    }

    /// Apply finished background work, re-check expiry, expire toasts
    pub fn tick(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            self.process_result(result);
        }

        let now = Utc::now();
        if let Some(redirect) = self.guard.poll(self.route, &mut self.session, now) {
            info!(to = redirect.path(), "Session expired while viewing protected route");
            self.route = redirect;
            self.dashboard.clear();
            self.calculator.clear();
        }

        self.notifications.prune(now);
    }

    fn process_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Login {
                credentials,
                result,
            } => {
                self.login_form.submitting = false;
                let next = flow::finish_sign_in(&mut self.session, &mut self.notifications, result);
                if let Some(route) = next {
                    self.remember_login(&credentials);
                    self.login_form.password.clear();
                    self.navigate(route);
                }
            }
            BackgroundResult::Register(result) => {
                self.register_form.submitting = false;
                if let Some(route) = flow::finish_sign_up(&mut self.notifications, result) {
                    self.login_form.username = self.register_form.username.clone();
                    self.login_form.focus = FormFocus::Password;
                    self.register_form.reset();
                    self.navigate(route);
                }
            }
            BackgroundResult::Home { revision, result } => {
                if revision != self.session.revision() {
                    debug!(revision, current = self.session.revision(), "Dropping stale result");
                    return;
                }
                self.process_home_result(result);
            }
        }
    }

    fn process_home_result(&mut self, result: HomeResult) {
        match result {
            HomeResult::Operation(result) => {
                if self.calculator.apply(result, &mut self.notifications).is_some() {
                    self.refresh_balance();
                }
            }
            HomeResult::RandomString(result) => {
                if self
                    .dashboard
                    .apply_random_string(result, &mut self.notifications)
                {
                    self.refresh_balance();
                }
            }
            HomeResult::Balance(result) => {
                self.dashboard.apply_balance(result, &mut self.notifications);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Expires 2100-01-01
    const LIVE_TOKEN: &str =
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiIxIiwiZXhwIjo0MTAyNDQ0ODAwfQ.sig";
    /// Expired 2001-09-09
    const EXPIRED_TOKEN: &str =
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiIxIiwiZXhwIjoxMDAwMDAwMDAwfQ.sig";

    fn test_app(token: Option<&str>) -> App {
        let config = Config {
            // Nothing listens here; spawned requests fail fast
            api_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..Config::default()
        };
        let storage = match token {
            Some(token) => MemoryStorage::with_record(SessionRecord {
                token: token.to_string(),
                user_id: 7,
            }),
            None => MemoryStorage::new(),
        };
        App::with_session(config, SessionStore::open(Box::new(storage))).unwrap()
    }

    fn home_result(app: &App, result: HomeResult) -> BackgroundResult {
        BackgroundResult::Home {
            revision: app.session.revision(),
            result,
        }
    }

    #[test]
    fn test_home_result_dropped_after_sign_out() {
        let mut app = test_app(Some(LIVE_TOKEN));
        let late = home_result(&app, HomeResult::Balance(Ok(50.0)));

        app.sign_out();
        app.process_result(late);

        assert_eq!(app.route, Route::Login);
        assert_eq!(app.dashboard.balance, None);
    }

    #[test]
    fn test_result_from_previous_session_dropped_after_new_sign_in() {
        let mut app = test_app(Some(LIVE_TOKEN));
        let stale = home_result(&app, HomeResult::Operation(Ok("4".to_string())));

        app.sign_out();
        app.session.set(Some(SessionRecord {
            token: LIVE_TOKEN.to_string(),
            user_id: 8,
        }));
        app.process_result(stale);

        assert_eq!(app.calculator.display(), "0");
        assert_eq!(app.pending, 0);
    }

    #[tokio::test]
    async fn test_successful_operation_refreshes_balance() {
        let mut app = test_app(Some(LIVE_TOKEN));

        let done = home_result(&app, HomeResult::Operation(Ok("3".to_string())));
        app.process_result(done);
        assert_eq!(app.calculator.display(), "3");
        assert_eq!(app.pending, 1);

        let failed = home_result(&app, HomeResult::Operation(Err(anyhow::anyhow!("boom"))));
        app.process_result(failed);
        assert_eq!(app.calculator.display(), "0");
        assert_eq!(app.pending, 1);
    }

    #[tokio::test]
    async fn test_random_string_refreshes_balance_only_when_non_empty() {
        let mut app = test_app(Some(LIVE_TOKEN));

        let empty = home_result(&app, HomeResult::RandomString(Ok(String::new())));
        app.process_result(empty);
        assert_eq!(app.dashboard.random_string, None);
        assert_eq!(app.pending, 0);

        let value = home_result(&app, HomeResult::RandomString(Ok("xyz".to_string())));
        app.process_result(value);
        assert_eq!(app.dashboard.random_string.as_deref(), Some("xyz"));
        assert_eq!(app.pending, 1);
    }

    #[test]
    fn test_balance_result_updates_dashboard() {
        let mut app = test_app(Some(LIVE_TOKEN));
        let balance = home_result(&app, HomeResult::Balance(Ok(12.5)));
        app.process_result(balance);
        assert_eq!(app.dashboard.balance, Some(12.5));
    }

    #[test]
    fn test_tick_redirects_when_token_has_expired() {
        let mut app = test_app(Some(EXPIRED_TOKEN));
        app.route = Route::Home;
        app.dashboard.balance = Some(5.0);
        app.calculator.press(Key::Digit(9));

        app.tick();

        assert_eq!(app.route, Route::Unauthorized);
        assert_eq!(app.dashboard.balance, None);
        assert_eq!(app.calculator.display(), "0");
        assert_eq!(app.session.token(), None);
    }

    #[test]
    fn test_tick_keeps_live_session_on_home() {
        let mut app = test_app(Some(LIVE_TOKEN));
        app.route = Route::Home;
        app.tick();
        assert_eq!(app.route, Route::Home);
        assert_eq!(app.session.token(), Some(LIVE_TOKEN));
    }

    #[test]
    fn test_register_success_prefills_sign_in() {
        let mut app = test_app(None);
        app.route = Route::Register;
        app.register_form.username = "bob".to_string();
        app.register_form.password = "secret".to_string();
        app.register_form.submitting = true;

        app.process_result(BackgroundResult::Register(Ok(())));

        assert_eq!(app.route, Route::Login);
        assert_eq!(app.login_form.username, "bob");
        assert_eq!(app.login_form.focus, FormFocus::Password);
        assert!(app.register_form.username.is_empty());
        assert!(!app.register_form.submitting);
    }

    #[test]
    fn test_register_failure_stays_on_sign_up() {
        let mut app = test_app(None);
        app.route = Route::Register;
        app.register_form.username = "bob".to_string();
        app.register_form.submitting = true;

        app.process_result(BackgroundResult::Register(Err(anyhow::anyhow!("409"))));

        assert_eq!(app.route, Route::Register);
        assert_eq!(app.register_form.username, "bob");
        assert!(!app.register_form.submitting);
        assert!(app.login_form.username.is_empty());
    }

    #[test]
    fn test_session_expires_in() {
        let now = Utc.timestamp_opt(4_102_444_700, 0).unwrap();
        assert_eq!(test_app(Some(LIVE_TOKEN)).session_expires_in(now), Some(100));
        assert_eq!(test_app(Some("abc")).session_expires_in(now), None);
        assert_eq!(test_app(None).session_expires_in(now), None);
    }

    #[test]
    fn test_form_focus_next_wraps() {
        assert_eq!(FormFocus::Username.next(), FormFocus::Password);
        assert_eq!(FormFocus::Password.next(), FormFocus::Button);
        assert_eq!(FormFocus::Button.next(), FormFocus::Link);
        assert_eq!(FormFocus::Link.next(), FormFocus::Username);
    }

    #[test]
    fn test_form_focus_prev_wraps() {
        assert_eq!(FormFocus::Username.prev(), FormFocus::Link);
        assert_eq!(FormFocus::Link.prev(), FormFocus::Button);
        assert_eq!(FormFocus::Button.prev(), FormFocus::Password);
        assert_eq!(FormFocus::Password.prev(), FormFocus::Username);
    }

    #[test]
    fn test_form_starts_on_password_when_prefilled() {
        assert_eq!(
            CredentialForm::new("alice".into(), String::new()).focus,
            FormFocus::Password
        );
        assert_eq!(
            CredentialForm::new(String::new(), String::new()).focus,
            FormFocus::Username
        );
    }

    #[test]
    fn test_form_typing_follows_focus() {
        let mut form = CredentialForm::new(String::new(), String::new());
        form.push_char('a');
        form.push_char('\n');
        form.focus = FormFocus::Password;
        form.push_char('x');
        form.pop_char();
        form.push_char('y');
        form.focus = FormFocus::Button;
        form.push_char('z');

        assert_eq!(form.username, "a");
        assert_eq!(form.password, "y");
    }

    #[test]
    fn test_form_validate_moves_focus_to_first_error() {
        let mut form = CredentialForm::new(String::new(), "123".into());
        form.focus = FormFocus::Button;
        assert!(form.validate().is_none());
        assert_eq!(form.focus, FormFocus::Username);
        assert!(form.errors.username.is_some());
        assert!(form.errors.password.is_some());

        let mut form = CredentialForm::new("bob".into(), "123".into());
        assert!(form.validate().is_none());
        assert_eq!(form.focus, FormFocus::Password);

        form.password = "123456".into();
        let credentials = form.validate().unwrap();
        assert_eq!(credentials.user_name, "bob");
        assert!(form.errors.is_empty());
    }
}
