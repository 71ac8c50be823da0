//! Keypad state and expression submission.
//!
//! The client never evaluates anything itself. It builds the expression from
//! key presses, rewrites square roots into the gateway's `sqrt(n)` form and
//! sends it off. Whatever comes back becomes the new display.

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::CalculatorService;
use crate::auth::SessionStore;
use crate::notify::Notifications;

/// What the display shows before any input and after a reset
pub const INITIAL_DISPLAY: &str = "0";

/// Unary square-root marker on the keypad
pub const SQRT_MARKER: char = '√';

const MISSING_USER_ID: &str = "Log in again to get user id, user id not found";

/// Keys on the keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Add,
    Subtract,
    Multiply,
    Divide,
    Sqrt,
    Dot,
}

impl Key {
    /// Map a typed character to a key
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => Some(Key::Digit(c as u8 - b'0')),
            '+' => Some(Key::Add),
            '-' => Some(Key::Subtract),
            '*' | 'x' => Some(Key::Multiply),
            '/' => Some(Key::Divide),
            '.' | ',' => Some(Key::Dot),
            'r' | SQRT_MARKER => Some(Key::Sqrt),
            _ => None,
        }
    }

    /// Text the key appends to the display
    pub fn symbol(&self) -> String {
        match self {
            Key::Digit(d) => d.to_string(),
            Key::Add => "+".to_string(),
            Key::Subtract => "-".to_string(),
            Key::Multiply => "*".to_string(),
            Key::Divide => "/".to_string(),
            Key::Sqrt => SQRT_MARKER.to_string(),
            Key::Dot => ".".to_string(),
        }
    }
}

/// Request body for `/operations/execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub expression: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("{}", MISSING_USER_ID)]
    MissingUserId,
}

/// Replace every `√` directly followed by digits with `sqrt(<digits>)`.
/// A `√` without digits after it is kept as typed.
pub fn rewrite_expression(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != SQRT_MARKER {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(&d) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }

        if digits.is_empty() {
            out.push(c);
        } else {
            out.push_str("sqrt(");
            out.push_str(&digits);
            out.push(')');
        }
    }

    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calculator {
    display: String,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            display: INITIAL_DISPLAY.to_string(),
        }
    }

    /// Start from a typed expression, as with `--eval`
    pub fn with_display(expression: impl Into<String>) -> Self {
        let display: String = expression.into();
        if display.trim().is_empty() {
            return Self::new();
        }
        Self { display }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// A fresh display is replaced by the first key, later keys append
    pub fn press(&mut self, key: Key) {
        let symbol = key.symbol();
        if self.display == INITIAL_DISPLAY {
            self.display = symbol;
        } else {
            self.display.push_str(&symbol);
        }
    }

    /// CE
    pub fn clear(&mut self) {
        self.display = INITIAL_DISPLAY.to_string();
    }

    /// Build the request for the current display
    pub fn prepare(&self, session: &SessionStore) -> Result<OperationRequest, CalculatorError> {
        let user_id = session.user_id().ok_or(CalculatorError::MissingUserId)?;
        Ok(OperationRequest {
            user_id,
            expression: rewrite_expression(&self.display),
        })
    }

    /// Handle a submission that never got sent
    pub fn reject(&mut self, error: CalculatorError, notifications: &mut Notifications) {
        warn!(error = %error, "Operation not submitted");
        self.clear();
        notifications.error(error.to_string());
    }

    /// Apply the evaluator's answer. Returns the new display on success.
    pub fn apply(
        &mut self,
        result: Result<String>,
        notifications: &mut Notifications,
    ) -> Option<String> {
        match result {
            Ok(value) => {
                debug!(value = %value, "Operation evaluated");
                self.display = value.clone();
                Some(value)
            }
            Err(e) => {
                self.clear();
                notifications.error(format!(
                    "An error occurred when trying to calculate operation: {}",
                    e
                ));
                None
            }
        }
    }

    /// Prepare, send and apply in one go
    pub async fn submit<S: CalculatorService + ?Sized>(
        &mut self,
        api: &S,
        session: &SessionStore,
        notifications: &mut Notifications,
    ) -> Option<String> {
        let request = match self.prepare(session) {
            Ok(request) => request,
            Err(e) => {
                self.reject(e, notifications);
                return None;
            }
        };

        let result = api.execute_operation(&request).await;
        self.apply(result, notifications)
    }
}
