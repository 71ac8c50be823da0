//! Sign-in and sign-up form validation.
//!
//! Forms that fail validation never reach the network.

use serde::Serialize;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum length for username input.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
pub const MAX_PASSWORD_LENGTH: usize = 128;

pub const USERNAME_INVALID: &str = "Please enter a valid username.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long.";

/// Request body for `/auth/register` and `/auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub password: String,
}

/// Per-field messages for a rejected form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub username: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = [self.username, self.password].into_iter().flatten().collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for FieldErrors {}

impl Credentials {
    /// Validate raw form input
    pub fn validate(username: &str, password: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        if username.trim().is_empty() {
            errors.username = Some(USERNAME_INVALID);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.password = Some(PASSWORD_TOO_SHORT);
        }

        if errors.is_empty() {
            Ok(Self {
                user_name: username.to_string(),
                password: password.to_string(),
            })
        } else {
            Err(errors)
        }
    }
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}
