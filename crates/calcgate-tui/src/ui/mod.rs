//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, title/status bars and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color palette and text styling
//! - `views`: Per-route content (sign-in/sign-up forms, home, notices)

pub mod input;
pub mod render;
pub mod styles;
pub mod views;
