//! Route content rendering.

pub mod forms;
pub mod home;
pub mod notice;
