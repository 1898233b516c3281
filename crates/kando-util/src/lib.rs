//! Shared utilities for kando.
//!
//! This crate provides common utilities used across the kando workspace:
//! - Logging setup with tracing
//! - Wall-clock helpers for expiration timestamps
//! - Data and config directory locations

pub mod clock;
pub mod log;
pub mod path;

pub use clock::{expires_at, now_millis};
pub use log::LogLevel;
