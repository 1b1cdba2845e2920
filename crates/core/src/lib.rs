//! Core functionality shared by the Bastion authentication crates.
//!
//! Holds the security configuration, the core error type, logging setup and
//! the millisecond clock every component measures windows against.

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use config::{
    AuditConfig, LockoutConfig, PasswordPolicyConfig, SecurityConfig, SessionConfig,
};
pub use error::{Error, Result};
pub use time::{current_timestamp_ms, window_elapsed};
