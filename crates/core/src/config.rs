//! Security configuration for Bastion.
//!
//! One `SecurityConfig` is built at process start and handed to the
//! composition root. Every section falls back to its defaults, so a config
//! file only needs to name the values it overrides.

use serde::{Deserialize, Serialize};
#[cfg(feature = "toml")]
use std::path::Path;

use crate::error::{Error, Result};

/// Failed attempts before an account is locked.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Lock window (30 minutes).
pub const DEFAULT_LOCKOUT_DURATION_SECS: u64 = 30 * 60;

/// Fixed session lifetime (60 minutes).
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60 * 60;

/// Shortest acceptable password, in characters.
pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 6;

/// Longest acceptable password, in characters.
pub const DEFAULT_PASSWORD_MAX_LENGTH: usize = 50;

/// Default page size for "recent activity" reporting.
pub const DEFAULT_RECENT_ENTRIES: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub lockout: LockoutConfig,
    pub session: SessionConfig,
    pub password: PasswordPolicyConfig,
    pub audit: AuditConfig,
}

/// Brute-force protection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Failures that trigger a lock
    pub max_failed_attempts: u32,
    /// How long a lock lasts before it self-heals
    pub lockout_duration_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout_duration_secs: DEFAULT_LOCKOUT_DURATION_SECS,
        }
    }
}

impl LockoutConfig {
    pub fn lockout_duration_ms(&self) -> u64 {
        self.lockout_duration_secs.saturating_mul(crate::time::MS_PER_SEC)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime measured from creation, never extended by activity
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_secs.saturating_mul(crate::time::MS_PER_SEC)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            max_length: DEFAULT_PASSWORD_MAX_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Entries returned by reporting screens when no count is given
    pub recent_default: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            recent_default: DEFAULT_RECENT_ENTRIES,
        }
    }
}

impl SecurityConfig {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SecurityConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would disable a protection outright.
    pub fn validate(&self) -> Result<()> {
        if self.lockout.max_failed_attempts == 0 {
            return Err(Error::Config(
                "lockout.max_failed_attempts must be at least 1".to_string(),
            ));
        }
        if self.lockout.lockout_duration_secs == 0 {
            return Err(Error::Config(
                "lockout.lockout_duration_secs must be non-zero".to_string(),
            ));
        }
        if self.session.timeout_secs == 0 {
            return Err(Error::Config(
                "session.timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.password.min_length == 0 || self.password.min_length > self.password.max_length {
            return Err(Error::Config(format!(
                "password length bounds are inconsistent: min={} max={}",
                self.password.min_length, self.password.max_length
            )));
        }
        Ok(())
    }
}
