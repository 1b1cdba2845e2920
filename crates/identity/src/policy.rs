//! Password strength policy.
//!
//! Advisory only: the verdict says whether a secret is usable and how strong
//! it looks. Callers decide whether a warning is acceptable.

use bastion_core::PasswordPolicyConfig;
use serde::{Deserialize, Serialize};

/// Outcome class of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicySeverity {
    Success,
    Warning,
    Error,
}

/// Result of validating one secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    /// False only for `Error` verdicts
    pub valid: bool,
    pub severity: PolicySeverity,
    pub message: String,
}

impl PolicyVerdict {
    fn new(severity: PolicySeverity, message: impl Into<String>) -> Self {
        Self {
            valid: severity != PolicySeverity::Error,
            severity,
            message: message.into(),
        }
    }
}

/// Stateless rule evaluator.
#[derive(Debug, Clone, Default)]
pub struct PasswordPolicy {
    config: PasswordPolicyConfig,
}

impl PasswordPolicy {
    pub fn new(config: PasswordPolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PasswordPolicyConfig {
        &self.config
    }

    /// Rules apply in order; the first failing rule decides the verdict.
    pub fn validate(&self, secret: &str) -> PolicyVerdict {
        if secret.trim().is_empty() {
            return PolicyVerdict::new(PolicySeverity::Error, "Password must not be empty");
        }

        let length = secret.chars().count();
        if length < self.config.min_length {
            return PolicyVerdict::new(
                PolicySeverity::Error,
                format!(
                    "Password must be at least {} characters long",
                    self.config.min_length
                ),
            );
        }
        if length > self.config.max_length {
            return PolicyVerdict::new(
                PolicySeverity::Error,
                format!(
                    "Password must be at most {} characters long",
                    self.config.max_length
                ),
            );
        }

        let has_alpha = secret.chars().any(char::is_alphabetic);
        let has_digit = secret.chars().any(|c| c.is_ascii_digit());
        if !(has_alpha && has_digit) {
            return PolicyVerdict::new(
                PolicySeverity::Warning,
                "Password should contain both letters and numbers",
            );
        }

        PolicyVerdict::new(PolicySeverity::Success, "Password meets policy")
    }
}
