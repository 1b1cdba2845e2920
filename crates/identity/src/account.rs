//! Account records as held by the user directory.

use bastion_core::current_timestamp_ms;
use bastion_crypto::hash_credential;
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A directory-managed identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique, stable identifier
    pub id: String,
    /// Login and display name
    pub username: String,
    /// Stored credential verifier
    pub password_hash: String,
    pub role: Role,
    /// Inactive accounts can neither log in nor be authorized
    pub active: bool,
    /// Administrative lock, independent of brute-force lockout
    pub locked: bool,
    /// Consecutive failed logins, written back after each attempt
    #[serde(default)]
    pub failed_attempts: u32,
    #[serde(default)]
    pub email: Option<String>,
    /// Timestamp of creation (Unix epoch milliseconds)
    pub created_at: u64,
}

impl Account {
    /// Create an active, unlocked account from an existing verifier.
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            active: true,
            locked: false,
            failed_attempts: 0,
            email: None,
            created_at: current_timestamp_ms(),
        }
    }

    /// Create an account, hashing the plaintext secret.
    pub fn with_password(
        id: impl Into<String>,
        username: impl Into<String>,
        secret: &str,
        role: Role,
    ) -> Self {
        Self::new(id, username, hash_credential(secret), role)
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Directory-side eligibility; brute-force lockout is checked separately.
    pub fn is_usable(&self) -> bool {
        self.active && !self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_crypto::verify_credential;

    #[test]
    fn test_with_password_hashes_secret() {
        let account = Account::with_password("u-1", "alice", "wonderland1", Role::User);
        assert_ne!(account.password_hash, "wonderland1");
        assert!(verify_credential("wonderland1", &account.password_hash));
        assert!(account.is_usable());
        assert_eq!(account.failed_attempts, 0);
    }

    #[test]
    fn test_flags() {
        let account = Account::with_password("u-2", "bob", "builder1", Role::Admin)
            .email("bob@example.com")
            .deactivated();
        assert!(!account.is_usable());
        assert_eq!(account.email.as_deref(), Some("bob@example.com"));

        let locked = Account::with_password("u-3", "carol", "carol123", Role::User).locked();
        assert!(!locked.is_usable());
    }
}
