//! Shared fixtures for integration tests.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use bastion_audit::AuditLog;
use bastion_core::SecurityConfig;
use bastion_identity::{Account, AuthOutcome, AuthService, InMemoryDirectory, Role};

pub const ALICE_ID: &str = "u-alice";
pub const ALICE_SECRET: &str = "wonderland1";
pub const BOB_ID: &str = "u-bob";
pub const BOB_SECRET: &str = "builder99";
pub const MAYA_ID: &str = "u-maya";
pub const MAYA_SECRET: &str = "moderate7";

/// A wired service plus handles on its collaborators.
pub struct TestSystem {
    pub service: AuthService,
    pub directory: Arc<InMemoryDirectory>,
    pub audit: Arc<AuditLog>,
}

impl TestSystem {
    /// alice (User), bob (Admin) and maya (Moderator) with default limits.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(SecurityConfig::default())
    }

    pub fn with_config(config: SecurityConfig) -> anyhow::Result<Self> {
        bastion_core::logging::try_init();

        let directory = Arc::new(
            InMemoryDirectory::with_accounts([
                Account::with_password(ALICE_ID, "alice", ALICE_SECRET, Role::User)
                    .email("alice@example.com"),
                Account::with_password(BOB_ID, "bob", BOB_SECRET, Role::Admin),
                Account::with_password(MAYA_ID, "maya", MAYA_SECRET, Role::Moderator),
            ])
            .context("seeding directory")?,
        );
        let audit = Arc::new(AuditLog::new());
        let service = AuthService::new(config, directory.clone(), Arc::clone(&audit))
            .context("building service")?;

        Ok(Self {
            service,
            directory,
            audit,
        })
    }

    /// Log in and return the session token, failing the test otherwise.
    pub fn login(&self, username: &str, secret: &str) -> anyhow::Result<String> {
        match self.service.authenticate(username, secret, None)? {
            AuthOutcome::Success { token, .. } => Ok(token),
            AuthOutcome::Rejected(reason) => Err(anyhow!("{} rejected: {:?}", username, reason)),
        }
    }

    /// Submit `count` wrong secrets for `username`.
    pub fn fail_logins(&self, username: &str, count: usize) -> anyhow::Result<()> {
        for _ in 0..count {
            let outcome = self.service.authenticate(username, "definitely-wrong", None)?;
            anyhow::ensure!(!outcome.is_success(), "wrong secret accepted");
        }
        Ok(())
    }

    pub fn account(&self, id: &str) -> anyhow::Result<Account> {
        use bastion_identity::UserDirectory;
        self.directory
            .find_by_id(id)
            .ok_or_else(|| anyhow!("no account {}", id))
    }
}
