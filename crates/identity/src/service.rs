//! Authentication service.
//!
//! `AuthService` is the composition root: it owns the lockout guard, session
//! store, permission engine and password policy, and wires them to the user
//! directory and the shared audit log. Presentation layers talk to this type
//! only.
//!
//! # Audit trail
//!
//! Every rejection and every state transition leaves one entry:
//!
//! | Event                                    | Action                       | Severity     |
//! |------------------------------------------|------------------------------|--------------|
//! | unknown user or wrong secret             | `LoginFailure`               | Warning      |
//! | attempt on an inactive or locked account | `LoginBlocked`               | Warning      |
//! | successful login                         | `LoginSuccess`               | Info         |
//! | threshold reached                        | `AccountLocked`              | Warning      |
//! | authorization decision                   | `PermissionGranted`/`Denied` | Info/Warning |
//! | password change refused                  | `PasswordChangeRejected`     | Warning      |

use std::sync::Arc;

use bastion_audit::{AuditAction, AuditEntry, AuditEvent, AuditLog, AuditOrigin, AuditSeverity};
use bastion_core::SecurityConfig;
use bastion_crypto::{hash_credential, verify_credential};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::directory::UserDirectory;
use crate::error::IdentityResult;
use crate::lockout::LockoutGuard;
use crate::permission::PermissionEngine;
use crate::policy::{PasswordPolicy, PolicyVerdict};
use crate::role::capabilities::{AUDIT_VIEW, CHANGE_PASSWORD, USER_LOCK, USER_MANAGEMENT};
use crate::session::{Session, SessionStore, SessionToken};

/// Actor recorded when no account could be resolved.
const ANONYMOUS: &str = "anonymous";

/// Why a login was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    UnknownAccount,
    InactiveAccount,
    AccountLocked,
    InvalidCredentials,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::UnknownAccount => "unknown_account",
            RejectionReason::InactiveAccount => "inactive_account",
            RejectionReason::AccountLocked => "account_locked",
            RejectionReason::InvalidCredentials => "invalid_credentials",
        }
    }
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success {
        token: SessionToken,
        account_id: String,
    },
    Rejected(RejectionReason),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { token, .. } => Some(token),
            AuthOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            AuthOutcome::Success { .. } => None,
            AuthOutcome::Rejected(reason) => Some(*reason),
        }
    }
}

/// Why a password change was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordChangeRejection {
    InvalidSession,
    NotPermitted,
    IncorrectPassword,
    /// New secret failed the policy; the verdict explains why
    PolicyViolation(PolicyVerdict),
}

impl PasswordChangeRejection {
    fn as_str(&self) -> &'static str {
        match self {
            PasswordChangeRejection::InvalidSession => "invalid_session",
            PasswordChangeRejection::NotPermitted => "not_permitted",
            PasswordChangeRejection::IncorrectPassword => "incorrect_password",
            PasswordChangeRejection::PolicyViolation(_) => "policy_violation",
        }
    }
}

/// Result of a password change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordChange {
    /// Stored; the verdict may still carry a strength warning
    Changed(PolicyVerdict),
    Rejected(PasswordChangeRejection),
}

impl PasswordChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, PasswordChange::Changed(_))
    }
}

pub struct AuthService {
    config: SecurityConfig,
    directory: Arc<dyn UserDirectory>,
    audit: Arc<AuditLog>,
    lockout: LockoutGuard,
    sessions: SessionStore,
    permissions: PermissionEngine,
    policy: PasswordPolicy,
}

impl AuthService {
    /// Wire the components together. Fails on an invalid configuration.
    pub fn new(
        config: SecurityConfig,
        directory: Arc<dyn UserDirectory>,
        audit: Arc<AuditLog>,
    ) -> IdentityResult<Self> {
        config.validate()?;

        info!(
            max_failed_attempts = config.lockout.max_failed_attempts,
            lockout_secs = config.lockout.lockout_duration_secs,
            session_timeout_secs = config.session.timeout_secs,
            "Authentication service initialized"
        );

        Ok(Self {
            lockout: LockoutGuard::new(config.lockout.clone(), Arc::clone(&audit)),
            sessions: SessionStore::new(config.session.clone(), Arc::clone(&audit)),
            permissions: PermissionEngine::new(),
            policy: PasswordPolicy::new(config.password.clone()),
            config,
            directory,
            audit,
        })
    }

    /// Service with default limits.
    pub fn with_defaults(
        directory: Arc<dyn UserDirectory>,
        audit: Arc<AuditLog>,
    ) -> IdentityResult<Self> {
        Self::new(SecurityConfig::default(), directory, audit)
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Shared audit log, for reporting screens.
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub fn lockout(&self) -> &LockoutGuard {
        &self.lockout
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn permissions(&self) -> &PermissionEngine {
        &self.permissions
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Verify a username/secret pair and open a session.
    ///
    /// Policy refusals come back as `AuthOutcome::Rejected`. `Err` means the
    /// entropy source or the directory failed underneath.
    pub fn authenticate(
        &self,
        username: &str,
        secret: &str,
        origin: Option<AuditOrigin>,
    ) -> IdentityResult<AuthOutcome> {
        let Some(account) = self.directory.find_by_username(username) else {
            // Unknown names are not tracked by the guard.
            self.reject_login(
                AuditAction::LoginFailure,
                username,
                RejectionReason::UnknownAccount,
                origin,
            );
            return Ok(AuthOutcome::Rejected(RejectionReason::UnknownAccount));
        };

        if !account.active {
            self.reject_login(
                AuditAction::LoginBlocked,
                &account.id,
                RejectionReason::InactiveAccount,
                origin,
            );
            return Ok(AuthOutcome::Rejected(RejectionReason::InactiveAccount));
        }

        if account.locked || self.lockout.is_locked(&account.id) {
            self.reject_login(
                AuditAction::LoginBlocked,
                &account.id,
                RejectionReason::AccountLocked,
                origin,
            );
            return Ok(AuthOutcome::Rejected(RejectionReason::AccountLocked));
        }

        if !verify_credential(secret, &account.password_hash) {
            let status = self.lockout.record_failure(&account.id);

            warn!(
                account_id = %account.id,
                failed_attempts = status.failed_attempts,
                remaining = status.remaining_attempts,
                "Login failed"
            );
            self.audit.record(
                AuditEvent::builder(AuditAction::LoginFailure, account.id.as_str())
                    .severity(AuditSeverity::Warning)
                    .description(format!("Failed login for {}", account.username))
                    .detail("reason", RejectionReason::InvalidCredentials.as_str())
                    .detail("failed_attempts", status.failed_attempts)
                    .detail("remaining_attempts", status.remaining_attempts)
                    .origin(origin)
                    .build(),
            );

            self.directory
                .update_failed_attempts(&account.id, status.failed_attempts)?;
            return Ok(AuthOutcome::Rejected(RejectionReason::InvalidCredentials));
        }

        self.lockout.clear(&account.id);
        if account.failed_attempts != 0 {
            self.directory.update_failed_attempts(&account.id, 0)?;
        }

        let token = self.sessions.create_session_with(&account, origin.clone())?;

        info!(account_id = %account.id, role = %account.role, "Login succeeded");
        self.audit.record(
            AuditEvent::builder(AuditAction::LoginSuccess, account.id.as_str())
                .description(format!("User {} logged in", account.username))
                .detail("role", account.role.as_str())
                .origin(origin)
                .build(),
        );

        Ok(AuthOutcome::Success {
            token,
            account_id: account.id,
        })
    }

    fn reject_login(
        &self,
        action: AuditAction,
        actor: &str,
        reason: RejectionReason,
        origin: Option<AuditOrigin>,
    ) {
        warn!(actor = %actor, reason = reason.as_str(), "Login rejected");
        self.audit.record(
            AuditEvent::builder(action, actor)
                .severity(AuditSeverity::Warning)
                .description(format!("Login rejected: {}", reason.as_str()))
                .detail("reason", reason.as_str())
                .origin(origin)
                .build(),
        );
    }

    pub fn validate_session(&self, token: &str) -> Option<Session> {
        self.sessions.validate_session(token)
    }

    /// End the caller's session. Returns false for an unknown token.
    pub fn logout(&self, token: &str) -> bool {
        match self.sessions.end_session(token) {
            Some(session) => {
                info!(account_id = %session.account_id, "Logged out");
                true
            }
            None => false,
        }
    }

    /// Resolve a token to its session and the account's current record.
    fn session_account(&self, token: &str) -> Option<(Session, Account)> {
        let session = self.sessions.validate_session(token)?;
        let account = self.directory.find_by_id(&session.account_id)?;
        Some((session, account))
    }

    /// Check a capability for the holder of `token`. Logs the decision.
    pub fn authorize(&self, token: &str, capability: &str) -> bool {
        match self.session_account(token) {
            Some((session, account)) => {
                self.decide(Some(&account), &[capability], Some(session.audit_origin()))
            }
            None => self.decide(None, &[capability], None),
        }
    }

    /// Check a capability for an account already in hand. Logs the decision.
    pub fn authorize_account(&self, account: Option<&Account>, capability: &str) -> bool {
        self.decide(account, &[capability], None)
    }

    /// Capability check that also honours a brute-force lock on the account.
    fn permitted(&self, account: Option<&Account>, capability: &str) -> bool {
        match account {
            Some(account) if self.lockout.is_locked(&account.id) => false,
            _ => self.permissions.has_permission(account, capability),
        }
    }

    /// Grant if the account holds any of `capabilities`; one audit entry.
    fn decide(
        &self,
        account: Option<&Account>,
        capabilities: &[&str],
        origin: Option<AuditOrigin>,
    ) -> bool {
        let held = capabilities.iter().find(|cap| self.permitted(account, cap));
        let actor = account.map(|a| a.id.as_str()).unwrap_or(ANONYMOUS);

        let event = match held {
            Some(cap) => {
                debug!(actor = %actor, capability = %cap, "Permission granted");
                AuditEvent::builder(AuditAction::PermissionGranted, actor)
                    .description(format!("Granted {}", cap))
                    .detail("capability", *cap)
            }
            None => {
                let wanted = capabilities.join("|");
                warn!(actor = %actor, capability = %wanted, "Permission denied");
                AuditEvent::builder(AuditAction::PermissionDenied, actor)
                    .severity(AuditSeverity::Warning)
                    .description(format!("Denied {}", wanted))
                    .detail("capability", wanted)
            }
        };
        self.audit.record(event.origin(origin).build());
        held.is_some()
    }

    /// Replace the caller's secret.
    ///
    /// A wrong old secret is refused but does not count toward lockout.
    pub fn change_password(
        &self,
        token: &str,
        old_secret: &str,
        new_secret: &str,
    ) -> IdentityResult<PasswordChange> {
        let Some((session, account)) = self.session_account(token) else {
            self.reject_password_change(ANONYMOUS, PasswordChangeRejection::InvalidSession, None);
            return Ok(PasswordChange::Rejected(PasswordChangeRejection::InvalidSession));
        };
        let origin = Some(session.audit_origin());

        let verdict = self.policy.validate(new_secret);
        let rejection = if !self.permitted(Some(&account), CHANGE_PASSWORD) {
            Some(PasswordChangeRejection::NotPermitted)
        } else if !verify_credential(old_secret, &account.password_hash) {
            Some(PasswordChangeRejection::IncorrectPassword)
        } else if !verdict.valid {
            Some(PasswordChangeRejection::PolicyViolation(verdict.clone()))
        } else {
            None
        };

        if let Some(rejection) = rejection {
            self.reject_password_change(&account.id, rejection.clone(), origin);
            return Ok(PasswordChange::Rejected(rejection));
        }

        self.directory
            .set_password_hash(&account.id, &hash_credential(new_secret))?;

        info!(account_id = %account.id, "Password changed");
        self.audit.record(
            AuditEvent::builder(AuditAction::PasswordChanged, account.id.as_str())
                .description(format!("Password changed for {}", account.username))
                .detail("strength", format!("{:?}", verdict.severity))
                .origin(origin)
                .build(),
        );

        Ok(PasswordChange::Changed(verdict))
    }

    fn reject_password_change(
        &self,
        actor: &str,
        rejection: PasswordChangeRejection,
        origin: Option<AuditOrigin>,
    ) {
        warn!(actor = %actor, reason = rejection.as_str(), "Password change rejected");
        let mut event = AuditEvent::builder(AuditAction::PasswordChangeRejected, actor)
            .severity(AuditSeverity::Warning)
            .description(format!("Password change rejected: {}", rejection.as_str()))
            .detail("reason", rejection.as_str());
        if let PasswordChangeRejection::PolicyViolation(verdict) = &rejection {
            event = event.detail("policy", verdict.message.as_str());
        }
        self.audit.record(event.origin(origin).build());
    }

    /// Resolve the acting administrator and check they may touch `account_id`.
    ///
    /// Every refusal, including an unknown target, is audited and comes back
    /// as `None`.
    fn administer(
        &self,
        admin_token: &str,
        account_id: &str,
    ) -> Option<(Session, Account, Account)> {
        let actor = self.session_account(admin_token);
        let origin = actor.as_ref().map(|(session, _)| session.audit_origin());
        let actor_account = actor.as_ref().map(|(_, account)| account);

        if !self.decide(actor_account, &[USER_MANAGEMENT, USER_LOCK], origin) {
            return None;
        }
        let (session, admin) = actor?;

        let Some(target) = self.directory.find_by_id(account_id) else {
            warn!(actor = %admin.id, target = %account_id, "Target account not found");
            self.audit.record(
                AuditEvent::builder(AuditAction::PermissionDenied, admin.id.as_str())
                    .severity(AuditSeverity::Warning)
                    .description(format!("Unknown account {}", account_id))
                    .detail("target", account_id)
                    .detail("reason", RejectionReason::UnknownAccount.as_str())
                    .origin(Some(session.audit_origin()))
                    .build(),
            );
            return None;
        };

        if !admin.role.can_manage(target.role) {
            warn!(
                actor = %admin.id,
                target = %target.id,
                "Administrator does not outrank target account"
            );
            self.audit.record(
                AuditEvent::builder(AuditAction::PermissionDenied, admin.id.as_str())
                    .severity(AuditSeverity::Warning)
                    .description(format!("{} cannot manage {}", admin.role, target.role))
                    .detail("target", target.id.as_str())
                    .origin(Some(session.audit_origin()))
                    .build(),
            );
            return None;
        }

        Some((session, admin, target))
    }

    /// Lift both the brute-force lock and the directory lock flag.
    ///
    /// Returns `Ok(false)` when the caller may not unlock the account, the
    /// account does not exist, or it was not locked.
    pub fn unlock_account(&self, admin_token: &str, account_id: &str) -> IdentityResult<bool> {
        let Some((session, admin, target)) = self.administer(admin_token, account_id) else {
            return Ok(false);
        };

        let guard_cleared = self.lockout.clear_by(&target.id, &admin.id);
        let flag_cleared = target.locked;

        if target.locked {
            self.directory.set_locked(&target.id, false)?;
        }
        if target.failed_attempts != 0 {
            self.directory.update_failed_attempts(&target.id, 0)?;
        }

        // The guard audits its own unlock; only the directory flag needs one here.
        if flag_cleared && !guard_cleared {
            info!(account_id = %target.id, actor = %admin.id, "Account unlocked");
            self.audit.record(
                AuditEvent::builder(AuditAction::AccountUnlocked, admin.id.as_str())
                    .description(format!("Account {} unlocked", target.id))
                    .detail("account_id", target.id.as_str())
                    .detail("reason", "administrative")
                    .origin(Some(session.audit_origin()))
                    .build(),
            );
        }

        Ok(guard_cleared || flag_cleared)
    }

    /// Set the directory lock flag and end the account's sessions.
    ///
    /// Returns `Ok(false)` when the caller may not lock the account, the
    /// account does not exist, or it was already locked.
    pub fn lock_account(&self, admin_token: &str, account_id: &str) -> IdentityResult<bool> {
        let Some((session, admin, target)) = self.administer(admin_token, account_id) else {
            return Ok(false);
        };
        if target.locked {
            return Ok(false);
        }

        self.directory.set_locked(&target.id, true)?;

        warn!(account_id = %target.id, actor = %admin.id, "Account locked by administrator");
        self.audit.record(
            AuditEvent::builder(AuditAction::AccountLocked, admin.id.as_str())
                .severity(AuditSeverity::Warning)
                .description(format!("Account {} locked", target.id))
                .detail("account_id", target.id.as_str())
                .detail("reason", "administrative")
                .origin(Some(session.audit_origin()))
                .build(),
        );

        self.sessions.invalidate_account_sessions(&target.id);
        Ok(true)
    }

    /// Latest audit entries, newest first, for holders of `AUDIT_VIEW`.
    ///
    /// `None` when the caller lacks the capability.
    pub fn audit_recent(&self, token: &str, limit: Option<usize>) -> Option<Vec<AuditEntry>> {
        if !self.authorize(token, AUDIT_VIEW) {
            return None;
        }
        Some(
            self.audit
                .recent(limit.unwrap_or(self.config.audit.recent_default)),
        )
    }

    /// Drop expired sessions and lapsed locks. Returns `(sessions, locks)`.
    pub fn purge_expired(&self) -> (usize, usize) {
        (self.sessions.purge_expired(), self.lockout.purge_expired())
    }
}
