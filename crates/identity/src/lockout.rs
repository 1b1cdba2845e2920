//! Brute-force lockout guard.
//!
//! Tracks consecutive failed logins per account id and locks the account for
//! a fixed window once the threshold is reached.
//!
//! ```text
//! Clear --failure--> Warming(1..N-1) --Nth failure--> Locked
//!   ^                     |                              |
//!   +------ clear() ------+---- clear() / window elapsed-+
//! ```
//!
//! Every transition for one account id happens under the table's write lock,
//! so the locked/clear state a caller observes always reflects the most recent
//! completed `record_failure` or `clear`. Audit entries are written after the
//! lock is released.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use bastion_audit::{AuditAction, AuditEvent, AuditLog, AuditSeverity};
use bastion_core::{current_timestamp_ms, window_elapsed, LockoutConfig};
use tracing::{debug, info, warn};

/// Per-account failure bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutRecord {
    pub account_id: String,
    pub failed_attempts: u32,
    /// Set when the threshold was reached (Unix epoch milliseconds)
    pub locked_at: Option<u64>,
    pub last_failure_at: u64,
}

/// Observable state of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutState {
    Clear,
    Warming { failed_attempts: u32 },
    Locked { failed_attempts: u32, locked_until: u64 },
}

/// Outcome of recording one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutStatus {
    pub failed_attempts: u32,
    pub locked: bool,
    /// This failure crossed the threshold
    pub newly_locked: bool,
    /// Failures left before a lock; zero once locked
    pub remaining_attempts: u32,
}

enum UnlockReason {
    Expired,
    Cleared,
}

impl UnlockReason {
    fn as_str(&self) -> &'static str {
        match self {
            UnlockReason::Expired => "lock_expired",
            UnlockReason::Cleared => "cleared",
        }
    }
}

pub struct LockoutGuard {
    config: LockoutConfig,
    records: RwLock<HashMap<String, LockoutRecord>>,
    audit: Arc<AuditLog>,
}

impl LockoutGuard {
    pub fn new(config: LockoutConfig, audit: Arc<AuditLog>) -> Self {
        Self {
            config,
            records: RwLock::new(HashMap::new()),
            audit,
        }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, LockoutRecord>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, LockoutRecord>> {
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_expired(&self, record: &LockoutRecord, now_ms: u64) -> bool {
        record
            .locked_at
            .map(|locked_at| window_elapsed(locked_at, self.config.lockout_duration_ms(), now_ms))
            .unwrap_or(false)
    }

    /// Count one failed login.
    pub fn record_failure(&self, account_id: &str) -> LockoutStatus {
        self.record_failure_at(account_id, current_timestamp_ms())
    }

    pub fn record_failure_at(&self, account_id: &str, now_ms: u64) -> LockoutStatus {
        let threshold = self.config.max_failed_attempts;
        let mut healed = false;

        let status = {
            let mut records = self.write();
            let record = records
                .entry(account_id.to_string())
                .or_insert_with(|| LockoutRecord {
                    account_id: account_id.to_string(),
                    failed_attempts: 0,
                    locked_at: None,
                    last_failure_at: now_ms,
                });

            // A lapsed lock starts a fresh count rather than relocking at once.
            if self.lock_expired(record, now_ms) {
                record.failed_attempts = 0;
                record.locked_at = None;
                healed = true;
            }

            record.failed_attempts = record.failed_attempts.saturating_add(1);
            record.last_failure_at = now_ms;

            let newly_locked = record.locked_at.is_none() && record.failed_attempts >= threshold;
            if newly_locked {
                record.locked_at = Some(now_ms);
            }

            LockoutStatus {
                failed_attempts: record.failed_attempts,
                locked: record.locked_at.is_some(),
                newly_locked,
                remaining_attempts: threshold.saturating_sub(record.failed_attempts),
            }
        };

        if healed {
            self.audit_unlock(account_id, account_id, UnlockReason::Expired, now_ms);
        }

        if status.newly_locked {
            warn!(
                account_id = %account_id,
                failed_attempts = status.failed_attempts,
                lockout_secs = self.config.lockout_duration_secs,
                "Account locked after repeated failed logins"
            );
            self.audit.record_at(
                AuditEvent::builder(AuditAction::AccountLocked, account_id)
                    .severity(AuditSeverity::Warning)
                    .description(format!(
                        "Account locked after {} failed login attempts",
                        status.failed_attempts
                    ))
                    .detail("failed_attempts", status.failed_attempts)
                    .detail(
                        "locked_until",
                        now_ms.saturating_add(self.config.lockout_duration_ms()),
                    )
                    .build(),
                now_ms,
            );
        } else {
            debug!(
                account_id = %account_id,
                failed_attempts = status.failed_attempts,
                remaining = status.remaining_attempts,
                "Failed login recorded"
            );
        }

        status
    }

    /// Whether the account is inside an active lock window.
    ///
    /// A lock whose window has elapsed is cleared here and reported as open.
    pub fn is_locked(&self, account_id: &str) -> bool {
        self.is_locked_at(account_id, current_timestamp_ms())
    }

    pub fn is_locked_at(&self, account_id: &str, now_ms: u64) -> bool {
        {
            let records = self.read();
            match records.get(account_id) {
                None => return false,
                Some(record) if record.locked_at.is_none() => return false,
                Some(record) if !self.lock_expired(record, now_ms) => return true,
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, another caller may have
        // cleared or relocked in between.
        let removed = {
            let mut records = self.write();
            match records.get(account_id) {
                Some(record) if record.locked_at.is_some() => {
                    if self.lock_expired(record, now_ms) {
                        records.remove(account_id);
                        true
                    } else {
                        return true;
                    }
                }
                _ => false,
            }
        };

        if removed {
            self.audit_unlock(account_id, account_id, UnlockReason::Expired, now_ms);
        }
        false
    }

    /// Drop all failure state for the account (successful login).
    ///
    /// Returns true when an active lock was removed.
    pub fn clear(&self, account_id: &str) -> bool {
        self.clear_by(account_id, account_id)
    }

    /// Drop all failure state on behalf of `actor` (administrative unlock).
    pub fn clear_by(&self, account_id: &str, actor: &str) -> bool {
        let now_ms = current_timestamp_ms();
        let removed = self.write().remove(account_id);

        match removed {
            Some(record) if record.locked_at.is_some() => {
                self.audit_unlock(account_id, actor, UnlockReason::Cleared, now_ms);
                true
            }
            Some(_) => {
                debug!(account_id = %account_id, "Failure counter reset");
                false
            }
            None => false,
        }
    }

    fn audit_unlock(&self, account_id: &str, actor: &str, reason: UnlockReason, now_ms: u64) {
        info!(account_id = %account_id, reason = reason.as_str(), "Account unlocked");
        self.audit.record_at(
            AuditEvent::builder(AuditAction::AccountUnlocked, actor)
                .severity(AuditSeverity::Info)
                .description(format!("Account {} unlocked", account_id))
                .detail("account_id", account_id)
                .detail("reason", reason.as_str())
                .build(),
            now_ms,
        );
    }

    /// Consecutive failures currently counted for the account.
    pub fn failed_attempts(&self, account_id: &str) -> u32 {
        self.read()
            .get(account_id)
            .map(|r| r.failed_attempts)
            .unwrap_or(0)
    }

    pub fn remaining_attempts(&self, account_id: &str) -> u32 {
        self.config
            .max_failed_attempts
            .saturating_sub(self.failed_attempts(account_id))
    }

    /// Time left on an active lock, without clearing anything.
    pub fn lock_remaining_at(&self, account_id: &str, now_ms: u64) -> Option<Duration> {
        let records = self.read();
        let locked_at = records.get(account_id)?.locked_at?;
        let until = locked_at.saturating_add(self.config.lockout_duration_ms());
        (now_ms < until).then(|| Duration::from_millis(until - now_ms))
    }

    pub fn lock_remaining(&self, account_id: &str) -> Option<Duration> {
        self.lock_remaining_at(account_id, current_timestamp_ms())
    }

    /// Read-only view of the account's state. Never clears.
    pub fn state_at(&self, account_id: &str, now_ms: u64) -> LockoutState {
        let records = self.read();
        match records.get(account_id) {
            None => LockoutState::Clear,
            Some(record) => match record.locked_at {
                Some(locked_at) if !self.lock_expired(record, now_ms) => LockoutState::Locked {
                    failed_attempts: record.failed_attempts,
                    locked_until: locked_at.saturating_add(self.config.lockout_duration_ms()),
                },
                Some(_) => LockoutState::Clear,
                None => LockoutState::Warming {
                    failed_attempts: record.failed_attempts,
                },
            },
        }
    }

    pub fn state(&self, account_id: &str) -> LockoutState {
        self.state_at(account_id, current_timestamp_ms())
    }

    /// Accounts inside an active lock window.
    pub fn locked_accounts_at(&self, now_ms: u64) -> Vec<String> {
        let mut ids: Vec<String> = self
            .read()
            .values()
            .filter(|r| r.locked_at.is_some() && !self.lock_expired(r, now_ms))
            .map(|r| r.account_id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn locked_accounts(&self) -> Vec<String> {
        self.locked_accounts_at(current_timestamp_ms())
    }

    /// Remove every lock whose window has elapsed. Returns how many.
    pub fn purge_expired_at(&self, now_ms: u64) -> usize {
        let expired: Vec<String> = {
            let mut records = self.write();
            let expired: Vec<String> = records
                .values()
                .filter(|r| self.lock_expired(r, now_ms))
                .map(|r| r.account_id.clone())
                .collect();
            for id in &expired {
                records.remove(id);
            }
            expired
        };

        for id in &expired {
            self.audit_unlock(id, id, UnlockReason::Expired, now_ms);
        }
        expired.len()
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(current_timestamp_ms())
    }
}
