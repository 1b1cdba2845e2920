//! Concurrent callers against one service.

use std::collections::HashSet;
use std::sync::Arc;

use bastion_audit::{AuditAction, AuditDetails, AuditLog, AuditSeverity};
use bastion_core::LockoutConfig;
use bastion_identity::{Account, LockoutGuard, Role, SessionStore};

use crate::test_utils::*;

#[test]
fn test_parallel_logins_issue_distinct_tokens() -> anyhow::Result<()> {
    let system = TestSystem::new()?;

    let tokens: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| s.spawn(|| system.login("bob", BOB_SECRET)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow::anyhow!("login thread panicked"))?)
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let unique: HashSet<&String> = tokens.iter().collect();
    assert_eq!(unique.len(), 16);
    assert_eq!(system.service.sessions().active_count(), 16);
    assert_eq!(system.audit.by_action(AuditAction::LoginSuccess).len(), 16);
    tracing::info!(sessions = tokens.len(), "parallel logins complete");
    Ok(())
}

#[test]
fn test_parallel_failures_lock_once() -> anyhow::Result<()> {
    let system = TestSystem::new()?;

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| system.fail_logins("alice", 5));
        }
    });

    assert!(system.service.lockout().is_locked(ALICE_ID));
    assert_eq!(system.audit.by_action(AuditAction::AccountLocked).len(), 1);
    // each attempt is either a counted failure or blocked, never both
    let failures = system.audit.by_action(AuditAction::LoginFailure).len();
    let blocked = system.audit.by_action(AuditAction::LoginBlocked).len();
    assert_eq!(failures + blocked, 20);
    assert!(failures >= 5);
    Ok(())
}

#[test]
fn test_guard_counts_every_failure() {
    let audit = Arc::new(AuditLog::new());
    let guard = LockoutGuard::new(LockoutConfig::default(), Arc::clone(&audit));
    let now = 1_700_000_000_000;

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..25 {
                    guard.record_failure_at("u-target", now);
                }
            });
        }
    });

    assert_eq!(guard.failed_attempts("u-target"), 200);
    assert_eq!(audit.by_action(AuditAction::AccountLocked).len(), 1);
}

#[test]
fn test_sessions_and_audit_under_load() {
    let audit = Arc::new(AuditLog::new());
    let store = SessionStore::new(Default::default(), Arc::clone(&audit));
    let account = Account::with_password("u-load", "load", "loadtest1", Role::User);

    std::thread::scope(|s| {
        for worker in 0..8 {
            let store = &store;
            let account = &account;
            let audit = &audit;
            s.spawn(move || {
                for _ in 0..50 {
                    if let Ok(token) = store.create_session(account) {
                        assert!(store.validate_session(&token).is_some());
                        assert!(store.invalidate_session(&token));
                    }
                    audit.append(
                        AuditAction::SystemEvent,
                        AuditSeverity::Info,
                        &format!("worker-{}", worker),
                        "heartbeat",
                        AuditDetails::new(),
                    );
                }
            });
        }
    });

    assert_eq!(store.active_count(), 0);
    // created + invalidated + heartbeat per iteration
    assert_eq!(audit.len(), 8 * 50 * 3);
    let sequences: Vec<u64> = audit.recent(audit.len()).iter().rev().map(|e| e.sequence).collect();
    assert_eq!(sequences, (1..=1200).collect::<Vec<u64>>());
}
