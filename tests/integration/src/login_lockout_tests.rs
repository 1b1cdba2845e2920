//! Login and brute-force lockout scenarios.

use bastion_audit::{AuditAction, AuditSeverity};
use bastion_core::{current_timestamp_ms, LockoutConfig, SecurityConfig};
use bastion_identity::{LockoutState, RejectionReason};

use crate::test_utils::*;

#[test]
fn test_alice_locked_on_fifth_failure() -> anyhow::Result<()> {
    let system = TestSystem::new()?;

    system.fail_logins("alice", 4)?;
    assert!(!system.service.lockout().is_locked(ALICE_ID));
    assert_eq!(system.account(ALICE_ID)?.failed_attempts, 4);

    system.fail_logins("alice", 1)?;
    assert!(system.service.lockout().is_locked(ALICE_ID));
    assert_eq!(system.audit.by_action(AuditAction::AccountLocked).len(), 1);
    assert_eq!(system.audit.by_action(AuditAction::LoginFailure).len(), 5);

    // correct secret while locked: rejected, no session, one more alert
    let alerts_before = system.audit.by_min_severity(AuditSeverity::Warning).len();
    let total_before = system.audit.len();
    let outcome = system.service.authenticate("alice", ALICE_SECRET, None)?;

    assert_eq!(outcome.rejection(), Some(RejectionReason::AccountLocked));
    assert_eq!(system.service.sessions().active_count(), 0);
    assert_eq!(
        system.audit.by_min_severity(AuditSeverity::Warning).len(),
        alerts_before + 1
    );
    assert_eq!(system.audit.len(), total_before + 1);
    assert_eq!(system.audit.recent(1)[0].action, AuditAction::LoginBlocked);
    Ok(())
}

#[test]
fn test_success_resets_counter() -> anyhow::Result<()> {
    let system = TestSystem::new()?;

    system.fail_logins("alice", 4)?;
    system.login("alice", ALICE_SECRET)?;
    assert_eq!(system.account(ALICE_ID)?.failed_attempts, 0);
    assert_eq!(system.service.lockout().state(ALICE_ID), LockoutState::Clear);

    // the counter starts over: four more failures still do not lock
    system.fail_logins("alice", 4)?;
    assert!(!system.service.lockout().is_locked(ALICE_ID));
    Ok(())
}

#[test]
fn test_lock_self_heals_after_window() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    system.fail_logins("alice", 5)?;

    let guard = system.service.lockout();
    let window_ms = guard.config().lockout_duration_ms();
    let later = current_timestamp_ms() + window_ms + 1_000;

    assert!(guard.lock_remaining(ALICE_ID).is_some());
    assert!(!guard.is_locked_at(ALICE_ID, later));

    let unlocks = system.audit.by_action(AuditAction::AccountUnlocked);
    assert_eq!(unlocks.len(), 1);
    assert_eq!(unlocks[0].severity, AuditSeverity::Info);

    system.login("alice", ALICE_SECRET)?;
    Ok(())
}

#[test]
fn test_short_window_from_config() -> anyhow::Result<()> {
    let config = SecurityConfig {
        lockout: LockoutConfig {
            max_failed_attempts: 3,
            lockout_duration_secs: 120,
        },
        ..SecurityConfig::default()
    };
    let system = TestSystem::with_config(config)?;

    system.fail_logins("alice", 3)?;
    assert!(system.service.lockout().is_locked(ALICE_ID));
    assert_eq!(system.service.lockout().remaining_attempts(ALICE_ID), 0);
    Ok(())
}

#[test]
fn test_lockout_is_per_account() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    system.fail_logins("alice", 5)?;

    system.login("bob", BOB_SECRET)?;
    system.login("maya", MAYA_SECRET)?;
    assert_eq!(system.service.lockout().locked_accounts(), vec![ALICE_ID.to_string()]);
    Ok(())
}

#[test]
fn test_unknown_user_never_locks() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    for _ in 0..10 {
        let outcome = system.service.authenticate("mallory", "guess123", None)?;
        assert_eq!(outcome.rejection(), Some(RejectionReason::UnknownAccount));
    }
    assert!(system.service.lockout().locked_accounts().is_empty());
    assert_eq!(system.audit.by_actor("mallory").len(), 10);
    Ok(())
}

#[test]
fn test_username_lookup_ignores_case() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    system.login("ALICE", ALICE_SECRET)?;
    Ok(())
}
