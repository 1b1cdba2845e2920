//! Administrator flows and session lifecycle.

use bastion_audit::{AuditAction, AuditOrigin};
use bastion_identity::capabilities::{AUDIT_VIEW, READ_PROFILE, USER_MANAGEMENT};
use bastion_identity::{PasswordChange, PasswordChangeRejection, PolicySeverity};

use crate::test_utils::*;

#[test]
fn test_bob_admin_session_lifecycle() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    let token = system.login("bob", BOB_SECRET)?;

    let session = system
        .service
        .validate_session(&token)
        .ok_or_else(|| anyhow::anyhow!("session missing"))?;
    assert_eq!(session.account_id, BOB_ID);

    let bob = system.account(BOB_ID)?;
    assert!(system.service.permissions().has_permission(Some(&bob), USER_MANAGEMENT));
    assert!(system.service.authorize(&token, USER_MANAGEMENT));

    assert!(system.service.sessions().invalidate_session(&token));
    assert!(system.service.validate_session(&token).is_none());
    assert!(!system.service.authorize(&token, USER_MANAGEMENT));
    Ok(())
}

#[test]
fn test_admin_unlocks_locked_user() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    system.fail_logins("alice", 5)?;
    let admin = system.login("bob", BOB_SECRET)?;

    assert!(system.service.unlock_account(&admin, ALICE_ID)?);
    assert_eq!(system.account(ALICE_ID)?.failed_attempts, 0);
    system.login("alice", ALICE_SECRET)?;

    // nothing left to unlock
    assert!(!system.service.unlock_account(&admin, ALICE_ID)?);
    Ok(())
}

#[test]
fn test_brute_force_lock_revokes_authorization() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    let alice = system.login("alice", ALICE_SECRET)?;
    assert!(system.service.authorize(&alice, READ_PROFILE));

    system.fail_logins("alice", 5)?;
    assert!(system.service.validate_session(&alice).is_some());
    assert!(!system.service.authorize(&alice, READ_PROFILE));
    assert!(matches!(
        system.service.change_password(&alice, ALICE_SECRET, "looking-glass42")?,
        PasswordChange::Rejected(PasswordChangeRejection::NotPermitted)
    ));

    let admin = system.login("bob", BOB_SECRET)?;
    assert!(system.service.unlock_account(&admin, ALICE_ID)?);
    assert!(system.service.authorize(&alice, READ_PROFILE));
    Ok(())
}

#[test]
fn test_admin_actions_on_unknown_account_are_denied() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    let admin = system.login("bob", BOB_SECRET)?;

    assert!(!system.service.unlock_account(&admin, "u-missing")?);
    assert!(!system.service.lock_account(&admin, "u-missing")?);

    let denied = system.audit.by_action(AuditAction::PermissionDenied);
    assert_eq!(denied.len(), 2);
    assert!(denied.iter().all(|entry| {
        entry.details.get("reason").and_then(|v| v.as_str()) == Some("unknown_account")
    }));
    Ok(())
}

#[test]
fn test_moderator_locks_user_and_sessions_end() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    let alice = system.login("alice", ALICE_SECRET)?;
    let maya = system.login("maya", MAYA_SECRET)?;

    assert!(system.service.lock_account(&maya, ALICE_ID)?);
    assert!(system.service.validate_session(&alice).is_none());
    assert!(system.login("alice", ALICE_SECRET).is_err());

    assert!(!system.service.lock_account(&maya, BOB_ID)?);
    assert!(!system.service.lock_account(&alice, MAYA_ID)?);
    Ok(())
}

#[test]
fn test_user_cannot_read_audit() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    let alice = system.login("alice", ALICE_SECRET)?;
    let maya = system.login("maya", MAYA_SECRET)?;

    assert!(system.service.authorize(&alice, READ_PROFILE));
    assert!(!system.service.authorize(&alice, AUDIT_VIEW));
    assert!(system.service.audit_recent(&alice, None).is_none());

    let entries = system
        .service
        .audit_recent(&maya, None)
        .ok_or_else(|| anyhow::anyhow!("moderator denied"))?;
    assert!(!entries.is_empty());
    assert!(entries.len() <= system.service.config().audit.recent_default);
    Ok(())
}

#[test]
fn test_password_change_round_trip() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    let token = system.login("alice", ALICE_SECRET)?;

    let weak = system.service.change_password(&token, ALICE_SECRET, "short")?;
    assert!(matches!(
        weak,
        PasswordChange::Rejected(PasswordChangeRejection::PolicyViolation(_))
    ));

    match system.service.change_password(&token, ALICE_SECRET, "rabbithole")? {
        PasswordChange::Changed(verdict) => assert_eq!(verdict.severity, PolicySeverity::Warning),
        other => anyhow::bail!("unexpected outcome {:?}", other),
    }

    assert!(system.service.logout(&token));
    assert!(system.login("alice", ALICE_SECRET).is_err());
    system.login("alice", "rabbithole")?;
    Ok(())
}

#[test]
fn test_session_audit_uses_fingerprint() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    let origin = AuditOrigin::new().ip("198.51.100.4").client("desk");
    let outcome = system.service.authenticate("alice", ALICE_SECRET, Some(origin))?;
    let token = outcome
        .token()
        .ok_or_else(|| anyhow::anyhow!("login failed"))?
        .to_string();
    system.service.authorize(&token, READ_PROFILE);
    system.service.logout(&token);

    let fingerprint = &token[..8];
    let tagged = system.audit.by_session(fingerprint);
    let actions: Vec<AuditAction> = tagged.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::SessionCreated,
            AuditAction::PermissionGranted,
            AuditAction::Logout
        ]
    );

    let exported = system.audit.export_json()?;
    assert!(!exported.contains(&token));
    Ok(())
}
