//! Audit statistics and reporting queries.

use bastion_audit::{AuditAction, AuditDetails, AuditLog, AuditSeverity};
use proptest::prelude::*;

use crate::test_utils::*;

#[test]
fn test_statistics_after_mixed_activity() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    system.fail_logins("alice", 5)?;
    system.login("bob", BOB_SECRET)?;

    let stats = system.audit.statistics();
    assert_eq!(stats.total_entries, system.audit.len());
    assert_eq!(stats.unique_actors, 2);
    assert_eq!(stats.count_for_action(AuditAction::LoginFailure), 5);
    assert_eq!(stats.count_for_action(AuditAction::AccountLocked), 1);
    // five failures plus the lock
    assert_eq!(stats.alert_count(), 6);
    assert_eq!(stats.count_for(AuditSeverity::Info), 2);
    Ok(())
}

#[test]
fn test_export_is_json_array() -> anyhow::Result<()> {
    let system = TestSystem::new()?;
    system.login("alice", ALICE_SECRET)?;

    let exported: serde_json::Value = serde_json::from_str(&system.audit.export_json()?)?;
    let entries = exported
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("export is not an array"))?;
    assert_eq!(entries.len(), system.audit.len());
    assert_eq!(entries[0]["sequence"], 1);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_statistics_count_entries_and_actors(n in 1usize..200, m in 1usize..20) {
        let log = AuditLog::new();
        let actors = m.min(n);
        for i in 0..n {
            let actor = format!("actor-{}", i % actors);
            log.append(
                AuditAction::SystemEvent,
                AuditSeverity::Info,
                &actor,
                "tick",
                AuditDetails::new(),
            );
        }

        let stats = log.statistics();
        prop_assert_eq!(stats.total_entries, n);
        prop_assert_eq!(stats.unique_actors, actors);
        prop_assert_eq!(log.recent(n)[0].sequence, n as u64);
    }
}
