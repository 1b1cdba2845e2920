//! Aggregate statistics over the audit log.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entry::{AuditAction, AuditSeverity};

/// Snapshot of audit log counters, computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_entries: usize,
    /// Distinct `actor` values
    pub unique_actors: usize,
    /// Every severity is present, zero when unused
    pub by_severity: HashMap<AuditSeverity, usize>,
    pub by_action: HashMap<AuditAction, usize>,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
}

impl AuditStatistics {
    pub fn count_for(&self, severity: AuditSeverity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn count_for_action(&self, action: AuditAction) -> usize {
        self.by_action.get(&action).copied().unwrap_or(0)
    }

    /// Entries at Warning or above.
    pub fn alert_count(&self) -> usize {
        self.by_severity
            .iter()
            .filter(|(severity, _)| **severity >= AuditSeverity::Warning)
            .map(|(_, count)| *count)
            .sum()
    }
}
