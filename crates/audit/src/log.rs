//! Append-only audit log.
//!
//! # Atomicity
//!
//! - `append`/`record`: id, sequence number and timestamp are assigned and the
//!   entry pushed under one write lock, so concurrent appends never interleave
//!   or lose entries, and `sequence` matches position in the log.
//! - Queries take a read lock and clone what they return. They never observe a
//!   partially written entry and never mutate the log.
//!
//! A poisoned lock is recovered rather than propagated: a panic elsewhere must
//! not stop the security trail from recording.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bastion_core::current_timestamp_ms;
use tracing::debug;
use uuid::Uuid;

use crate::entry::{
    AuditAction, AuditDetails, AuditEntry, AuditEvent, AuditId, AuditSeverity,
};
use crate::stats::AuditStatistics;

/// Thread-safe, in-memory, append-only event store.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<AuditEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<AuditEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an entry. Always succeeds.
    pub fn append(
        &self,
        action: AuditAction,
        severity: AuditSeverity,
        actor: &str,
        description: &str,
        details: AuditDetails,
    ) -> AuditId {
        self.record(AuditEvent {
            action,
            severity,
            actor: actor.to_string(),
            description: description.to_string(),
            details,
            origin: None,
        })
    }

    /// Append a prepared event, keeping its origin metadata.
    pub fn record(&self, event: AuditEvent) -> AuditId {
        self.record_at(event, current_timestamp_ms())
    }

    /// Append with an explicit timestamp (Unix epoch milliseconds).
    pub fn record_at(&self, event: AuditEvent, timestamp: u64) -> AuditId {
        let id = Uuid::new_v4().to_string();
        let sequence = {
            let mut entries = self.write();
            let sequence = entries.len() as u64 + 1;
            entries.push(AuditEntry {
                id: id.clone(),
                sequence,
                action: event.action,
                severity: event.severity,
                actor: event.actor,
                description: event.description,
                details: event.details,
                timestamp,
                origin: event.origin,
            });
            sequence
        };

        debug!(
            audit_id = %id,
            sequence,
            action = %event.action,
            severity = %event.severity,
            "Audit entry appended"
        );
        id
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Look up a single entry.
    pub fn get(&self, id: &str) -> Option<AuditEntry> {
        self.read().iter().find(|e| e.id == id).cloned()
    }

    fn filtered<F>(&self, predicate: F) -> Vec<AuditEntry>
    where
        F: Fn(&AuditEntry) -> bool,
    {
        self.read().iter().filter(|e| predicate(e)).cloned().collect()
    }

    /// Entries caused by `actor`, oldest first.
    pub fn by_actor(&self, actor: &str) -> Vec<AuditEntry> {
        self.filtered(|e| e.actor == actor)
    }

    /// Entries of one action kind, oldest first.
    pub fn by_action(&self, action: AuditAction) -> Vec<AuditEntry> {
        self.filtered(|e| e.action == action)
    }

    /// Entries at `min` severity or above, oldest first.
    pub fn by_min_severity(&self, min: AuditSeverity) -> Vec<AuditEntry> {
        self.filtered(|e| e.severity >= min)
    }

    /// Entries whose origin names `session_id`.
    pub fn by_session(&self, session_id: &str) -> Vec<AuditEntry> {
        self.filtered(|e| {
            e.origin
                .as_ref()
                .and_then(|o| o.session_id.as_deref())
                .map(|sid| sid == session_id)
                .unwrap_or(false)
        })
    }

    /// Entries with `from_ms <= timestamp <= to_ms`.
    pub fn between(&self, from_ms: u64, to_ms: u64) -> Vec<AuditEntry> {
        self.filtered(|e| e.timestamp >= from_ms && e.timestamp <= to_ms)
    }

    /// The `n` most recently appended entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<AuditEntry> {
        self.read().iter().rev().take(n).cloned().collect()
    }

    /// Aggregate counts over the whole log.
    pub fn statistics(&self) -> AuditStatistics {
        let entries = self.read();
        let mut actors: HashSet<&str> = HashSet::new();
        let mut by_severity: HashMap<AuditSeverity, usize> =
            AuditSeverity::all().into_iter().map(|s| (s, 0)).collect();
        let mut by_action: HashMap<AuditAction, usize> = HashMap::new();

        for entry in entries.iter() {
            actors.insert(entry.actor.as_str());
            *by_severity.entry(entry.severity).or_insert(0) += 1;
            *by_action.entry(entry.action).or_insert(0) += 1;
        }

        AuditStatistics {
            total_entries: entries.len(),
            unique_actors: actors.len(),
            by_severity,
            by_action,
            first_timestamp: entries.first().map(|e| e.timestamp),
            last_timestamp: entries.last().map(|e| e.timestamp),
        }
    }

    /// Snapshot of the log as a JSON array, oldest first.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let entries = self.read();
        serde_json::to_string_pretty(&*entries)
    }
}
