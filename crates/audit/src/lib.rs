//! Append-only audit trail for Bastion.
//!
//! Records every security-relevant event (logins, lockouts, session
//! lifecycle, authorization decisions) and answers reporting queries over
//! them. The log only ever appends; no entry is edited or removed.

pub mod entry;
pub mod log;
pub mod stats;

pub use entry::{
    AuditAction, AuditDetails, AuditEntry, AuditEvent, AuditEventBuilder, AuditId, AuditOrigin,
    AuditSeverity,
};
pub use log::AuditLog;
pub use stats::AuditStatistics;
