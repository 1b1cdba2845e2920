//! Audit entry schema.
//!
//! Every security-relevant event becomes one immutable [`AuditEntry`]. Entries
//! carry the acting identity, a severity, a machine-readable action kind, a
//! human-readable description and free-form structured details.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of an audit entry (UUID v4, hyphenated).
pub type AuditId = String;

/// Severity level for audit entries. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuditSeverity {
    /// Informational event
    Info,
    /// Warning condition
    Warning,
    /// Error condition
    Error,
    /// Critical security event
    Critical,
}

impl AuditSeverity {
    pub fn all() -> [AuditSeverity; 4] {
        [
            AuditSeverity::Info,
            AuditSeverity::Warning,
            AuditSeverity::Error,
            AuditSeverity::Critical,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARNING",
            AuditSeverity::Error => "ERROR",
            AuditSeverity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    LoginSuccess,
    LoginFailure,
    /// Attempt rejected before credential comparison (locked or inactive account)
    LoginBlocked,
    Logout,
    AccountLocked,
    AccountUnlocked,
    SessionCreated,
    SessionExpired,
    SessionInvalidated,
    PermissionGranted,
    PermissionDenied,
    PasswordChanged,
    PasswordChangeRejected,
    UserCreated,
    UserUpdated,
    UserDeleted,
    ConfigurationChanged,
    BackupCreated,
    SystemEvent,
}

impl AuditAction {
    /// Stable dotted name, used in exports and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginSuccess => "auth.login_success",
            AuditAction::LoginFailure => "auth.login_failure",
            AuditAction::LoginBlocked => "auth.login_blocked",
            AuditAction::Logout => "auth.logout",
            AuditAction::AccountLocked => "lockout.locked",
            AuditAction::AccountUnlocked => "lockout.unlocked",
            AuditAction::SessionCreated => "session.created",
            AuditAction::SessionExpired => "session.expired",
            AuditAction::SessionInvalidated => "session.invalidated",
            AuditAction::PermissionGranted => "access.granted",
            AuditAction::PermissionDenied => "access.denied",
            AuditAction::PasswordChanged => "account.password_changed",
            AuditAction::PasswordChangeRejected => "account.password_change_rejected",
            AuditAction::UserCreated => "account.created",
            AuditAction::UserUpdated => "account.updated",
            AuditAction::UserDeleted => "account.deleted",
            AuditAction::ConfigurationChanged => "system.config_changed",
            AuditAction::BackupCreated => "system.backup_created",
            AuditAction::SystemEvent => "system.event",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a request came from, when the presentation layer knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOrigin {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AuditOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ip_address.is_none() && self.client.is_none() && self.session_id.is_none()
    }
}

/// Structured details attached to an entry. Key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(flatten)]
    pub data: HashMap<String, serde_json::Value>,
}

impl AuditDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key-value pair.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AuditDetails
where
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut details = AuditDetails::new();
        for (k, v) in iter {
            details.insert(k, v);
        }
        details
    }
}

/// An immutable, stored audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier
    pub id: AuditId,
    /// Position in append order, starting at 1
    pub sequence: u64,
    pub action: AuditAction,
    pub severity: AuditSeverity,
    /// Identity that caused the event (account id, username, or a system label)
    pub actor: String,
    /// Human-readable message
    pub description: String,
    pub details: AuditDetails,
    /// Timestamp (Unix epoch milliseconds)
    pub timestamp: u64,
    #[serde(default)]
    pub origin: Option<AuditOrigin>,
}

/// An event not yet appended to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub severity: AuditSeverity,
    pub actor: String,
    pub description: String,
    pub details: AuditDetails,
    pub origin: Option<AuditOrigin>,
}

impl AuditEvent {
    /// Start building an event. Severity defaults to `Info`.
    pub fn builder(action: AuditAction, actor: impl Into<String>) -> AuditEventBuilder {
        AuditEventBuilder {
            event: AuditEvent {
                action,
                severity: AuditSeverity::Info,
                actor: actor.into(),
                description: String::new(),
                details: AuditDetails::new(),
                origin: None,
            },
        }
    }
}

/// Builder for [`AuditEvent`].
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.event.severity = severity;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.event.description = description.into();
        self
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.event.details.insert(key, value);
        self
    }

    pub fn details(mut self, details: AuditDetails) -> Self {
        self.event.details.data.extend(details.data);
        self
    }

    /// Attach origin metadata; an empty origin is dropped.
    pub fn origin(mut self, origin: Option<AuditOrigin>) -> Self {
        self.event.origin = origin.filter(|o| !o.is_empty());
        self
    }

    pub fn build(self) -> AuditEvent {
        self.event
    }
}
