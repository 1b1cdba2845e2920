//! Session store.
//!
//! Sessions are keyed by an opaque random token and expire a fixed time after
//! creation. Access refreshes `last_accessed_at` for reporting but never
//! extends the lifetime. Expiry is lazy: a session is removed when it is next
//! looked up, or by an explicit `purge_expired`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bastion_audit::{AuditAction, AuditEvent, AuditLog, AuditOrigin, AuditSeverity};
use bastion_core::{current_timestamp_ms, SessionConfig};
use bastion_crypto::{
    check_token_format, generate_token, token_fingerprint, CryptoError, CryptoResult,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::role::Role;

/// Opaque bearer token, 64 hex characters.
pub type SessionToken = String;

/// Fresh tokens tried before giving up on the entropy source.
const MAX_TOKEN_ATTEMPTS: usize = 4;

/// An authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub token: SessionToken,
    pub account_id: String,
    pub username: String,
    /// Role at login time
    pub role: Role,
    /// Timestamp of creation (Unix epoch milliseconds)
    pub created_at: u64,
    pub last_accessed_at: u64,
    pub origin: Option<AuditOrigin>,
}

impl Session {
    /// Short token prefix, safe for logs and audit entries.
    pub fn fingerprint(&self) -> &str {
        token_fingerprint(&self.token)
    }

    pub fn expires_at(&self, timeout_ms: u64) -> u64 {
        self.created_at.saturating_add(timeout_ms)
    }

    /// Login origin plus the token fingerprint, never the token itself.
    pub fn audit_origin(&self) -> AuditOrigin {
        self.origin
            .clone()
            .unwrap_or_default()
            .session(self.fingerprint())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &format_args!("{}…", self.fingerprint()))
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("last_accessed_at", &self.last_accessed_at)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Why a session left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Expired,
    Invalidated,
    Logout,
}

impl SessionEnd {
    fn action(self) -> AuditAction {
        match self {
            SessionEnd::Expired => AuditAction::SessionExpired,
            SessionEnd::Invalidated => AuditAction::SessionInvalidated,
            SessionEnd::Logout => AuditAction::Logout,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            SessionEnd::Expired => "Session expired",
            SessionEnd::Invalidated => "Session invalidated",
            SessionEnd::Logout => "User logged out",
        }
    }
}

pub struct SessionStore {
    config: SessionConfig,
    sessions: RwLock<HashMap<SessionToken, Session>>,
    audit: Arc<AuditLog>,
}

impl SessionStore {
    pub fn new(config: SessionConfig, audit: Arc<AuditLog>) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            audit,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionToken, Session>> {
        self.sessions.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionToken, Session>> {
        self.sessions.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, session: &Session, now_ms: u64) -> bool {
        now_ms.saturating_sub(session.created_at) > self.config.timeout_ms()
    }

    /// Issue a session for an already authenticated account.
    pub fn create_session(&self, account: &Account) -> CryptoResult<SessionToken> {
        self.create_session_at(account, None, current_timestamp_ms())
    }

    /// Issue a session, remembering where the login came from.
    pub fn create_session_with(
        &self,
        account: &Account,
        origin: Option<AuditOrigin>,
    ) -> CryptoResult<SessionToken> {
        self.create_session_at(account, origin, current_timestamp_ms())
    }

    pub fn create_session_at(
        &self,
        account: &Account,
        origin: Option<AuditOrigin>,
        now_ms: u64,
    ) -> CryptoResult<SessionToken> {
        let origin = origin.filter(|o| !o.is_empty());

        let session = {
            let mut sessions = self.write();
            let mut issued = None;
            for _ in 0..MAX_TOKEN_ATTEMPTS {
                let token = generate_token()?;
                if sessions.contains_key(&token) {
                    warn!("Session token collision, regenerating");
                    continue;
                }
                let session = Session {
                    token: token.clone(),
                    account_id: account.id.clone(),
                    username: account.username.clone(),
                    role: account.role,
                    created_at: now_ms,
                    last_accessed_at: now_ms,
                    origin: origin.clone(),
                };
                sessions.insert(token, session.clone());
                issued = Some(session);
                break;
            }
            issued.ok_or_else(|| {
                CryptoError::EntropyUnavailable(
                    "repeated session token collisions".to_string(),
                )
            })?
        };

        info!(
            account_id = %session.account_id,
            session = %session.fingerprint(),
            "Session created"
        );
        self.audit.record_at(
            AuditEvent::builder(AuditAction::SessionCreated, session.account_id.as_str())
                .description(format!("Session created for {}", session.username))
                .detail("expires_at", session.expires_at(self.config.timeout_ms()))
                .origin(Some(session.audit_origin()))
                .build(),
            now_ms,
        );

        Ok(session.token)
    }

    /// Resolve a token to its session.
    ///
    /// Returns `None` for unknown, malformed or expired tokens; an expired
    /// session is removed on the way.
    pub fn validate_session(&self, token: &str) -> Option<Session> {
        self.validate_session_at(token, current_timestamp_ms())
    }

    pub fn validate_session_at(&self, token: &str, now_ms: u64) -> Option<Session> {
        if check_token_format(token).is_err() {
            debug!("Rejected malformed session token");
            return None;
        }

        let expired = {
            let mut sessions = self.write();
            let session = sessions.get_mut(token)?;
            if self.is_expired(session, now_ms) {
                sessions.remove(token)
            } else {
                session.last_accessed_at = now_ms;
                return Some(session.clone());
            }
        };

        if let Some(session) = expired {
            self.audit_end(&session, SessionEnd::Expired, now_ms);
        }
        None
    }

    /// Remove a session. Returns false if it did not exist.
    pub fn invalidate_session(&self, token: &str) -> bool {
        self.remove(token, SessionEnd::Invalidated).is_some()
    }

    /// Remove a session at the holder's request.
    pub fn end_session(&self, token: &str) -> Option<Session> {
        self.remove(token, SessionEnd::Logout)
    }

    fn remove(&self, token: &str, reason: SessionEnd) -> Option<Session> {
        let removed = self.write().remove(token)?;
        self.audit_end(&removed, reason, current_timestamp_ms());
        Some(removed)
    }

    /// Drop every session owned by the account. Returns how many.
    pub fn invalidate_account_sessions(&self, account_id: &str) -> usize {
        let removed: Vec<Session> = {
            let mut sessions = self.write();
            let tokens: Vec<SessionToken> = sessions
                .values()
                .filter(|s| s.account_id == account_id)
                .map(|s| s.token.clone())
                .collect();
            tokens.iter().filter_map(|t| sessions.remove(t)).collect()
        };

        let now_ms = current_timestamp_ms();
        for session in &removed {
            self.audit_end(session, SessionEnd::Invalidated, now_ms);
        }
        removed.len()
    }

    /// Live sessions of one account, oldest first. Expired ones are skipped.
    pub fn sessions_for_account_at(&self, account_id: &str, now_ms: u64) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .read()
            .values()
            .filter(|s| s.account_id == account_id && !self.is_expired(s, now_ms))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub fn sessions_for_account(&self, account_id: &str) -> Vec<Session> {
        self.sessions_for_account_at(account_id, current_timestamp_ms())
    }

    /// Sessions currently stored, including expired ones not yet purged.
    pub fn active_count(&self) -> usize {
        self.read().len()
    }

    /// Remove every expired session. Returns how many.
    pub fn purge_expired_at(&self, now_ms: u64) -> usize {
        let expired: Vec<Session> = {
            let mut sessions = self.write();
            let tokens: Vec<SessionToken> = sessions
                .values()
                .filter(|s| self.is_expired(s, now_ms))
                .map(|s| s.token.clone())
                .collect();
            tokens.iter().filter_map(|t| sessions.remove(t)).collect()
        };

        for session in &expired {
            self.audit_end(session, SessionEnd::Expired, now_ms);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Purged expired sessions");
        }
        expired.len()
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(current_timestamp_ms())
    }

    fn audit_end(&self, session: &Session, reason: SessionEnd, now_ms: u64) {
        info!(
            account_id = %session.account_id,
            session = %session.fingerprint(),
            action = %reason.action(),
            "Session ended"
        );
        self.audit.record_at(
            AuditEvent::builder(reason.action(), session.account_id.as_str())
                .severity(AuditSeverity::Info)
                .description(format!("{} for {}", reason.describe(), session.username))
                .detail("age_ms", now_ms.saturating_sub(session.created_at))
                .origin(Some(session.audit_origin()))
                .build(),
            now_ms,
        );
    }
}
