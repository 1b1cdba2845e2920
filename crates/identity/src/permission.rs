//! Capability and level checks over accounts.
//!
//! Pure functions of the account and the role table: no state, no audit, no
//! logging. Decisions are logged by the caller that acts on them.

use crate::account::Account;
use crate::role::capabilities::USER_MANAGEMENT;

/// Stateless authorization checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEngine;

impl PermissionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Missing, inactive and administratively locked accounts hold nothing.
    pub fn has_permission(&self, account: Option<&Account>, capability: &str) -> bool {
        match account {
            Some(account) if account.is_usable() => account.role.has_capability(capability),
            _ => false,
        }
    }

    /// Level gate for resources classified by a minimum role level.
    ///
    /// Only a missing account is refused outright; the account's flags are
    /// the caller's concern here.
    pub fn can_access_resource(&self, account: Option<&Account>, required_level: u8) -> bool {
        account
            .map(|account| account.role.level() >= required_level)
            .unwrap_or(false)
    }

    /// Whether `actor` may administer `target`.
    pub fn can_manage(&self, actor: Option<&Account>, target: &Account) -> bool {
        match actor {
            Some(actor) => {
                self.has_permission(Some(actor), USER_MANAGEMENT)
                    && actor.role.can_manage(target.role)
            }
            None => false,
        }
    }

    /// Declared capabilities of a usable account; empty otherwise.
    pub fn effective_capabilities(&self, account: Option<&Account>) -> Vec<&'static str> {
        match account {
            Some(account) if account.is_usable() => account.role.capabilities().to_vec(),
            _ => Vec::new(),
        }
    }
}
