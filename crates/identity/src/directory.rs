//! User directory contract.
//!
//! The directory owns accounts; Bastion only reads them and writes back the
//! counters and flags its policies change. `InMemoryDirectory` is a complete
//! implementation for tests and for embedders without a backing store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::account::Account;
use crate::error::DirectoryError;

/// Account lookup and update, implemented by the embedding application.
pub trait UserDirectory: Send + Sync {
    fn find_by_id(&self, id: &str) -> Option<Account>;

    fn find_by_username(&self, username: &str) -> Option<Account>;

    /// Persist a mutated account. The account must already exist.
    fn update(&self, account: &Account) -> Result<(), DirectoryError>;

    /// Write back the failure counter alone, leaving every other field as
    /// currently stored.
    ///
    /// The default re-reads the account right before writing. Stores that
    /// can update a single field atomically should override it.
    fn update_failed_attempts(&self, id: &str, failed_attempts: u32) -> Result<(), DirectoryError> {
        let mut account = fetch(self, id)?;
        account.failed_attempts = failed_attempts;
        self.update(&account)
    }

    /// Set or clear the administrative lock flag alone.
    fn set_locked(&self, id: &str, locked: bool) -> Result<(), DirectoryError> {
        let mut account = fetch(self, id)?;
        account.locked = locked;
        self.update(&account)
    }

    /// Replace the stored verifier alone.
    fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<(), DirectoryError> {
        let mut account = fetch(self, id)?;
        account.password_hash = password_hash.to_string();
        self.update(&account)
    }
}

fn fetch<D: UserDirectory + ?Sized>(directory: &D, id: &str) -> Result<Account, DirectoryError> {
    directory.find_by_id(id).ok_or_else(|| DirectoryError::NotFound {
        account_id: id.to_string(),
    })
}

/// Directory backed by a map keyed on account id.
///
/// Username lookup is ASCII case-insensitive.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a fixed account list.
    pub fn with_accounts<I>(accounts: I) -> Result<Self, DirectoryError>
    where
        I: IntoIterator<Item = Account>,
    {
        let directory = Self::new();
        for account in accounts {
            directory.insert(account)?;
        }
        Ok(directory)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Account>> {
        self.accounts.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Account>> {
        self.accounts.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a new account. Ids and usernames must be unique.
    pub fn insert(&self, account: Account) -> Result<(), DirectoryError> {
        let mut accounts = self.write();
        if accounts.contains_key(&account.id) {
            return Err(DirectoryError::Duplicate(account.id));
        }
        if accounts
            .values()
            .any(|existing| existing.username.eq_ignore_ascii_case(&account.username))
        {
            return Err(DirectoryError::Duplicate(account.username));
        }
        debug!(account_id = %account.id, role = %account.role, "Account added to directory");
        accounts.insert(account.id.clone(), account);
        Ok(())
    }

    /// Apply `change` to the stored account under one write lock.
    fn modify<F>(&self, id: &str, change: F) -> Result<(), DirectoryError>
    where
        F: FnOnce(&mut Account),
    {
        match self.write().get_mut(id) {
            Some(account) => {
                change(account);
                Ok(())
            }
            None => Err(DirectoryError::NotFound {
                account_id: id.to_string(),
            }),
        }
    }

    pub fn remove(&self, id: &str) -> Option<Account> {
        self.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_id(&self, id: &str) -> Option<Account> {
        self.read().get(id).cloned()
    }

    fn find_by_username(&self, username: &str) -> Option<Account> {
        self.read()
            .values()
            .find(|account| account.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    fn update(&self, account: &Account) -> Result<(), DirectoryError> {
        let mut accounts = self.write();
        match accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(DirectoryError::NotFound {
                account_id: account.id.clone(),
            }),
        }
    }

    fn update_failed_attempts(&self, id: &str, failed_attempts: u32) -> Result<(), DirectoryError> {
        self.modify(id, |account| account.failed_attempts = failed_attempts)
    }

    fn set_locked(&self, id: &str, locked: bool) -> Result<(), DirectoryError> {
        self.modify(id, |account| account.locked = locked)
    }

    fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<(), DirectoryError> {
        self.modify(id, |account| account.password_hash = password_hash.to_string())
    }
}
