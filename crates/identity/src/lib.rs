//! Identity, authentication and authorization for Bastion.
//!
//! # Components
//!
//! - **Roles**: `Role` with a level and an explicit capability list
//! - **Password policy**: advisory strength verdicts
//! - **Lockout guard**: per-account brute-force lock with a fixed window
//! - **Session store**: random bearer tokens with a fixed lifetime
//! - **Permission engine**: stateless capability and level checks
//! - **AuthService**: the composition root that wires the above to a
//!   `UserDirectory` and the shared `AuditLog`
//!
//! # Security Model
//!
//! - Secrets are stored only as salted SHA-256 verifiers and compared in
//!   constant time
//! - Tokens never appear in logs or audit entries, only their fingerprint
//! - Missing, inactive or locked accounts are denied everything
//! - Every rejection and state transition is written to the audit log
//!
//! ```no_run
//! use std::sync::Arc;
//! use bastion_audit::AuditLog;
//! use bastion_identity::{Account, AuthService, InMemoryDirectory, Role};
//!
//! let directory = Arc::new(InMemoryDirectory::with_accounts([
//!     Account::with_password("u-1", "alice", "wonderland1", Role::User),
//! ])?);
//! let service = AuthService::with_defaults(directory, Arc::new(AuditLog::new()))?;
//! let outcome = service.authenticate("alice", "wonderland1", None)?;
//! assert!(outcome.is_success());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod account;
pub mod directory;
pub mod error;
pub mod lockout;
pub mod permission;
pub mod policy;
pub mod role;
pub mod service;
pub mod session;

pub use account::Account;
pub use directory::{InMemoryDirectory, UserDirectory};
pub use error::{DirectoryError, IdentityError, IdentityResult};
pub use lockout::{LockoutGuard, LockoutRecord, LockoutState, LockoutStatus};
pub use permission::PermissionEngine;
pub use policy::{PasswordPolicy, PolicySeverity, PolicyVerdict};
pub use role::{capabilities, Role, UnknownRole};
pub use service::{
    AuthOutcome, AuthService, PasswordChange, PasswordChangeRejection, RejectionReason,
};
pub use session::{Session, SessionStore, SessionToken};
