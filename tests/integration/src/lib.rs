//! End-to-end tests across the Bastion crates.
//!
//! This test suite validates:
//! - Login, lockout and self-healing through `AuthService`
//! - Administrative session and account control
//! - Audit trail completeness and reporting queries
//! - Behavior under concurrent callers

pub mod test_utils;

#[cfg(test)]
mod login_lockout_tests;

#[cfg(test)]
mod admin_session_tests;

#[cfg(test)]
mod audit_reporting_tests;

#[cfg(test)]
mod concurrency_tests;
