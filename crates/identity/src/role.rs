//! Role and capability table.
//!
//! Each role carries a numeric level (used only for "who can manage whom") and
//! an explicit capability list. A higher level does not inherit the lower
//! levels' capabilities; every grant is spelled out. `Admin` alone holds the
//! wildcard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability names.
pub mod capabilities {
    /// Grants every capability
    pub const WILDCARD: &str = "*";

    pub const READ_PUBLIC: &str = "READ_PUBLIC";
    pub const READ_PROFILE: &str = "READ_PROFILE";
    pub const UPDATE_PROFILE: &str = "UPDATE_PROFILE";
    pub const CHANGE_PASSWORD: &str = "CHANGE_PASSWORD";
    pub const USER_VIEW: &str = "USER_VIEW";
    pub const USER_LOCK: &str = "USER_LOCK";
    pub const USER_MANAGEMENT: &str = "USER_MANAGEMENT";
    pub const AUDIT_VIEW: &str = "AUDIT_VIEW";
    pub const SYSTEM_CONFIG: &str = "SYSTEM_CONFIG";
    pub const BACKUP: &str = "BACKUP";
}

use capabilities::*;

const GUEST_CAPABILITIES: &[&str] = &[READ_PUBLIC];

const USER_CAPABILITIES: &[&str] = &[READ_PUBLIC, READ_PROFILE, UPDATE_PROFILE, CHANGE_PASSWORD];

const MODERATOR_CAPABILITIES: &[&str] = &[
    READ_PUBLIC,
    READ_PROFILE,
    UPDATE_PROFILE,
    CHANGE_PASSWORD,
    USER_VIEW,
    USER_LOCK,
    AUDIT_VIEW,
];

const ADMIN_CAPABILITIES: &[&str] = &[WILDCARD];

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn all() -> [Role; 4] {
        [Role::Guest, Role::User, Role::Moderator, Role::Admin]
    }

    /// Position in the management hierarchy.
    pub fn level(&self) -> u8 {
        match self {
            Role::Guest => 0,
            Role::User => 1,
            Role::Moderator => 2,
            Role::Admin => 3,
        }
    }

    /// Capabilities granted to this role, as declared.
    pub fn capabilities(&self) -> &'static [&'static str] {
        match self {
            Role::Guest => GUEST_CAPABILITIES,
            Role::User => USER_CAPABILITIES,
            Role::Moderator => MODERATOR_CAPABILITIES,
            Role::Admin => ADMIN_CAPABILITIES,
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities()
            .iter()
            .any(|granted| *granted == WILDCARD || *granted == capability)
    }

    /// Strictly outranks `other`. Equal levels never manage each other.
    pub fn can_manage(&self, other: Role) -> bool {
        self.level() > other.level()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "GUEST",
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::all()
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_strictly_ordered() {
        let levels: Vec<u8> = Role::all().iter().map(|r| r.level()).collect();
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_can_manage_is_strict() {
        assert!(Role::Admin.can_manage(Role::Moderator));
        assert!(!Role::Moderator.can_manage(Role::Admin));
        assert!(!Role::Admin.can_manage(Role::Admin));
        assert!(!Role::Guest.can_manage(Role::Guest));
        assert!(Role::User.can_manage(Role::Guest));
    }

    #[test]
    fn test_wildcard_grants_everything() {
        assert!(Role::Admin.has_capability(USER_MANAGEMENT));
        assert!(Role::Admin.has_capability("SOMETHING_NOBODY_DECLARED"));
    }

    #[test]
    fn test_capabilities_not_inherited_by_level() {
        assert!(Role::Moderator.has_capability(USER_LOCK));
        assert!(!Role::Moderator.has_capability(USER_MANAGEMENT));
        assert!(!Role::Moderator.has_capability(BACKUP));
        assert!(!Role::User.has_capability(USER_VIEW));
        assert!(Role::Guest.has_capability(READ_PUBLIC));
        assert!(!Role::Guest.has_capability(READ_PROFILE));
    }

    #[test]
    fn test_only_admin_holds_wildcard() {
        for role in Role::all() {
            let has_wildcard = role.capabilities().contains(&WILDCARD);
            assert_eq!(has_wildcard, role == Role::Admin);
        }
    }

    #[test]
    fn test_parse_roundtrip() {
        for role in Role::all() {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert_eq!(" moderator ".parse::<Role>().unwrap(), Role::Moderator);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"MODERATOR\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
