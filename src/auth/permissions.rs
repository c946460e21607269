use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Capability checked by the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ReadAllData,
    ReadPersonalData,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ReadAllData => "READ_ALL_DATA",
            Permission::ReadPersonalData => "READ_PERSONAL_DATA",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account role, stored in the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Permissions granted by the role, in declaration order.
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::User => &[Permission::ReadPersonalData],
            Role::Admin => &[Permission::ReadAllData, Permission::ReadPersonalData],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission names for `role` plus its `ROLE_<name>` marker.
pub fn authorities_for(role: Role) -> BTreeSet<String> {
    role.permissions()
        .iter()
        .map(|p| p.as_str().to_string())
        .chain(std::iter::once(format!("ROLE_{}", role.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_gets_personal_data_and_marker() {
        let auths = authorities_for(Role::User);
        assert_eq!(auths.len(), 2);
        assert!(auths.contains("READ_PERSONAL_DATA"));
        assert!(auths.contains("ROLE_USER"));
        assert!(!auths.contains("READ_ALL_DATA"));
    }

    #[test]
    fn admin_permissions_cover_user_permissions() {
        let admin = authorities_for(Role::Admin);
        assert!(admin.contains("ROLE_ADMIN"));
        assert!(admin.contains("READ_ALL_DATA"));
        for p in Role::User.permissions() {
            assert!(admin.contains(p.as_str()));
        }
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(Role::default(), Role::User);
    }
}
