//! User roles.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known role name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Role of a user account.
///
/// Roles form a total order, `Admin ⊇ Owner ⊇ Employee ⊇ Customer`. The string
/// forms (`"ADMIN"`, `"OWNER"`, ...) only appear at the JSON, SQL and token
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "kiosky.user_role", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Platform administrator. May mutate every store.
    Admin,
    /// Owns exactly one store and manages it.
    Owner,
    /// Works at one store and manages its catalog.
    Employee,
    /// Shopper. Read-only access to catalogs.
    Customer,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Owner, Self::Employee, Self::Customer];

    const fn rank(self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Owner => 2,
            Self::Employee => 1,
            Self::Customer => 0,
        }
    }

    /// Whether this role carries every permission of `other`.
    #[must_use]
    pub const fn includes(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Owner => "OWNER",
            Self::Employee => "EMPLOYEE",
            Self::Customer => "CUSTOMER",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Admin => "Platform administrator",
            Self::Owner => "Store owner",
            Self::Employee => "Store employee",
            Self::Customer => "Customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RoleParseError(s.to_owned()))
    }
}
