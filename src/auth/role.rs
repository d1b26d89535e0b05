use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried by every identity. Closed set: anything else fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Patient,
    Doctor,
    Technician,
    Admin,
}

/// Partition of the identity store an identity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    Patient,
    Staff,
}

impl RoleCategory {
    /// Lookup order used when only an id is known
    pub const PROBE_ORDER: [RoleCategory; 2] = [RoleCategory::Patient, RoleCategory::Staff];
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Patient, Role::Doctor, Role::Technician, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Technician => "Technician",
            Role::Admin => "Admin",
        }
    }

    pub fn category(&self) -> RoleCategory {
        match self {
            Role::Patient => RoleCategory::Patient,
            Role::Doctor | Role::Technician | Role::Admin => RoleCategory::Staff,
        }
    }

    /// Where a freshly signed-in identity is sent
    pub fn landing(&self) -> &'static str {
        match self {
            Role::Patient => "/home",
            Role::Doctor => "/patients",
            Role::Technician => "/devices",
            Role::Admin => "/doctors",
        }
    }

    /// Roles a visitor may pick on the signup form
    pub fn self_registrable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Immutable set of roles allowed through a route, bound when the route is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        RoleSet(0)
    }

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < roles.len() {
            bits |= Self::bit(roles[i]);
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn all() -> Self {
        Self::of(&Role::ALL)
    }

    pub const fn contains(&self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub fn roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| self.contains(*r)).collect()
    }

    const fn bit(role: Role) -> u8 {
        match role {
            Role::Patient => 1,
            Role::Doctor => 1 << 1,
            Role::Technician => 1 << 2,
            Role::Admin => 1 << 3,
        }
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles().iter().map(Role::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
