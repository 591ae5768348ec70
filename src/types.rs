//!
//! Shared identifier and tag types used across the store, registry and resolver.
//!
//! Identifiers are plain numeric newtypes so that a user id can never be passed
//! where a group or cluster id is expected.

use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }
    };
}

numeric_id!(
    /// Unique, immutable identity of a user.
    UserId
);
numeric_id!(
    /// Unique identity of a user group.
    GroupId
);
numeric_id!(
    /// Identity of a managed cluster, the resource access is decided for.
    ClusterId
);
numeric_id!(
    /// Identity of a stored `ClusterPermission` row.
    PermissionId
);

/// Role of a user. A user holds exactly one role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Implicitly granted access to every cluster.
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Disabled,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "disabled" => Ok(UserStatus::Disabled),
            other => Err(format!("Invalid user status: {}", other)),
        }
    }
}

/// How an identity was established. The set of federation sources belongs to
/// the authenticator, so unknown tags are carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AuthType {
    #[default]
    Local,
    Ldap,
    Oidc,
    Other(String),
}

impl AuthType {
    pub fn as_str(&self) -> &str {
        match self {
            AuthType::Local => "local",
            AuthType::Ldap => "ldap",
            AuthType::Oidc => "oidc",
            AuthType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for AuthType {
    fn from(tag: &str) -> Self {
        match tag {
            "local" => AuthType::Local,
            "ldap" => AuthType::Ldap,
            "oidc" => AuthType::Oidc,
            other => AuthType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for AuthType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for AuthType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(AuthType::from(tag.as_str()))
    }
}
