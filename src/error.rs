//!
//! Error types for store access, group management and access decisions.
//!
//! Credential errors live next to the extractor in `identity`.

use crate::types::{ClusterId, GroupId, PermissionId, UserId};

/// Faults raised by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or its state is unusable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A write collided with existing state (e.g., a unique constraint).
    #[error("Store conflict: {0}")]
    Conflict(String),
    #[error("Store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The entity a `NotFound` refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Entity {
    User(UserId),
    Group(GroupId),
    Permission(PermissionId),
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::User(id) => write!(f, "user {}", id),
            Entity::Group(id) => write!(f, "user group {}", id),
            Entity::Permission(id) => write!(f, "cluster permission {}", id),
        }
    }
}

/// Errors surfaced verbatim by group and grant management operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The entity does not exist. Deleted and never-existing entities are not distinguished.
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("User group name already exists: {0}")]
    DuplicateName(String),
    /// Group deletion blocked because grants still name the group as their subject.
    #[error("User group {group_id} is referenced by {grants} cluster permission(s)")]
    Referenced { group_id: GroupId, grants: u64 },
    #[error("User group name must not be empty")]
    InvalidName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// A denied access decision, for callers that want denial as a typed value.
/// This is an expected outcome, not a fault.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("User {user_id} has no access to cluster {cluster_id}")]
pub struct AccessDenied {
    pub user_id: UserId,
    pub cluster_id: ClusterId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            RegistryError::NotFound(Entity::Group(GroupId(9))),
            RegistryError::DuplicateName("ops".to_string()),
            RegistryError::Referenced { group_id: GroupId(1), grants: 2 },
            RegistryError::InvalidName,
            RegistryError::Store(StoreError::Unavailable("down".to_string())),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
        assert_eq!(
            RegistryError::NotFound(Entity::Group(GroupId(9))).to_string(),
            "user group 9 not found"
        );
    }
}
