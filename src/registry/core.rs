//!
//! Group registry: CRUD over user groups and their membership sets.
//!
//! Every mutation is a single store transaction. Errors are surfaced to the
//! caller unchanged; the registry performs no local recovery.

use std::sync::Arc;

use crate::error::{Entity, RegistryError, RegistryResult, StoreError};
use crate::primitives::{Membership, UserGroup};
use crate::store::{DirectoryStore, GrantStore, StoreTx, TransactionalStore};
use crate::types::{GroupId, UserId};

/// Owns `UserGroup` entities. Holds no state of its own; all records live in `S`.
#[derive(Debug)]
pub struct GroupRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for GroupRegistry<S> {
    fn clone(&self) -> Self {
        GroupRegistry { store: Arc::clone(&self.store) }
    }
}

impl<S> GroupRegistry<S>
where
    S: DirectoryStore + GrantStore + TransactionalStore,
{
    pub fn new(store: Arc<S>) -> Self {
        GroupRegistry { store }
    }

    /// Creates an empty group. The name check and the insert run in one
    /// transaction, so a name is never committed without its record.
    pub fn create_group(&self, name: &str, description: &str) -> RegistryResult<UserGroup> {
        let name = validate_name(name)?;
        let group = self.store.transaction(|tx| -> RegistryResult<UserGroup> {
            if tx.group_name_taken(name)? {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
            tx.insert_group(name, description).map_err(|err| match err {
                StoreError::Conflict(_) => RegistryError::DuplicateName(name.to_string()),
                other => RegistryError::Store(other),
            })
        })?;
        tracing::info!(group_id = %group.id, name = %group.name, "user group created");
        Ok(group)
    }

    /// Fetches a group with its members resolved. Deleted and unknown ids
    /// both fail with `NotFound`.
    pub fn get_group(&self, id: GroupId) -> RegistryResult<UserGroup> {
        self.store
            .get_group(id)?
            .ok_or(RegistryError::NotFound(Entity::Group(id)))
    }

    /// Snapshot of all groups in insertion order.
    pub fn list_groups(&self) -> RegistryResult<Vec<UserGroup>> {
        Ok(self.store.list_groups()?)
    }

    /// Deletes a group that no grant references.
    ///
    /// The reference count, the membership removal and the group removal
    /// happen in one transaction: on `Referenced` the group and its members
    /// are left exactly as they were. Grants are never cascade-deleted.
    pub fn delete_group(&self, id: GroupId) -> RegistryResult<()> {
        let removed_members = self.store.transaction(|tx| -> RegistryResult<u64> {
            require_group(tx, id)?;
            let grants = tx.count_grants_for_group(id)?;
            if grants > 0 {
                return Err(RegistryError::Referenced { group_id: id, grants });
            }
            let removed = tx.delete_memberships(id)?;
            if !tx.delete_group(id)? {
                return Err(RegistryError::NotFound(Entity::Group(id)));
            }
            Ok(removed)
        });

        match removed_members {
            Ok(members) => {
                tracing::info!(group_id = %id, members, "user group deleted");
                Ok(())
            }
            Err(RegistryError::Referenced { group_id, grants }) => {
                tracing::info!(%group_id, grants, "user group deletion blocked by cluster permissions");
                Err(RegistryError::Referenced { group_id, grants })
            }
            Err(err) => Err(err),
        }
    }

    /// Adds a user to a group. Adding an existing member is a no-op.
    pub fn add_member(&self, group_id: GroupId, user_id: UserId) -> RegistryResult<UserGroup> {
        self.store.transaction(|tx| -> RegistryResult<UserGroup> {
            require_group(tx, group_id)?;
            if tx.get_user(user_id)?.is_none() {
                return Err(RegistryError::NotFound(Entity::User(user_id)));
            }
            if tx.insert_membership(Membership { group_id, user_id })? {
                tracing::info!(%group_id, %user_id, "user added to group");
            }
            require_group(tx, group_id)
        })
    }

    /// Removes a user from a group. Removing a non-member is a no-op.
    pub fn remove_member(&self, group_id: GroupId, user_id: UserId) -> RegistryResult<UserGroup> {
        self.store.transaction(|tx| -> RegistryResult<UserGroup> {
            require_group(tx, group_id)?;
            if tx.delete_membership(Membership { group_id, user_id })? {
                tracing::info!(%group_id, %user_id, "user removed from group");
            }
            require_group(tx, group_id)
        })
    }
}

fn require_group(tx: &dyn StoreTx, id: GroupId) -> RegistryResult<UserGroup> {
    tx.get_group(id)?
        .ok_or(RegistryError::NotFound(Entity::Group(id)))
}

fn validate_name(name: &str) -> RegistryResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::InvalidName);
    }
    Ok(trimmed)
}
