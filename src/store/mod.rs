//! Persistence interfaces consumed by the registry and the resolver.
//!
//! The core never owns records; every state of record lives behind these
//! traits, and the backend is the only synchronization point between
//! concurrent callers. Reads go through [`DirectoryStore`] and [`GrantStore`].
//! Writes only happen inside [`TransactionalStore::transaction`], so a reader
//! observes either none or all of a unit of work.

use std::collections::BTreeSet;

use crate::error::StoreResult;
use crate::primitives::{ClusterPermission, GrantSubject, Membership, User, UserGroup};
use crate::types::{ClusterId, GroupId, PermissionId, UserId};

pub mod memory;

pub use memory::MemoryStore;

/// Read access to users, groups and memberships.
pub trait DirectoryStore: Send + Sync {
    /// Returns `None` for unknown and soft-deleted users alike.
    fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Group with its member list resolved.
    fn get_group(&self, id: GroupId) -> StoreResult<Option<UserGroup>>;

    /// All groups in insertion order, each with its member list resolved.
    fn list_groups(&self) -> StoreResult<Vec<UserGroup>>;

    fn get_group_member_ids(&self, group_id: GroupId) -> StoreResult<BTreeSet<UserId>>;

    /// Groups the user currently belongs to.
    fn group_ids_for_user(&self, user_id: UserId) -> StoreResult<Vec<GroupId>>;
}

/// Read access to stored cluster permissions.
pub trait GrantStore: Send + Sync {
    fn find_user_grant(
        &self,
        user_id: UserId,
        cluster_id: ClusterId,
    ) -> StoreResult<Option<ClusterPermission>>;

    /// Any grant for `cluster_id` whose subject is one of `group_ids`.
    fn find_group_grant(
        &self,
        group_ids: &[GroupId],
        cluster_id: ClusterId,
    ) -> StoreResult<Option<ClusterPermission>>;

    fn count_grants_for_group(&self, group_id: GroupId) -> StoreResult<u64>;

    fn list_grants_for_cluster(&self, cluster_id: ClusterId) -> StoreResult<Vec<ClusterPermission>>;
}

/// A unit of work against the store. Nothing written through a `StoreTx`
/// is visible to other callers until the enclosing transaction commits.
pub trait StoreTx {
    fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    fn get_group(&self, id: GroupId) -> StoreResult<Option<UserGroup>>;

    fn group_name_taken(&self, name: &str) -> StoreResult<bool>;

    fn count_grants_for_group(&self, group_id: GroupId) -> StoreResult<u64>;

    /// Creates an empty group. Backends reject duplicate names with `StoreError::Conflict`.
    fn insert_group(&mut self, name: &str, description: &str) -> StoreResult<UserGroup>;

    /// Removes the group record. Returns `false` if it did not exist.
    fn delete_group(&mut self, group_id: GroupId) -> StoreResult<bool>;

    /// Returns `false` if the membership already existed.
    fn insert_membership(&mut self, membership: Membership) -> StoreResult<bool>;

    /// Returns `false` if there was nothing to remove.
    fn delete_membership(&mut self, membership: Membership) -> StoreResult<bool>;

    /// Removes every membership of the group, returning how many were removed.
    fn delete_memberships(&mut self, group_id: GroupId) -> StoreResult<u64>;

    fn get_grant(&self, id: PermissionId) -> StoreResult<Option<ClusterPermission>>;

    fn insert_grant(
        &mut self,
        subject: GrantSubject,
        cluster_id: ClusterId,
    ) -> StoreResult<ClusterPermission>;

    /// Returns `false` if the grant did not exist.
    fn delete_grant(&mut self, id: PermissionId) -> StoreResult<bool>;
}

/// Backends able to run a closure as one atomic unit.
pub trait TransactionalStore: Send + Sync {
    /// Runs `f` atomically. If `f` returns `Err`, everything it wrote is discarded.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<crate::error::StoreError>;
}

/// Everything the access service needs from a backend.
pub trait Store: DirectoryStore + GrantStore + TransactionalStore {}

impl<S> Store for S where S: DirectoryStore + GrantStore + TransactionalStore {}
