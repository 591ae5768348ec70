//! In-memory store backend.
//!
//! All tables sit behind a single `RwLock`. Reads take the shared lock.
//! A transaction takes the exclusive lock, works on a staged copy of the
//! tables and swaps it in only if the closure succeeds, so a failed unit of
//! work leaves no trace and readers never see a half-applied one.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::primitives::{ClusterPermission, GrantSubject, Membership, NewUser, User, UserGroup};
use crate::store::{DirectoryStore, GrantStore, StoreTx, TransactionalStore};
use crate::types::{ClusterId, GroupId, PermissionId, UserId};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct GroupRow {
    name: String,
    description: String,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRow>,
    groups: BTreeMap<GroupId, GroupRow>,
    memberships: BTreeSet<Membership>,
    grants: BTreeMap<PermissionId, ClusterPermission>,
    next_user_id: u64,
    next_group_id: u64,
    next_permission_id: u64,
}

impl Tables {
    fn user(&self, id: UserId) -> Option<User> {
        self.users
            .get(&id)
            .filter(|row| !row.deleted)
            .map(|row| row.user.clone())
    }

    /// Live members only; rows for soft-deleted users stay but are not listed.
    fn member_ids(&self, group_id: GroupId) -> BTreeSet<UserId> {
        self.memberships
            .iter()
            .filter(|m| m.group_id == group_id && self.user(m.user_id).is_some())
            .map(|m| m.user_id)
            .collect()
    }

    fn group(&self, id: GroupId) -> Option<UserGroup> {
        self.groups.get(&id).map(|row| UserGroup {
            id,
            name: row.name.clone(),
            description: row.description.clone(),
            member_ids: self.member_ids(id),
        })
    }

    fn name_taken(&self, name: &str) -> bool {
        self.groups.values().any(|row| row.name == name)
    }

    fn grants_for_group(&self, group_id: GroupId) -> u64 {
        self.grants.values().filter(|g| g.is_for_group(group_id)).count() as u64
    }

    fn subject_exists(&self, subject: GrantSubject) -> bool {
        match subject {
            GrantSubject::User(id) => self.user(id).is_some(),
            GrantSubject::Group(id) => self.groups.contains_key(&id),
        }
    }
}

/// A complete in-process store. Ids are assigned from 1 upwards in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in `Arc`, ready to be shared.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    /// Adds a user record. Users are owned by the identity system, so this is
    /// a seeding operation rather than part of the registry.
    pub fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.write()?;
        tables.next_user_id += 1;
        let user = User {
            id: UserId(tables.next_user_id),
            username: new_user.username,
            role: new_user.role,
            status: new_user.status,
            auth_type: new_user.auth_type,
        };
        tables.users.insert(user.id, UserRow { user: user.clone(), deleted: false });
        Ok(user)
    }

    /// Hides the user from every read. Memberships and grants are kept.
    pub fn soft_delete_user(&self, id: UserId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        match tables.users.get_mut(&id) {
            Some(row) if !row.deleted => {
                row.deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl DirectoryStore for MemoryStore {
    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.user(id))
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|row| !row.deleted)
            .map(|row| row.user.clone())
            .collect())
    }

    fn get_group(&self, id: GroupId) -> StoreResult<Option<UserGroup>> {
        Ok(self.read()?.group(id))
    }

    fn list_groups(&self) -> StoreResult<Vec<UserGroup>> {
        let tables = self.read()?;
        Ok(tables.groups.keys().filter_map(|id| tables.group(*id)).collect())
    }

    fn get_group_member_ids(&self, group_id: GroupId) -> StoreResult<BTreeSet<UserId>> {
        Ok(self.read()?.member_ids(group_id))
    }

    fn group_ids_for_user(&self, user_id: UserId) -> StoreResult<Vec<GroupId>> {
        Ok(self
            .read()?
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.group_id)
            .collect())
    }
}

impl GrantStore for MemoryStore {
    fn find_user_grant(
        &self,
        user_id: UserId,
        cluster_id: ClusterId,
    ) -> StoreResult<Option<ClusterPermission>> {
        Ok(self
            .read()?
            .grants
            .values()
            .find(|g| g.cluster_id == cluster_id && g.is_for_user(user_id))
            .copied())
    }

    fn find_group_grant(
        &self,
        group_ids: &[GroupId],
        cluster_id: ClusterId,
    ) -> StoreResult<Option<ClusterPermission>> {
        if group_ids.is_empty() {
            return Ok(None);
        }
        Ok(self
            .read()?
            .grants
            .values()
            .find(|g| {
                g.cluster_id == cluster_id
                    && matches!(g.subject, GrantSubject::Group(id) if group_ids.contains(&id))
            })
            .copied())
    }

    fn count_grants_for_group(&self, group_id: GroupId) -> StoreResult<u64> {
        Ok(self.read()?.grants_for_group(group_id))
    }

    fn list_grants_for_cluster(&self, cluster_id: ClusterId) -> StoreResult<Vec<ClusterPermission>> {
        Ok(self
            .read()?
            .grants
            .values()
            .filter(|g| g.cluster_id == cluster_id)
            .copied()
            .collect())
    }
}

/// Staged view handed to transaction closures.
struct MemoryTx<'a> {
    tables: &'a mut Tables,
}

impl StoreTx for MemoryTx<'_> {
    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.user(id))
    }

    fn get_group(&self, id: GroupId) -> StoreResult<Option<UserGroup>> {
        Ok(self.tables.group(id))
    }

    fn group_name_taken(&self, name: &str) -> StoreResult<bool> {
        Ok(self.tables.name_taken(name))
    }

    fn count_grants_for_group(&self, group_id: GroupId) -> StoreResult<u64> {
        Ok(self.tables.grants_for_group(group_id))
    }

    fn insert_group(&mut self, name: &str, description: &str) -> StoreResult<UserGroup> {
        if self.tables.name_taken(name) {
            return Err(StoreError::Conflict(format!("duplicate group name {:?}", name)));
        }
        self.tables.next_group_id += 1;
        let id = GroupId(self.tables.next_group_id);
        self.tables.groups.insert(
            id,
            GroupRow {
                name: name.to_string(),
                description: description.to_string(),
            },
        );
        Ok(UserGroup {
            id,
            name: name.to_string(),
            description: description.to_string(),
            member_ids: BTreeSet::new(),
        })
    }

    fn delete_group(&mut self, group_id: GroupId) -> StoreResult<bool> {
        Ok(self.tables.groups.remove(&group_id).is_some())
    }

    fn insert_membership(&mut self, membership: Membership) -> StoreResult<bool> {
        Ok(self.tables.memberships.insert(membership))
    }

    fn delete_membership(&mut self, membership: Membership) -> StoreResult<bool> {
        Ok(self.tables.memberships.remove(&membership))
    }

    fn delete_memberships(&mut self, group_id: GroupId) -> StoreResult<u64> {
        let before = self.tables.memberships.len();
        self.tables.memberships.retain(|m| m.group_id != group_id);
        Ok((before - self.tables.memberships.len()) as u64)
    }

    fn get_grant(&self, id: PermissionId) -> StoreResult<Option<ClusterPermission>> {
        Ok(self.tables.grants.get(&id).copied())
    }

    fn insert_grant(
        &mut self,
        subject: GrantSubject,
        cluster_id: ClusterId,
    ) -> StoreResult<ClusterPermission> {
        if !self.tables.subject_exists(subject) {
            return Err(StoreError::Conflict(format!("grant subject {:?} does not exist", subject)));
        }
        self.tables.next_permission_id += 1;
        let grant = ClusterPermission {
            id: PermissionId(self.tables.next_permission_id),
            cluster_id,
            subject,
        };
        self.tables.grants.insert(grant.id, grant);
        Ok(grant)
    }

    fn delete_grant(&mut self, id: PermissionId) -> StoreResult<bool> {
        Ok(self.tables.grants.remove(&id).is_some())
    }
}

impl TransactionalStore for MemoryStore {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.write()?;
        let mut staged = guard.clone();
        let out = f(&mut MemoryTx { tables: &mut staged })?;
        *guard = staged;
        Ok(out)
    }
}
