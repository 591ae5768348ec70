//! Caller-facing access service.
//!
//! Bundles the group registry, grant management and the resolver over one
//! shared store. Handlers receive a [`Principal`] from the identity extractor
//! and ask this service for decisions and group administration.

use std::sync::Arc;

use crate::error::{AccessDenied, RegistryResult};
use crate::grants::GrantManager;
use crate::identity::Principal;
use crate::primitives::{ClusterPermission, GrantSubject, User, UserGroup};
use crate::registry::GroupRegistry;
use crate::resolver::{AccessDecision, PermissionResolver};
use crate::store::{DirectoryStore, Store};
use crate::types::{ClusterId, GroupId, PermissionId, UserId};

#[derive(Debug)]
pub struct AccessService<S> {
    store: Arc<S>,
    registry: GroupRegistry<S>,
    grants: GrantManager<S>,
    resolver: PermissionResolver<S>,
}

impl<S> Clone for AccessService<S> {
    fn clone(&self) -> Self {
        AccessService {
            store: Arc::clone(&self.store),
            registry: self.registry.clone(),
            grants: self.grants.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<S: Store> AccessService<S> {
    pub fn new(store: Arc<S>) -> Self {
        AccessService {
            registry: GroupRegistry::new(Arc::clone(&store)),
            grants: GrantManager::new(Arc::clone(&store)),
            resolver: PermissionResolver::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // --- Decisions ---

    pub fn has_cluster_access(&self, user_id: UserId, cluster_id: ClusterId) -> bool {
        self.resolver.has_cluster_access(user_id, cluster_id)
    }

    pub fn resolve(&self, user_id: UserId, cluster_id: ClusterId) -> AccessDecision {
        self.resolver.resolve(user_id, cluster_id)
    }

    /// Denial as a typed value, for handlers that propagate with `?`.
    pub fn authorize(&self, principal: &Principal, cluster_id: ClusterId) -> Result<(), AccessDenied> {
        if self.has_cluster_access(principal.user_id, cluster_id) {
            return Ok(());
        }
        Err(AccessDenied { user_id: principal.user_id, cluster_id })
    }

    // --- Groups ---

    pub fn create_user_group(&self, name: &str, description: &str) -> RegistryResult<UserGroup> {
        self.registry.create_group(name, description)
    }

    pub fn get_user_group(&self, id: GroupId) -> RegistryResult<UserGroup> {
        self.registry.get_group(id)
    }

    pub fn list_user_groups(&self) -> RegistryResult<Vec<UserGroup>> {
        self.registry.list_groups()
    }

    pub fn delete_user_group(&self, id: GroupId) -> RegistryResult<()> {
        self.registry.delete_group(id)
    }

    pub fn add_user_to_group(&self, group_id: GroupId, user_id: UserId) -> RegistryResult<UserGroup> {
        self.registry.add_member(group_id, user_id)
    }

    pub fn remove_user_from_group(&self, group_id: GroupId, user_id: UserId) -> RegistryResult<UserGroup> {
        self.registry.remove_member(group_id, user_id)
    }

    // --- Grants ---

    pub fn grant_cluster_access(
        &self,
        subject: GrantSubject,
        cluster_id: ClusterId,
    ) -> RegistryResult<ClusterPermission> {
        self.grants.grant(subject, cluster_id)
    }

    pub fn revoke_cluster_access(&self, id: PermissionId) -> RegistryResult<ClusterPermission> {
        self.grants.revoke(id)
    }

    pub fn list_cluster_permissions(&self, cluster_id: ClusterId) -> RegistryResult<Vec<ClusterPermission>> {
        self.grants.list_for_cluster(cluster_id)
    }

    // --- Users ---

    /// Read-only enumeration of users.
    pub fn list_users(&self) -> RegistryResult<Vec<User>> {
        Ok(self.store.list_users()?)
    }
}
