//! Administrative management of cluster permissions.
//!
//! The resolver only reads grants; this is the single place that writes them.

use std::sync::Arc;

use crate::error::{Entity, RegistryError, RegistryResult};
use crate::primitives::{ClusterPermission, GrantSubject};
use crate::store::{GrantStore, StoreTx, TransactionalStore};
use crate::types::{ClusterId, PermissionId};

#[derive(Debug)]
pub struct GrantManager<S> {
    store: Arc<S>,
}

impl<S> Clone for GrantManager<S> {
    fn clone(&self) -> Self {
        GrantManager { store: Arc::clone(&self.store) }
    }
}

impl<S> GrantManager<S>
where
    S: GrantStore + TransactionalStore,
{
    pub fn new(store: Arc<S>) -> Self {
        GrantManager { store }
    }

    /// Grants `subject` access to `cluster_id`. The subject must exist.
    /// Repeating a grant is allowed and simply redundant.
    pub fn grant(&self, subject: GrantSubject, cluster_id: ClusterId) -> RegistryResult<ClusterPermission> {
        let permission = self.store.transaction(|tx| -> RegistryResult<ClusterPermission> {
            require_subject(tx, subject)?;
            Ok(tx.insert_grant(subject, cluster_id)?)
        })?;
        tracing::info!(
            permission_id = %permission.id,
            %cluster_id,
            subject = ?subject,
            "cluster permission granted"
        );
        Ok(permission)
    }

    pub fn revoke(&self, id: PermissionId) -> RegistryResult<ClusterPermission> {
        let permission = self.store.transaction(|tx| -> RegistryResult<ClusterPermission> {
            let permission = tx
                .get_grant(id)?
                .ok_or(RegistryError::NotFound(Entity::Permission(id)))?;
            tx.delete_grant(id)?;
            Ok(permission)
        })?;
        tracing::info!(permission_id = %id, cluster_id = %permission.cluster_id, "cluster permission revoked");
        Ok(permission)
    }

    pub fn list_for_cluster(&self, cluster_id: ClusterId) -> RegistryResult<Vec<ClusterPermission>> {
        Ok(self.store.list_grants_for_cluster(cluster_id)?)
    }
}

fn require_subject(tx: &dyn StoreTx, subject: GrantSubject) -> RegistryResult<()> {
    let exists = match subject {
        GrantSubject::User(id) => tx.get_user(id)?.is_some(),
        GrantSubject::Group(id) => tx.get_group(id)?.is_some(),
    };
    if exists {
        return Ok(());
    }
    Err(RegistryError::NotFound(match subject {
        GrantSubject::User(id) => Entity::User(id),
        GrantSubject::Group(id) => Entity::Group(id),
    }))
}
