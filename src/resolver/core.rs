//!
//! Cluster access resolution.
//!
//! A decision is recomputed on every call from three independent reads, in a
//! fixed order where the first match wins:
//!
//! 1. a grant naming the user directly,
//! 2. a grant naming any group the user belongs to,
//! 3. the user's role (`admin` may access every cluster).
//!
//! Store faults during steps 1 and 2 are treated as "no grant" and the
//! resolution moves on; a fault or a miss while fetching the user in step 3
//! denies. Absorbed faults are logged at `warn` so they remain auditable.

use std::sync::Arc;

use crate::error::StoreError;
use crate::primitives::GrantSubject;
use crate::store::{DirectoryStore, GrantStore};
use crate::types::{ClusterId, GroupId, PermissionId, UserId};

/// How an access decision was reached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    DirectGrant { permission_id: PermissionId },
    GroupGrant { group_id: GroupId, permission_id: PermissionId },
    AdminRole,
    Denied { reason: DenyReason },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, AccessDecision::Denied { .. })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The user exists, is not an administrator and holds no grant.
    NoGrant,
    /// The user record could not be found.
    UnknownUser,
    /// The user record could not be read.
    LookupFailed,
}

/// Resolution step names, used as a log field.
#[derive(Debug, Copy, Clone)]
enum Step {
    DirectGrant,
    GroupMembership,
    GroupGrant,
    RoleDefault,
}

impl Step {
    fn as_str(&self) -> &'static str {
        match self {
            Step::DirectGrant => "direct_grant",
            Step::GroupMembership => "group_membership",
            Step::GroupGrant => "group_grant",
            Step::RoleDefault => "role_default",
        }
    }
}

fn absorbed(step: Step, user_id: UserId, cluster_id: ClusterId, err: &StoreError) {
    tracing::warn!(
        step = step.as_str(),
        %user_id,
        %cluster_id,
        error = %err,
        "store error absorbed during access resolution"
    );
}

/// The decision function. Stateless between calls.
#[derive(Debug)]
pub struct PermissionResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for PermissionResolver<S> {
    fn clone(&self) -> Self {
        PermissionResolver { store: Arc::clone(&self.store) }
    }
}

impl<S> PermissionResolver<S>
where
    S: DirectoryStore + GrantStore,
{
    pub fn new(store: Arc<S>) -> Self {
        PermissionResolver { store }
    }

    /// Whether `user_id` may access `cluster_id`. Never fails: a denial is
    /// `false`, and so is any failure to read the user.
    pub fn has_cluster_access(&self, user_id: UserId, cluster_id: ClusterId) -> bool {
        self.resolve(user_id, cluster_id).is_granted()
    }

    /// Same as [`has_cluster_access`](Self::has_cluster_access) but reports
    /// which step decided.
    pub fn resolve(&self, user_id: UserId, cluster_id: ClusterId) -> AccessDecision {
        let decision = self
            .direct_grant(user_id, cluster_id)
            .or_else(|| self.group_grant(user_id, cluster_id))
            .unwrap_or_else(|| self.role_default(user_id, cluster_id));
        tracing::debug!(%user_id, %cluster_id, ?decision, "cluster access resolved");
        decision
    }

    fn direct_grant(&self, user_id: UserId, cluster_id: ClusterId) -> Option<AccessDecision> {
        match self.store.find_user_grant(user_id, cluster_id) {
            Ok(grant) => grant.map(|g| AccessDecision::DirectGrant { permission_id: g.id }),
            Err(err) => {
                absorbed(Step::DirectGrant, user_id, cluster_id, &err);
                None
            }
        }
    }

    fn group_grant(&self, user_id: UserId, cluster_id: ClusterId) -> Option<AccessDecision> {
        let group_ids = match self.store.group_ids_for_user(user_id) {
            Ok(ids) => ids,
            Err(err) => {
                absorbed(Step::GroupMembership, user_id, cluster_id, &err);
                return None;
            }
        };
        if group_ids.is_empty() {
            return None;
        }
        match self.store.find_group_grant(&group_ids, cluster_id) {
            Ok(grant) => grant.and_then(|g| match g.subject {
                GrantSubject::Group(group_id) => Some(AccessDecision::GroupGrant {
                    group_id,
                    permission_id: g.id,
                }),
                GrantSubject::User(_) => {
                    let err = StoreError::Internal(format!(
                        "group grant lookup returned user grant {}",
                        g.id
                    ));
                    absorbed(Step::GroupGrant, user_id, cluster_id, &err);
                    None
                }
            }),
            Err(err) => {
                absorbed(Step::GroupGrant, user_id, cluster_id, &err);
                None
            }
        }
    }

    fn role_default(&self, user_id: UserId, cluster_id: ClusterId) -> AccessDecision {
        match self.store.get_user(user_id) {
            Ok(Some(user)) if user.is_admin() => AccessDecision::AdminRole,
            Ok(Some(_)) => AccessDecision::Denied { reason: DenyReason::NoGrant },
            Ok(None) => AccessDecision::Denied { reason: DenyReason::UnknownUser },
            Err(err) => {
                absorbed(Step::RoleDefault, user_id, cluster_id, &err);
                AccessDecision::Denied { reason: DenyReason::LookupFailed }
            }
        }
    }
}
