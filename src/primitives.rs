use std::collections::BTreeSet;

use crate::types::{AuthType, ClusterId, GroupId, PermissionId, Role, UserId, UserStatus};

// --- Users ------------------------------------------------------------------

/// A principal known to the directory. Users are owned by the identity system;
/// this core only reads them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    pub auth_type: AuthType,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Input for seeding a user into a store backend. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub auth_type: AuthType,
}

impl NewUser {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        NewUser {
            username: username.into(),
            role,
            ..Default::default()
        }
    }
}

// --- Groups -----------------------------------------------------------------

/// A named set of users that grants can be issued to in bulk.
/// `member_ids` is the resolved membership set at read time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserGroup {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub member_ids: BTreeSet<UserId>,
}

impl UserGroup {
    pub fn has_member(&self, user_id: UserId) -> bool {
        self.member_ids.contains(&user_id)
    }
}

/// Join row relating exactly one user to exactly one group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Membership {
    pub group_id: GroupId,
    pub user_id: UserId,
}

// --- Grants -----------------------------------------------------------------

/// The principal a grant applies to. A grant has exactly one subject.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum GrantSubject {
    User(UserId),
    Group(GroupId),
}

/// A stored statement that a subject may access a cluster.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClusterPermission {
    pub id: PermissionId,
    pub cluster_id: ClusterId,
    pub subject: GrantSubject,
}

impl ClusterPermission {
    pub fn is_for_user(&self, user_id: UserId) -> bool {
        self.subject == GrantSubject::User(user_id)
    }

    pub fn is_for_group(&self, group_id: GroupId) -> bool {
        self.subject == GrantSubject::Group(group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_subject_is_tagged_on_the_wire() {
        let grant = ClusterPermission {
            id: PermissionId(1),
            cluster_id: ClusterId(5),
            subject: GrantSubject::Group(GroupId(3)),
        };
        let json = serde_json::to_value(grant).unwrap();
        assert_eq!(json["subject"]["kind"], "group");
        assert_eq!(json["subject"]["id"], 3);
        assert!(grant.is_for_group(GroupId(3)));
        assert!(!grant.is_for_user(UserId(3)));
    }

    #[test]
    fn new_user_defaults_to_active_local_user() {
        let seed: NewUser = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(seed.role, Role::User);
        assert_eq!(seed.status, UserStatus::Active);
        assert_eq!(seed.auth_type, AuthType::Local);
    }
}
