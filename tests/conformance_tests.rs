use std::time::Duration;

use clusterauth_core::{
    error::{Entity, RegistryError},
    identity::{Claims, CredentialSource, IdentityConfig, IdentityError, IdentityExtractor},
    primitives::{GrantSubject, NewUser},
    store::MemoryStore,
    types::{AuthType, ClusterId, GroupId, Role, UserId},
    AccessService,
};

fn create_service() -> AccessService<MemoryStore> {
    AccessService::new(MemoryStore::new_shared())
}

#[test]
fn test_create_user_group_rejects_duplicate_name() {
    let service = create_service();
    let group = service.create_user_group("test-group", "desc").expect("create");
    assert_eq!(group.name, "test-group");
    assert_eq!(
        service.create_user_group("test-group", "desc").unwrap_err(),
        RegistryError::DuplicateName("test-group".to_string())
    );
}

#[test]
fn test_group_member_inherits_group_grant() {
    // Group 1 has members {1}; user 1 is not an admin; no direct grant for
    // cluster 5; a grant exists for (group 1, cluster 5).
    let service = create_service();
    let user = service.store().insert_user(NewUser::new("user1", Role::User)).unwrap();
    let group = service.create_user_group("group-1", "").unwrap();
    assert_eq!((user.id, group.id), (UserId(1), GroupId(1)));
    service.add_user_to_group(group.id, user.id).unwrap();
    service.grant_cluster_access(GrantSubject::Group(group.id), ClusterId(5)).unwrap();

    assert!(service.has_cluster_access(UserId(1), ClusterId(5)));
    assert!(!service.has_cluster_access(UserId(1), ClusterId(6)));
}

#[test]
fn test_nonexistent_user_is_denied() {
    let service = create_service();
    assert!(!service.has_cluster_access(UserId(999), ClusterId(1)));
}

#[test]
fn test_admin_access_without_grants() {
    let service = create_service();
    let admin = service.store().insert_user(NewUser::new("admin", Role::Admin)).unwrap();
    assert!(service.has_cluster_access(admin.id, ClusterId(1)));
    assert!(service.list_cluster_permissions(ClusterId(1)).unwrap().is_empty());
}

#[test]
fn test_group_deletion_lifecycle() {
    let service = create_service();
    let user = service.store().insert_user(NewUser::new("user1", Role::User)).unwrap();
    let group = service.create_user_group("ops", "").unwrap();
    service.add_user_to_group(group.id, user.id).unwrap();
    let grant = service.grant_cluster_access(GrantSubject::Group(group.id), ClusterId(2)).unwrap();

    assert_eq!(
        service.delete_user_group(group.id).unwrap_err(),
        RegistryError::Referenced { group_id: group.id, grants: 1 }
    );
    assert!(service.has_cluster_access(user.id, ClusterId(2)), "Blocked delete keeps access intact");

    service.revoke_cluster_access(grant.id).unwrap();
    service.delete_user_group(group.id).expect("unreferenced group deletes");
    assert_eq!(
        service.get_user_group(group.id).unwrap_err(),
        RegistryError::NotFound(Entity::Group(group.id))
    );
    assert!(!service.has_cluster_access(user.id, ClusterId(2)));
}

#[test]
fn test_wrong_scheme_is_malformed() {
    let extractor = IdentityExtractor::new(IdentityConfig::new("secret")).unwrap();
    let source = CredentialSource::new().with_authorization("Token abc");
    assert_eq!(extractor.extract(&source).unwrap_err(), IdentityError::MalformedCredential);
}

#[test]
fn test_request_flow_from_token_to_decision() {
    let extractor = IdentityExtractor::new(IdentityConfig::new("secret")).unwrap();
    let service = create_service();
    let user = service.store().insert_user(NewUser::new("alice", Role::User)).unwrap();
    service.grant_cluster_access(GrantSubject::User(user.id), ClusterId(8)).unwrap();

    let token = extractor
        .issue(
            &Claims::new(user.id).with_username("alice").with_auth_type(AuthType::Local),
            Duration::from_secs(300),
        )
        .unwrap();
    // Streaming transports pass the token in the query string.
    let source = CredentialSource::new().with_query_param("token", token);
    let principal = extractor.extract(&source).expect("valid token");

    assert_eq!(principal.user_id, user.id);
    assert!(service.authorize(&principal, ClusterId(8)).is_ok());
    assert!(service.authorize(&principal, ClusterId(9)).is_err());
}
