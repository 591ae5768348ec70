use std::sync::Arc;

use proptest::prelude::*;
use clusterauth_core::{
    primitives::{GrantSubject, NewUser},
    store::MemoryStore,
    types::{ClusterId, Role, UserId},
    AccessService,
};

const CLUSTERS: u64 = 4;

/// A randomly generated directory: users with roles, groups with members and
/// grants to either kind of subject.
#[derive(Debug, Clone)]
struct World {
    admins: Vec<bool>,
    /// memberships[g] = indices of users in group g
    memberships: Vec<Vec<usize>>,
    user_grants: Vec<(usize, u64)>,
    group_grants: Vec<(usize, u64)>,
}

fn world() -> impl Strategy<Value = World> {
    (1usize..6, 0usize..4).prop_flat_map(|(users, groups)| {
        (
            prop::collection::vec(any::<bool>(), users),
            prop::collection::vec(prop::collection::vec(0..users, 0..users + 1), groups),
            prop::collection::vec((0..users, 0..CLUSTERS), 0..6),
            if groups == 0 {
                Just(Vec::new()).boxed()
            } else {
                prop::collection::vec((0..groups, 0..CLUSTERS), 0..6).boxed()
            },
        )
            .prop_map(|(admins, memberships, user_grants, group_grants)| World {
                admins,
                memberships,
                user_grants,
                group_grants,
            })
    })
}

fn build(world: &World) -> (AccessService<MemoryStore>, Vec<UserId>) {
    let service = AccessService::new(MemoryStore::new_shared());
    let users: Vec<UserId> = world
        .admins
        .iter()
        .enumerate()
        .map(|(i, admin)| {
            let role = if *admin { Role::Admin } else { Role::User };
            service.store().insert_user(NewUser::new(format!("user-{}", i), role)).unwrap().id
        })
        .collect();
    let groups: Vec<_> = world
        .memberships
        .iter()
        .enumerate()
        .map(|(g, members)| {
            let group = service.create_user_group(&format!("group-{}", g), "").unwrap();
            for m in members {
                service.add_user_to_group(group.id, users[*m]).unwrap();
            }
            group.id
        })
        .collect();
    for (u, c) in &world.user_grants {
        service.grant_cluster_access(GrantSubject::User(users[*u]), ClusterId(*c)).unwrap();
    }
    for (g, c) in &world.group_grants {
        service.grant_cluster_access(GrantSubject::Group(groups[*g]), ClusterId(*c)).unwrap();
    }
    (service, users)
}

/// Reference answer computed directly from the generated world.
fn expected(world: &World, user: usize, cluster: u64) -> bool {
    let direct = world.user_grants.iter().any(|(u, c)| *u == user && *c == cluster);
    let via_group = world
        .group_grants
        .iter()
        .any(|(g, c)| *c == cluster && world.memberships[*g].contains(&user));
    direct || via_group || world.admins[user]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Access is the OR of direct grants, group grants and the admin role.
    #[test]
    fn prop_access_matches_reference_model(world in world()) {
        let (service, users) = build(&world);
        for (i, user) in users.iter().enumerate() {
            for cluster in 0..CLUSTERS {
                prop_assert_eq!(
                    service.has_cluster_access(*user, ClusterId(cluster)),
                    expected(&world, i, cluster),
                    "user index {} cluster {}", i, cluster
                );
            }
        }
    }

    /// Admins reach every cluster, even with zero stored grants.
    #[test]
    fn prop_admin_reaches_every_cluster(cluster in any::<u64>()) {
        let service = AccessService::new(Arc::new(MemoryStore::new()));
        let admin = service.store().insert_user(NewUser::new("root", Role::Admin)).unwrap();
        prop_assert!(service.has_cluster_access(admin.id, ClusterId(cluster)));
    }

    /// Unknown users are denied without an error.
    #[test]
    fn prop_unknown_user_is_denied(user in 1u64.., cluster in any::<u64>()) {
        let service = AccessService::new(Arc::new(MemoryStore::new()));
        prop_assert!(!service.has_cluster_access(UserId(user), ClusterId(cluster)));
    }
}
