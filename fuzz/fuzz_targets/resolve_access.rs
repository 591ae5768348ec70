#![no_main]

// Harness: random directories and grant sets. Checks that group deletion is
// refused while referenced and that decisions match the grant/role rules.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use clusterauth_core::{
    primitives::{GrantSubject, NewUser},
    store::{GrantStore, MemoryStore},
    types::{ClusterId, Role},
    AccessService,
};

#[derive(Arbitrary, Debug)]
enum Op {
    AddMember { group: u8, user: u8 },
    RemoveMember { group: u8, user: u8 },
    GrantUser { user: u8, cluster: u8 },
    GrantGroup { group: u8, cluster: u8 },
    DeleteGroup { group: u8 },
}

#[derive(Arbitrary, Debug)]
struct World {
    admins: Vec<bool>,
    groups: u8,
    ops: Vec<Op>,
}

fuzz_target!(|world: World| {
    let service = AccessService::new(MemoryStore::new_shared());
    let users: Vec<_> = world
        .admins
        .iter()
        .take(16)
        .enumerate()
        .filter_map(|(i, admin)| {
            let role = if *admin { Role::Admin } else { Role::User };
            service.store().insert_user(NewUser::new(format!("u{}", i), role)).ok()
        })
        .collect();
    let groups: Vec<_> = (0..world.groups % 8)
        .filter_map(|g| service.create_user_group(&format!("g{}", g), "").ok())
        .collect();
    if users.is_empty() || groups.is_empty() {
        return;
    }
    let user = |i: u8| &users[i as usize % users.len()];
    let group = |i: u8| &groups[i as usize % groups.len()];

    for op in world.ops.iter().take(64) {
        match *op {
            Op::AddMember { group: g, user: u } => {
                let _ = service.add_user_to_group(group(g).id, user(u).id);
            }
            Op::RemoveMember { group: g, user: u } => {
                let _ = service.remove_user_from_group(group(g).id, user(u).id);
            }
            Op::GrantUser { user: u, cluster } => {
                let _ = service.grant_cluster_access(GrantSubject::User(user(u).id), ClusterId(cluster.into()));
            }
            Op::GrantGroup { group: g, cluster } => {
                let _ = service.grant_cluster_access(GrantSubject::Group(group(g).id), ClusterId(cluster.into()));
            }
            Op::DeleteGroup { group: g } => {
                let id = group(g).id;
                let referenced = service.store().count_grants_for_group(id).unwrap_or(0) > 0;
                let deleted = service.delete_user_group(id).is_ok();
                assert!(!(referenced && deleted), "referenced group {} was deleted", id);
            }
        }
    }

    for u in &users {
        for cluster in 0..4u64 {
            if u.role == Role::Admin {
                assert!(service.has_cluster_access(u.id, ClusterId(cluster)));
            }
        }
    }
});
