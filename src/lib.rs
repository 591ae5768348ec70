#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Clusterauth-Core decides whether a principal may access a cluster.
//!
//! Access is binary per (user, cluster) pair and is recomputed on every
//! request from stored grants: a grant naming the user, a grant naming one of
//! the user's groups, or, failing both, the user's role. Groups let grants be
//! issued to many users at once; a group cannot be deleted while any grant
//! still names it.
//!
//! Persistence sits behind the traits in [`store`], and bearer credentials are
//! turned into a [`identity::Principal`] by [`identity::IdentityExtractor`].

// Identifier newtypes and role/status tags.
pub mod types;

// Users, groups, memberships and grants.
pub mod primitives;

pub use primitives::*;

pub mod error;

// Persistence interfaces and the in-memory backend.
pub mod store;

pub mod registry;

pub mod grants;

pub mod resolver;

pub mod identity;

pub mod service;

pub use service::AccessService;

#[cfg(feature = "telemetry")]
pub mod telemetry;
