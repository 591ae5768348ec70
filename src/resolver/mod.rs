pub mod core;


pub use self::core::{AccessDecision, DenyReason, PermissionResolver};
