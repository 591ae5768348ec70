pub mod core;


// Re-export the primary type so callers can use `crate::registry::GroupRegistry`.
pub use self::core::GroupRegistry;
