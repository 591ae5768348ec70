//! Request identity extraction.
//!
//! Turns a transport credential (a `Bearer` header, or a query-string token
//! for transports that cannot set headers) into a verified [`Principal`].
//! No authorization happens here; that is the resolver's job.

pub mod claims;
pub mod config;
pub mod extractor;

pub use claims::{Claims, Principal};
pub use config::IdentityConfig;
pub use extractor::{CredentialSource, IdentityExtractor};

/// Errors raised while establishing the identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// No credential in the header nor in the query string.
    #[error("Missing credential")]
    MissingCredential,
    /// An `Authorization` header that does not use the `Bearer` scheme.
    #[error("Malformed credential: expected `Bearer <token>`")]
    MalformedCredential,
    /// Signature, structure, expiry or claim validation failed.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
    #[error("Invalid identity configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to issue credential: {0}")]
    Issue(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;
