//! Typed token claims.
//!
//! The subject is checked at parse time: a token whose `user_id` is not a
//! non-negative integer never becomes a `Claims` value.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{AuthType, UserId};

/// Claims this crate reads from a verified token. Other claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "deserialize_user_id")]
    pub user_id: UserId,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,
}

impl Claims {
    pub fn new(user_id: UserId) -> Self {
        Claims { user_id, username: None, auth_type: None }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = Some(auth_type);
        self
    }
}

/// The verified identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: Option<String>,
    pub auth_type: Option<AuthType>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal {
            user_id: claims.user_id,
            username: claims.username,
            auth_type: claims.auth_type,
        }
    }
}

/// Accepts JSON integers and integral floats. Issuers written in dynamically
/// typed languages often encode every number as a float.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n,
        other => return Err(D::Error::custom(format!("user_id must be numeric, got {}", other))),
    };
    if let Some(id) = number.as_u64() {
        return Ok(UserId(id));
    }
    match number.as_f64() {
        // `u64::MAX as f64` rounds up to 2^64, which is already out of range.
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(UserId(f as u64)),
        _ => Err(D::Error::custom(format!("user_id must be a non-negative integer, got {}", number))),
    }
}

/// Optional metadata: a value of the wrong type is dropped, not rejected.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_integral_float_user_ids_parse() {
        let a: Claims = serde_json::from_str(r#"{"user_id": 12}"#).unwrap();
        let b: Claims = serde_json::from_str(r#"{"user_id": 12.0}"#).unwrap();
        assert_eq!(a.user_id, UserId(12));
        assert_eq!(a, b);
    }

    #[test]
    fn non_integer_user_ids_are_rejected() {
        for raw in [
            r#"{"user_id": "12"}"#,
            r#"{"user_id": 1.5}"#,
            r#"{"user_id": -3}"#,
            r#"{"user_id": null}"#,
            r#"{"username": "alice"}"#,
        ] {
            assert!(serde_json::from_str::<Claims>(raw).is_err(), "accepted {}", raw);
        }
    }

    #[test]
    fn float_user_ids_beyond_u64_are_rejected_not_clamped() {
        for raw in [r#"{"user_id": 18446744073709551616.0}"#, r#"{"user_id": 1e20}"#] {
            assert!(serde_json::from_str::<Claims>(raw).is_err(), "accepted {}", raw);
        }
        let max: Claims = serde_json::from_str(r#"{"user_id": 18446744073709551615}"#).unwrap();
        assert_eq!(max.user_id, UserId(u64::MAX));
        let large: Claims = serde_json::from_str(r#"{"user_id": 9007199254740992.0}"#).unwrap();
        assert_eq!(large.user_id, UserId(1 << 53));
    }

    #[test]
    fn optional_metadata_is_carried_through() {
        let claims: Claims =
            serde_json::from_str(r#"{"user_id": 3, "username": "bob", "auth_type": "ldap", "exp": 1}"#)
                .unwrap();
        let principal = Principal::from(claims);
        assert_eq!(principal.username.as_deref(), Some("bob"));
        assert_eq!(principal.auth_type, Some(AuthType::Ldap));
    }

    #[test]
    fn mistyped_metadata_is_dropped() {
        let claims: Claims = serde_json::from_str(r#"{"user_id": 3, "username": 42}"#).unwrap();
        assert_eq!(claims.username, None);
    }
}
