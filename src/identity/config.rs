use jsonwebtoken::Algorithm;

/// Settings for [`IdentityExtractor`](super::IdentityExtractor).
///
/// Deserializable so an embedding service can load it from its own config
/// file. The verification secret is passed in here, never read from globals.
#[derive(Clone, serde::Deserialize)]
pub struct IdentityConfig {
    /// Shared HMAC secret used to verify (and issue) tokens.
    pub secret: String,
    /// Accepted signing algorithms. Only the HMAC family is allowed.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,
    /// Clock skew tolerated when checking `exp`/`nbf`, in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
    /// Query parameter consulted when no `Authorization` header is present.
    #[serde(default = "default_query_param")]
    pub query_param: String,
}

fn default_algorithms() -> Vec<Algorithm> {
    vec![Algorithm::HS256]
}

fn default_query_param() -> String {
    "token".to_string()
}

impl IdentityConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        IdentityConfig {
            secret: secret.into(),
            algorithms: default_algorithms(),
            leeway_secs: 0,
            query_param: default_query_param(),
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("secret", &"<redacted>")
            .field("algorithms", &self.algorithms)
            .field("leeway_secs", &self.leeway_secs)
            .field("query_param", &self.query_param)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_omitted() {
        let config: IdentityConfig = serde_json::from_str(r#"{"secret": "s3cret"}"#).unwrap();
        assert_eq!(config.algorithms, vec![Algorithm::HS256]);
        assert_eq!(config.leeway_secs, 0);
        assert_eq!(config.query_param, "token");
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", IdentityConfig::new("s3cret"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
