use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use super::{Claims, IdentityConfig, IdentityError, IdentityResult, Principal};

const BEARER_PREFIX: &str = "Bearer ";

/// Transport-neutral view of where a request may carry its credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSource {
    /// Raw `Authorization` header value, if the header was sent.
    pub authorization: Option<String>,
    /// Decoded query-string pairs.
    pub query: Vec<(String, String)>,
}

impl CredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Verifies request credentials and yields the principal behind them.
pub struct IdentityExtractor {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
    signing_alg: Algorithm,
    query_param: String,
}

impl std::fmt::Debug for IdentityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityExtractor")
            .field("algorithms", &self.validation.algorithms)
            .field("query_param", &self.query_param)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct IssuedClaims<'a> {
    #[serde(flatten)]
    claims: &'a Claims,
    iat: u64,
    exp: u64,
}

impl IdentityExtractor {
    pub fn new(config: IdentityConfig) -> IdentityResult<Self> {
        if config.secret.is_empty() {
            return Err(IdentityError::InvalidConfig("secret must not be empty".into()));
        }
        let signing_alg = *config
            .algorithms
            .first()
            .ok_or_else(|| IdentityError::InvalidConfig("no algorithms configured".into()))?;
        if let Some(alg) = config
            .algorithms
            .iter()
            .find(|alg| !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
        {
            return Err(IdentityError::InvalidConfig(format!(
                "{:?} is not a shared-secret algorithm",
                alg
            )));
        }

        let mut validation = Validation::new(signing_alg);
        validation.algorithms = config.algorithms.clone();
        validation.leeway = config.leeway_secs;
        // `exp` is checked when present but not mandatory.
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;

        Ok(IdentityExtractor {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            validation,
            signing_alg,
            query_param: config.query_param,
        })
    }

    /// Pulls the raw token out of the request. A present header wins over the
    /// query string, and a header with any scheme other than `Bearer` is
    /// rejected rather than treated as a raw token.
    pub fn raw_token<'a>(&self, source: &'a CredentialSource) -> IdentityResult<&'a str> {
        let token = match source.authorization.as_deref().filter(|h| !h.is_empty()) {
            Some(header) => header
                .strip_prefix(BEARER_PREFIX)
                .ok_or(IdentityError::MalformedCredential)?,
            None => source.query_value(&self.query_param).unwrap_or_default(),
        };
        if token.is_empty() {
            return Err(IdentityError::MissingCredential);
        }
        Ok(token)
    }

    /// Verifies a raw token and returns its typed claims.
    pub fn verify(&self, token: &str) -> IdentityResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| IdentityError::InvalidCredential(err.to_string()))
    }

    /// Full extraction: locate, verify and convert into a principal.
    pub fn extract(&self, source: &CredentialSource) -> IdentityResult<Principal> {
        let result = self.raw_token(source).and_then(|token| self.verify(token));
        match result {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.user_id, "request principal established");
                Ok(claims.into())
            }
            Err(err) => {
                tracing::warn!(error = %err, "request credential rejected");
                Err(err)
            }
        }
    }

    /// Mints a token for `claims` that expires after `ttl`, signed with the
    /// first configured algorithm.
    pub fn issue(&self, claims: &Claims, ttl: Duration) -> IdentityResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0))
            .as_secs();
        let body = IssuedClaims {
            claims,
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        };
        jsonwebtoken::encode(&Header::new(self.signing_alg), &body, &self.encoding_key)
            .map_err(|err| IdentityError::Issue(err.to_string()))
    }
}
