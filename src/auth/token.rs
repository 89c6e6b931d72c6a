use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by the bearer tokens this service accepts.
///
/// The issuer puts the user id in `id`; `sub` is accepted as well so standard
/// JWT tooling can mint compatible tokens. When both are present `id` wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            iat: Some(chrono::Utc::now().timestamp()),
            ..Self::default()
        }
    }

    pub fn expires_in(mut self, duration: chrono::Duration) -> Self {
        self.exp = Some((chrono::Utc::now() + duration).timestamp());
        self
    }

    /// User id the token speaks for, if any non-blank one is present
    pub fn subject(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.sub.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Identity of the caller for the duration of one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

impl TryFrom<Claims> for Principal {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let subject = claims
            .subject()
            .ok_or_else(|| TokenError::Invalid("token has no subject".to_string()))?;
        Ok(Self {
            subject: subject.to_string(),
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("no credential supplied")]
    Missing,

    #[error("invalid credential: {0}")]
    Invalid(String),
}

/// Verifies HS256 bearer tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is checked when present but the issuer is allowed to omit it
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw credential, with or without the `Bearer ` prefix.
    ///
    /// An empty `raw` is `Missing`. Anything else that does not decode,
    /// including a bare `Bearer ` prefix, is `Invalid`.
    pub fn verify(&self, raw: &str) -> Result<Principal, TokenError> {
        if raw.is_empty() {
            return Err(TokenError::Missing);
        }

        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if token.is_empty() {
            return Err(TokenError::Invalid("empty bearer token".to_string()));
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        Principal::try_from(token_data.claims)
    }

    /// Sign claims with the same secret. Used by tooling and tests; the HTTP
    /// surface never issues tokens.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}
