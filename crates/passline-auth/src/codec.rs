//! Session token signing and verification.
//!
//! Tokens are compact HS256 JWTs (`header.claims.signature`, base64url without
//! padding). Both directions use the same [`SigningSecret`], injected once at
//! construction.

use crate::claims::{ClaimsPayload, TokenClaims};
use crate::config::{AuthConfig, SigningSecret};
use crate::{Error, Result};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Validity window of a token when nothing else is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const ALGORITHM: Algorithm = Algorithm::HS256;

/// A signed, self-contained session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Borrow the wire form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the wire form.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Why a token was refused.
///
/// Every variant means "no identity". The distinction exists for logs only
/// and is hidden behind one message when displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    /// Not a well-formed token, wrong algorithm, or unusable claims.
    #[error("invalid or expired token")]
    Malformed,
    /// Signature does not match the content under this secret.
    #[error("invalid or expired token")]
    InvalidSignature,
    /// Validity window has elapsed.
    #[error("invalid or expired token")]
    Expired,
}

/// Anything that can turn an untrusted token string into an identity.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`, returning its claims or a rejection.
    fn verify(&self, token: &str) -> std::result::Result<ClaimsPayload, Rejected>;
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for &T {
    fn verify(&self, token: &str) -> std::result::Result<ClaimsPayload, Rejected> {
        (**self).verify(token)
    }
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for Arc<T> {
    fn verify(&self, token: &str) -> std::result::Result<ClaimsPayload, Rejected> {
        (**self).verify(token)
    }
}

/// Mints and verifies session tokens under one signing secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenCodec {
    /// Build a codec for `secret` issuing tokens valid for `ttl`.
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked by `decode_at` so the boundary is exact and the
        // clock can be supplied by the caller.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Build a codec from the process configuration.
    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(&cfg.secret, cfg.token_ttl)
    }

    /// Lifetime given to newly minted tokens.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.unsigned_abs())
    }

    /// Mint a token for `claims`, issued now.
    pub fn encode(&self, claims: &ClaimsPayload) -> Result<Token> {
        self.encode_at(claims, SystemTime::now())
    }

    /// Mint a token for `claims` as if issued at `now`.
    pub fn encode_at(&self, claims: &ClaimsPayload, now: SystemTime) -> Result<Token> {
        claims.validate()?;

        let iat = now
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::Validation("issue time is before the Unix epoch".to_string()))?
            .as_secs();
        let iat = i64::try_from(iat)
            .map_err(|_| Error::Validation("issue time out of range".to_string()))?;

        let wire = TokenClaims {
            identity: claims.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_seconds),
        };

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &wire, &self.encoding_key)?;
        Ok(Token(token))
    }

    /// Verify `token` against the current time.
    pub fn decode(&self, token: &str) -> std::result::Result<ClaimsPayload, Rejected> {
        self.decode_at(token, SystemTime::now())
    }

    /// Verify `token` as of `now`. Rejects once `now` reaches the embedded expiry.
    pub fn decode_at(
        &self,
        token: &str,
        now: SystemTime,
    ) -> std::result::Result<ClaimsPayload, Rejected> {
        let result = self.check(token, now);
        if let Err(reason) = result {
            debug!(?reason, "session token rejected");
        }
        result
    }

    fn check(&self, token: &str, now: SystemTime) -> std::result::Result<ClaimsPayload, Rejected> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => Rejected::InvalidSignature,
                ErrorKind::ExpiredSignature => Rejected::Expired,
                _ => Rejected::Malformed,
            })?;

        let claims = data.claims;
        if claims.identity.subject_id.is_empty() {
            return Err(Rejected::Malformed);
        }

        let now_secs = now
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        if now_secs >= claims.exp {
            return Err(Rejected::Expired);
        }

        Ok(claims.identity)
    }
}

impl TokenVerifier for TokenCodec {
    fn verify(&self, token: &str) -> std::result::Result<ClaimsPayload, Rejected> {
        self.decode(token)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}
