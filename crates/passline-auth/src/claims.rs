//! Identity carried inside a session token.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// The authenticated identity asserted by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPayload {
    /// Opaque unique identifier of the principal.
    #[serde(rename = "userId")]
    pub subject_id: String,

    /// Display/audit only. Never used for authorization.
    pub email: String,
}

impl ClaimsPayload {
    /// Build a payload, rejecting empty fields.
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let claims = Self {
            subject_id: subject_id.into(),
            email: email.into(),
        };
        claims.validate()?;
        Ok(claims)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.subject_id.is_empty() {
            return Err(Error::Validation("subject id must not be empty".to_string()));
        }
        if self.email.is_empty() {
            return Err(Error::Validation("email must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Payload as it appears on the wire: identity plus validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    #[serde(flatten)]
    pub identity: ClaimsPayload,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}
