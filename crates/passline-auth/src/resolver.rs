//! Resolve the caller's identity from an inbound request.
//!
//! A request may carry its session token in the `Authorization` header or in
//! the session cookie. Carriers are searched in order and the first one that
//! yields a candidate wins; the candidate is then handed to a
//! [`TokenVerifier`]. Every failure collapses to `None`.

use crate::claims::ClaimsPayload;
use crate::codec::TokenVerifier;
use crate::config::AuthConfig;
use crate::cookie::AUTH_COOKIE_NAME;
use crate::Result;
use tracing::debug;

/// Scheme prefix of a bearer `Authorization` header (case-sensitive).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Read access to the places a request can carry a token.
pub trait CredentialCarriers {
    /// Raw `Authorization` header value, if any.
    fn authorization(&self) -> Option<&str>;

    /// Value of the cookie called `name`, if any.
    fn cookie(&self, name: &str) -> Option<&str>;
}

/// Owned request carriers, built from raw header strings.
#[derive(Debug, Clone, Default)]
pub struct RequestCarriers {
    authorization: Option<String>,
    cookies: Vec<(String, String)>,
}

impl RequestCarriers {
    /// Empty carriers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Authorization` header value.
    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Add every cookie from a `Cookie` header (`a=b; c=d`).
    #[must_use]
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        self.cookies.extend(
            parse_cookie_header(header).map(|(k, v)| (k.to_string(), v.to_string())),
        );
        self
    }

    /// Add a single cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }
}

impl CredentialCarriers for RequestCarriers {
    fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(feature = "http")]
impl CredentialCarriers for http::HeaderMap {
    fn authorization(&self) -> Option<&str> {
        self.get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.get_all(http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(parse_cookie_header)
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// Split a `Cookie` header into `(name, value)` pairs. Surrounding quotes on a
/// value are removed; fragments without `=` are skipped.
pub fn parse_cookie_header(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Some((name, value))
    })
}

/// A place on the request where a token may be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Carrier {
    /// `Authorization: Bearer <token>`.
    BearerHeader,
    /// Cookie with this name.
    Cookie(String),
}

impl Carrier {
    /// Candidate token from this carrier, if it has one.
    pub fn extract<'a, C>(&self, carriers: &'a C) -> Option<&'a str>
    where
        C: CredentialCarriers + ?Sized,
    {
        match self {
            Carrier::BearerHeader => carriers.authorization()?.strip_prefix(BEARER_PREFIX),
            Carrier::Cookie(name) => carriers.cookie(name),
        }
    }
}

/// Default search order: bearer header, then the `auth-token` cookie.
pub fn default_carriers() -> Vec<Carrier> {
    vec![
        Carrier::BearerHeader,
        Carrier::Cookie(AUTH_COOKIE_NAME.to_string()),
    ]
}

/// Turns request carriers into a verified identity.
#[derive(Debug, Clone)]
pub struct IdentityResolver<V> {
    verifier: V,
    carriers: Vec<Carrier>,
}

impl<V: TokenVerifier> IdentityResolver<V> {
    /// Resolver using the default carrier order.
    pub fn new(verifier: V) -> Self {
        Self::with_carriers(verifier, default_carriers())
    }

    /// Resolver searching `carriers` in the given order.
    pub fn with_carriers(verifier: V, carriers: Vec<Carrier>) -> Self {
        Self { verifier, carriers }
    }

    /// Bearer header first, then the cookie named by `cfg.cookie`.
    pub fn from_config(cfg: &AuthConfig, verifier: V) -> Result<Self> {
        let carriers = vec![
            Carrier::BearerHeader,
            Carrier::Cookie(cfg.cookie.cookie_name()?),
        ];
        Ok(Self::with_carriers(verifier, carriers))
    }

    /// Carrier search order.
    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    /// First carrier with a candidate, and that candidate.
    pub fn locate_token<'a, C>(&self, carriers: &'a C) -> Option<(&Carrier, &'a str)>
    where
        C: CredentialCarriers + ?Sized,
    {
        self.carriers
            .iter()
            .find_map(|carrier| carrier.extract(carriers).map(|token| (carrier, token)))
    }

    /// The caller's identity, or `None` if unauthenticated for any reason.
    pub fn resolve_identity<C>(&self, carriers: &C) -> Option<ClaimsPayload>
    where
        C: CredentialCarriers + ?Sized,
    {
        let (carrier, token) = self.locate_token(carriers)?;
        if token.is_empty() {
            debug!(?carrier, "empty session token");
            return None;
        }

        debug!(?carrier, "verifying session token");
        self.verifier.verify(token).ok()
    }
}
