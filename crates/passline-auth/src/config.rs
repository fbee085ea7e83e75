//! Process-wide configuration: signing secret, token lifetime, cookie policy.
//!
//! Everything here is built once at start-up and then shared read-only.
//! A missing or unusable secret is a hard [`Error::Config`]; there is no
//! built-in default secret.

use crate::codec::DEFAULT_TOKEN_TTL;
use crate::cookie::{CookieOptions, SameSite};
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Primary environment variable holding the signing secret.
pub const SECRET_ENV: &str = "PASSLINE_JWT_SECRET";

/// Conventional name, consulted when [`SECRET_ENV`] is unset.
pub const SECRET_ENV_FALLBACK: &str = "JWT_SECRET";

/// Optional override for the token lifetime, in seconds.
pub const TOKEN_TTL_ENV: &str = "PASSLINE_TOKEN_TTL_SECONDS";

/// Shortest accepted secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Longest accepted token lifetime or cookie Max-Age (10 years).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

// Well-known placeholder shipped by older deployments.
const KNOWN_WEAK_SECRETS: &[&str] = &["fallback-secret"];

/// Symmetric key used to sign and verify tokens.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Validate and wrap a secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = secret.into();
        let trimmed = bytes.trim_ascii();
        if trimmed.is_empty() {
            return Err(Error::Config("signing secret is empty".to_string()));
        }
        if KNOWN_WEAK_SECRETS.iter().any(|weak| weak.as_bytes() == trimmed) {
            return Err(Error::Config(
                "signing secret is a well-known placeholder".to_string(),
            ));
        }
        if bytes.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Authentication settings shared by the codec, resolver and cookie helpers.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Signing secret.
    pub secret: SigningSecret,
    /// Validity window of newly minted tokens.
    pub token_ttl: Duration,
    /// Session cookie policy.
    pub cookie: CookieOptions,
}

impl AuthConfig {
    /// Config with the default 7-day lifetime and cookie policy.
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            token_ttl: DEFAULT_TOKEN_TTL,
            cookie: CookieOptions::default(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup_secret(&lookup, SECRET_ENV)?;

        let token_ttl = match lookup(TOKEN_TTL_ENV) {
            Some(raw) => parse_ttl(&raw)?,
            None => DEFAULT_TOKEN_TTL,
        };

        let mut cfg = Self::new(secret);
        cfg.set_token_ttl(token_ttl)?;
        Ok(cfg)
    }

    /// Load a `passline.toml` file. The secret is read from the environment
    /// variable the file names.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, |key| std::env::var(key).ok())
    }

    /// Parse TOML config text, resolving the secret through `lookup`.
    pub fn from_toml_str<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = toml::from_str(content)?;

        let secret_env = raw.secret_env.as_deref().unwrap_or(SECRET_ENV);
        let secret = lookup_secret(&lookup, secret_env)?;

        let mut cfg = Self::new(secret);
        if let Some(secs) = raw.token_ttl_seconds {
            cfg.set_token_ttl(Duration::from_secs(secs))?;
        }
        raw.cookie.apply(&mut cfg.cookie)?;
        cfg.cookie.cookie_name()?;
        Ok(cfg)
    }

    fn set_token_ttl(&mut self, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(Error::Config("token lifetime must be positive".to_string()));
        }
        check_max_age(ttl.as_secs())?;
        self.token_ttl = ttl;
        self.cookie.max_age_seconds = Some(ttl.as_secs());
        Ok(())
    }
}

/// Reads `primary`, then [`SECRET_ENV_FALLBACK`].
fn lookup_secret<F>(lookup: &F, primary: &str) -> Result<SigningSecret>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = lookup(primary)
        .or_else(|| lookup(SECRET_ENV_FALLBACK))
        .ok_or_else(|| {
            Error::Config(format!("{primary} (or {SECRET_ENV_FALLBACK}) is not set"))
        })?;
    SigningSecret::new(secret)
}

fn check_max_age(secs: u64) -> Result<()> {
    if secs > MAX_TOKEN_TTL.as_secs() {
        return Err(Error::Config(format!(
            "lifetime of {secs}s exceeds the maximum of {}s",
            MAX_TOKEN_TTL.as_secs()
        )));
    }
    Ok(())
}

fn parse_ttl(raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| Error::Config(format!("invalid {TOKEN_TTL_ENV} {raw:?}: {e}")))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    secret_env: Option<String>,
    token_ttl_seconds: Option<u64>,
    #[serde(default)]
    cookie: RawCookie,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCookie {
    name: Option<String>,
    path: Option<String>,
    domain: Option<String>,
    secure: Option<bool>,
    http_only: Option<bool>,
    same_site: Option<SameSite>,
    max_age_seconds: Option<u64>,
    use_host_prefix: Option<bool>,
}

impl RawCookie {
    fn apply(self, opts: &mut CookieOptions) -> Result<()> {
        if let Some(name) = self.name {
            opts.name = name;
        }
        if let Some(path) = self.path {
            opts.path = path;
        }
        if self.domain.is_some() {
            opts.domain = self.domain;
        }
        if let Some(secure) = self.secure {
            opts.secure = secure;
        }
        if let Some(http_only) = self.http_only {
            opts.http_only = http_only;
        }
        if let Some(same_site) = self.same_site {
            opts.same_site = same_site;
        }
        if let Some(max_age) = self.max_age_seconds {
            check_max_age(max_age)?;
            opts.max_age_seconds = Some(max_age);
        }
        if let Some(prefix) = self.use_host_prefix {
            opts.use_host_prefix = prefix;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_secret_fails() {
        let err = AuthConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn weak_secrets_rejected() {
        assert!(SigningSecret::new("").is_err());
        assert!(SigningSecret::new("   ").is_err());
        assert!(SigningSecret::new("short").is_err());
        assert!(SigningSecret::new("fallback-secret").is_err());

        let padded = SigningSecret::new("  fallback-secret  ").unwrap_err();
        assert!(padded.to_string().contains("placeholder"), "{padded}");
    }

    #[test]
    fn primary_env_wins_over_fallback() {
        let cfg = AuthConfig::from_lookup(env(&[
            (SECRET_ENV, SECRET),
            (SECRET_ENV_FALLBACK, "another-secret-value-entirely"),
        ]))
        .unwrap();
        assert_eq!(cfg.secret.as_bytes(), SECRET.as_bytes());
        assert_eq!(cfg.token_ttl, DEFAULT_TOKEN_TTL);
    }

    #[test]
    fn fallback_env_is_used() {
        let cfg = AuthConfig::from_lookup(env(&[(SECRET_ENV_FALLBACK, SECRET)])).unwrap();
        assert_eq!(cfg.secret.as_bytes(), SECRET.as_bytes());
    }

    #[test]
    fn ttl_override() {
        let cfg =
            AuthConfig::from_lookup(env(&[(SECRET_ENV, SECRET), (TOKEN_TTL_ENV, "3600")])).unwrap();
        assert_eq!(cfg.token_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.cookie.max_age_seconds, Some(3600));

        assert!(AuthConfig::from_lookup(env(&[(SECRET_ENV, SECRET), (TOKEN_TTL_ENV, "soon")])).is_err());
        assert!(AuthConfig::from_lookup(env(&[(SECRET_ENV, SECRET), (TOKEN_TTL_ENV, "0")])).is_err());
    }

    #[test]
    fn oversized_lifetimes_rejected() {
        let err = AuthConfig::from_lookup(env(&[
            (SECRET_ENV, SECRET),
            (TOKEN_TTL_ENV, "400000000000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let limit = MAX_TOKEN_TTL.as_secs().to_string();
        let cfg =
            AuthConfig::from_lookup(env(&[(SECRET_ENV, SECRET), (TOKEN_TTL_ENV, limit.as_str())]))
                .unwrap();
        assert!(crate::build_set_cookie("abc.def.ghi", &cfg.cookie).is_ok());

        let toml_ttl = "token_ttl_seconds = 400000000000";
        let err = AuthConfig::from_toml_str(toml_ttl, env(&[(SECRET_ENV, SECRET)])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let toml_max_age = "[cookie]\nmax_age_seconds = 400000000000";
        let err =
            AuthConfig::from_toml_str(toml_max_age, env(&[(SECRET_ENV, SECRET)])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn toml_secret_falls_back_to_conventional_env() {
        let cfg = AuthConfig::from_toml_str("", env(&[(SECRET_ENV_FALLBACK, SECRET)])).unwrap();
        assert_eq!(cfg.secret.as_bytes(), SECRET.as_bytes());

        let named = "secret_env = \"APP_SECRET\"";
        let cfg = AuthConfig::from_toml_str(named, env(&[(SECRET_ENV_FALLBACK, SECRET)])).unwrap();
        assert_eq!(cfg.secret.as_bytes(), SECRET.as_bytes());
    }

    #[test]
    fn debug_redacts_secret() {
        let secret = SigningSecret::new(SECRET).unwrap();
        assert!(!format!("{secret:?}").contains(SECRET));
    }

    #[test]
    fn toml_config() {
        let text = r#"
secret_env = "APP_SECRET"
token_ttl_seconds = 86400

[cookie]
name = "session"
same_site = "Strict"
secure = false
"#;
        let cfg = AuthConfig::from_toml_str(text, env(&[("APP_SECRET", SECRET)])).unwrap();
        assert_eq!(cfg.token_ttl, Duration::from_secs(86400));
        assert_eq!(cfg.cookie.name, "session");
        assert_eq!(cfg.cookie.same_site, SameSite::Strict);
        assert!(!cfg.cookie.secure);
        assert_eq!(cfg.cookie.max_age_seconds, Some(86400));
    }

    #[test]
    fn shipped_example_config_loads() {
        let text = include_str!("../../../docs/passline.toml.example");
        let cfg = AuthConfig::from_toml_str(text, env(&[(SECRET_ENV, SECRET)])).unwrap();
        assert_eq!(cfg.token_ttl, DEFAULT_TOKEN_TTL);
        assert_eq!(cfg.cookie.cookie_name().unwrap(), "auth-token");
    }

    #[test]
    fn toml_config_requires_secret() {
        let err = AuthConfig::from_toml_str("", env(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = AuthConfig::from_toml_str("secret = \"inline\"", env(&[(SECRET_ENV, SECRET)]))
            .unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
