//! Session cookie helpers for the login and logout flows.

use crate::codec::DEFAULT_TOKEN_TTL;
use crate::{Error, Result};
use httpdate::fmt_http_date;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE_NAME: &str = "auth-token";

// 9999-12-31T23:59:59Z, the last instant an HTTP date can express.
const LAST_HTTP_DATE_SECS: u64 = 253_402_300_799;

/// SameSite attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    /// SameSite=Strict
    Strict,
    /// SameSite=Lax
    Lax,
    /// SameSite=None
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Options used to build the session cookie.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    /// Cookie name (without any prefix).
    pub name: String,

    /// Cookie path.
    pub path: String,

    /// Optional cookie domain.
    pub domain: Option<String>,

    /// Send on HTTPS only.
    pub secure: bool,

    /// Not accessible to JS.
    pub http_only: bool,

    /// SameSite attribute.
    pub same_site: SameSite,

    /// Max-Age in seconds. Defaults to the token lifetime.
    pub max_age_seconds: Option<u64>,

    /// If true and `domain` is None, the cookie name is prefixed with `__Host-`,
    /// which requires `path=/` and `secure=true`.
    pub use_host_prefix: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: AUTH_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            max_age_seconds: Some(DEFAULT_TOKEN_TTL.as_secs()),
            use_host_prefix: false,
        }
    }
}

impl CookieOptions {
    /// Effective cookie name, as sent by the browser.
    pub fn cookie_name(&self) -> Result<String> {
        if self.name.is_empty() || !self.name.bytes().all(is_token_char) {
            return Err(Error::Validation(format!(
                "invalid cookie name {:?}",
                self.name
            )));
        }

        if self.use_host_prefix && self.domain.is_none() {
            if self.path != "/" {
                return Err(Error::Validation(
                    "__Host- cookies must have Path=/".to_string(),
                ));
            }
            if !self.secure {
                return Err(Error::Validation(
                    "__Host- cookies must be Secure".to_string(),
                ));
            }
            Ok(format!(
                "__Host-{}",
                self.name.trim_start_matches("__Host-")
            ))
        } else {
            Ok(self.name.clone())
        }
    }

    fn push_attributes(&self, parts: &mut Vec<String>) {
        parts.push(format!("Path={}", self.path));

        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={domain}"));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        parts.push(format!("SameSite={}", self.same_site.as_str()));
    }
}

/// Build the `Set-Cookie` value that hands a freshly minted token to the client.
pub fn build_set_cookie(token: &str, opts: &CookieOptions) -> Result<String> {
    let name = opts.cookie_name()?;
    if token.is_empty() || !token.bytes().all(is_cookie_octet) {
        return Err(Error::Validation(
            "token is not a valid cookie value".to_string(),
        ));
    }

    let mut parts = vec![format!("{name}={token}")];
    opts.push_attributes(&mut parts);

    if let Some(max_age) = opts.max_age_seconds {
        parts.push(format!("Max-Age={max_age}"));
        // Expires for older clients.
        let expires = SystemTime::now()
            .checked_add(Duration::from_secs(max_age))
            .filter(|t| *t <= UNIX_EPOCH + Duration::from_secs(LAST_HTTP_DATE_SECS))
            .ok_or_else(|| {
                Error::Validation(format!("Max-Age={max_age} is beyond the last HTTP date"))
            })?;
        parts.push(format!("Expires={}", fmt_http_date(expires)));
    }

    Ok(parts.join("; "))
}

/// Build the `Set-Cookie` value that tells the client to discard its token.
pub fn build_clear_cookie(opts: &CookieOptions) -> Result<String> {
    let name = opts.cookie_name()?;

    let mut parts = vec![format!("{name}=")];
    opts.push_attributes(&mut parts);
    parts.push("Max-Age=0".to_string());
    parts.push(format!("Expires={}", fmt_http_date(UNIX_EPOCH)));

    Ok(parts.join("; "))
}

// RFC 6265 cookie-octet.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

// RFC 7230 tchar, used for cookie names.
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cookie() {
        let opts = CookieOptions::default();
        let sc = build_set_cookie("abc.def.ghi", &opts).unwrap();
        assert!(sc.starts_with("auth-token=abc.def.ghi; Path=/"));
        assert!(sc.contains("Secure"));
        assert!(sc.contains("HttpOnly"));
        assert!(sc.contains("SameSite=Lax"));
        assert!(sc.contains("Max-Age=604800"));
        assert!(sc.contains("Expires="));
    }

    #[test]
    fn host_cookie_name() {
        let opts = CookieOptions {
            use_host_prefix: true,
            ..Default::default()
        };
        assert_eq!(opts.cookie_name().unwrap(), "__Host-auth-token");

        let bad = CookieOptions {
            use_host_prefix: true,
            secure: false,
            ..Default::default()
        };
        assert!(bad.cookie_name().is_err());
    }

    #[test]
    fn clear_cookie_has_max_age_zero() {
        let opts = CookieOptions::default();
        let sc = build_clear_cookie(&opts).unwrap();
        assert!(sc.starts_with("auth-token=;"));
        assert!(sc.contains("Max-Age=0"));
        assert!(sc.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn rejects_unsafe_values() {
        let opts = CookieOptions::default();
        assert!(build_set_cookie("a;b", &opts).is_err());
        assert!(build_set_cookie("a b", &opts).is_err());
        assert!(build_set_cookie("", &opts).is_err());

        let bad_name = CookieOptions {
            name: "auth token".to_string(),
            ..Default::default()
        };
        assert!(build_clear_cookie(&bad_name).is_err());
    }

    #[test]
    fn unrepresentable_max_age_is_an_error() {
        for max_age in [400_000_000_000, u64::MAX] {
            let opts = CookieOptions {
                max_age_seconds: Some(max_age),
                ..Default::default()
            };
            let err = build_set_cookie("abc.def.ghi", &opts).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{err}");
        }
    }
}
