//! passline-auth
//!
//! Session token core for web applications:
//!
//! - **Minting and verifying signed session tokens** (HS256, fixed validity window)
//! - **Resolving the caller's identity** from the `Authorization` header or session cookie
//! - **Building session cookies** for login and logout responses
//!
//! The signing secret is loaded once at start-up ([`AuthConfig::from_env`]) and
//! injected into a [`TokenCodec`]. A missing secret is a configuration error;
//! there is no default.
//!
//! ## Quick start
//! ```no_run
//! use passline_auth::{AuthConfig, ClaimsPayload, IdentityResolver, RequestCarriers, TokenCodec};
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = AuthConfig::from_env()?;
//! let codec = TokenCodec::from_config(&cfg);
//!
//! // Login flow: credentials were checked elsewhere.
//! let token = codec.encode(&ClaimsPayload::new("u1", "a@example.com")?)?;
//!
//! // Request gate.
//! let resolver = IdentityResolver::new(&codec);
//! let request = RequestCarriers::new().with_authorization(format!("Bearer {token}"));
//! match resolver.resolve_identity(&request) {
//!     Some(claims) => println!("caller={}", claims.subject_id),
//!     None => println!("unauthenticated"),
//! }
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]

mod claims;
mod codec;
mod config;
mod cookie;
mod error;
mod resolver;

pub use claims::ClaimsPayload;
pub use codec::{DEFAULT_TOKEN_TTL, Rejected, Token, TokenCodec, TokenVerifier};
pub use config::{
    AuthConfig, MAX_TOKEN_TTL, MIN_SECRET_LEN, SECRET_ENV, SECRET_ENV_FALLBACK, SigningSecret, TOKEN_TTL_ENV,
};
pub use cookie::{AUTH_COOKIE_NAME, CookieOptions, SameSite, build_clear_cookie, build_set_cookie};
pub use error::{Error, Result};
pub use resolver::{
    BEARER_PREFIX, Carrier, CredentialCarriers, IdentityResolver, RequestCarriers,
    default_carriers, parse_cookie_header,
};

