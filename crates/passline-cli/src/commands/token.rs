use std::io::Write;

use passline_auth::{AuthConfig, ClaimsPayload, IdentityResolver, RequestCarriers, TokenCodec};

use crate::pout;

pub fn cmd_issue(
    out: &mut impl Write,
    cfg: &AuthConfig,
    subject: &str,
    email: &str,
    json: bool,
) -> anyhow::Result<()> {
    let codec = TokenCodec::from_config(cfg);
    let claims = ClaimsPayload::new(subject, email)?;
    let token = codec.encode(&claims)?;
    let set_cookie = passline_auth::build_set_cookie(token.as_str(), &cfg.cookie)?;

    pout(
        out,
        json,
        serde_json::json!({
            "token": token.as_str(),
            "expires_in": codec.ttl().as_secs(),
            "set_cookie": set_cookie,
        }),
        token.as_str(),
    )
}

pub fn cmd_verify(
    out: &mut impl Write,
    cfg: &AuthConfig,
    token: &str,
    json: bool,
) -> anyhow::Result<()> {
    let codec = TokenCodec::from_config(cfg);
    let claims = codec.decode(token.trim())?;
    print_identity(out, &claims, json)
}

pub fn cmd_resolve(
    out: &mut impl Write,
    cfg: &AuthConfig,
    authorization: Option<&str>,
    cookie_header: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let codec = TokenCodec::from_config(cfg);
    let resolver = IdentityResolver::from_config(cfg, &codec)?;

    let mut request = RequestCarriers::new();
    if let Some(value) = authorization {
        request = request.with_authorization(value);
    }
    if let Some(header) = cookie_header {
        request = request.with_cookie_header(header);
    }

    match resolver.resolve_identity(&request) {
        Some(claims) => print_identity(out, &claims, json),
        None => {
            pout(out, json, serde_json::json!({"authenticated": false}), "unauthenticated")?;
            anyhow::bail!("unauthenticated");
        }
    }
}

fn print_identity(out: &mut impl Write, claims: &ClaimsPayload, json: bool) -> anyhow::Result<()> {
    pout(
        out,
        json,
        serde_json::json!({
            "authenticated": true,
            "claims": claims,
        }),
        &format!("{} <{}>", claims.subject_id, claims.email),
    )
}
