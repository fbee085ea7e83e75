use std::io::Write;

use clap::Subcommand;
use passline_auth::{AuthConfig, build_clear_cookie, build_set_cookie};

use crate::pout;

#[derive(Debug, Subcommand)]
pub enum CookieCommands {
    /// Set-Cookie value handing a token to the client (login)
    Set { token: String },
    /// Set-Cookie value telling the client to drop its token (logout)
    Clear,
}

pub fn cmd_cookie(
    out: &mut impl Write,
    cfg: &AuthConfig,
    command: CookieCommands,
    json: bool,
) -> anyhow::Result<()> {
    let header = match command {
        CookieCommands::Set { token } => build_set_cookie(token.trim(), &cfg.cookie)?,
        CookieCommands::Clear => build_clear_cookie(&cfg.cookie)?,
    };
    pout(out, json, serde_json::json!({ "set_cookie": header }), &header)
}
