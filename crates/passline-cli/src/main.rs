mod commands;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use passline_auth::AuthConfig;
use tracing_subscriber::EnvFilter;

use crate::commands::cookie::{self, CookieCommands};
use crate::commands::token;

#[derive(Debug, Parser)]
#[command(name = "passline", about = "Passline CLI: mint, verify and resolve session tokens")]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    /// passline.toml; without it the environment is used
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Mint a token for an already-authenticated user
    Issue {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        email: String,
    },
    /// Verify a token and print its identity
    Verify { token: String },
    /// Resolve the caller from request headers
    Resolve {
        /// Authorization header value
        #[arg(long)]
        authorization: Option<String>,
        /// Cookie header value
        #[arg(long)]
        cookie: Option<String>,
    },
    /// Session cookie headers
    Cookie {
        #[command(subcommand)]
        command: CookieCommands,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Issue { subject, email } => {
            token::cmd_issue(&mut out, &cfg, &subject, &email, cli.json)?;
        }
        Commands::Verify { token } => token::cmd_verify(&mut out, &cfg, &token, cli.json)?,
        Commands::Resolve {
            authorization,
            cookie,
        } => token::cmd_resolve(
            &mut out,
            &cfg,
            authorization.as_deref(),
            cookie.as_deref(),
            cli.json,
        )?,
        Commands::Cookie { command } => cookie::cmd_cookie(&mut out, &cfg, command, cli.json)?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Fails when no usable signing secret is configured.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AuthConfig> {
    let cfg = match path {
        Some(p) => AuthConfig::from_file(p)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", p.display()))?,
        None => AuthConfig::from_env()?,
    };
    tracing::debug!(ttl_seconds = cfg.token_ttl.as_secs(), "auth config loaded");
    Ok(cfg)
}

pub fn pout(
    out: &mut impl Write,
    json_mode: bool,
    value: serde_json::Value,
    text: &str,
) -> anyhow::Result<()> {
    if json_mode {
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(out, "{text}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_flags_parse() {
        let cli = Cli::try_parse_from([
            "passline",
            "--json",
            "resolve",
            "--authorization",
            "Bearer abc",
            "--cookie",
            "auth-token=xyz",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Resolve {
                authorization,
                cookie,
            } => {
                assert_eq!(authorization.as_deref(), Some("Bearer abc"));
                assert_eq!(cookie.as_deref(), Some("auth-token=xyz"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
