// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

/// Session supervisor for long-running interactive AI-coding CLI processes.
#[derive(Debug, Parser)]
#[command(name = "keeperd", version, about)]
pub struct Config {
    /// HTTP port to listen on.
    #[arg(long, env = "KEEPER_PORT", default_value = "7190")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "KEEPER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Directory holding persisted session/pane/lifetime-stats state.
    #[arg(long, env = "KEEPER_STATE_DIR", default_value = "./keeper-state")]
    pub state_dir: PathBuf,

    /// Maximum number of concurrently supervised sessions.
    #[arg(long, env = "KEEPER_MAX_SESSIONS", default_value = "64")]
    pub max_sessions: usize,

    /// Multiplexer backend (tmux or screen).
    #[arg(long, env = "KEEPER_MUX", default_value = "tmux")]
    pub mux: String,

    /// Bearer token required on every request; unset disables auth (local/dev only).
    #[arg(long, env = "KEEPER_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Idle-check oracle endpoint (AI completion API); unset disables the oracle tier.
    #[arg(long, env = "KEEPER_ORACLE_URL")]
    pub oracle_url: Option<String>,

    /// API key for the oracle endpoint, if it requires one.
    #[arg(long, env = "KEEPER_ORACLE_API_KEY")]
    pub oracle_api_key: Option<String>,

    /// Oracle request timeout in milliseconds.
    #[arg(long, env = "KEEPER_ORACLE_TIMEOUT_MS", default_value = "10000")]
    pub oracle_timeout_ms: u64,

    /// Health-check-only HTTP port; unset serves health on the main port.
    #[arg(long, env = "KEEPER_HEALTH_PORT")]
    pub health_port: Option<u16>,

    /// Log format (json or text).
    #[arg(long, env = "KEEPER_LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "KEEPER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mux != "tmux" && self.mux != "screen" {
            anyhow::bail!("invalid mux backend: {}", self.mux);
        }
        if self.max_sessions == 0 {
            anyhow::bail!("--max-sessions must be at least 1");
        }
        if self.oracle_api_key.is_some() && self.oracle_url.is_none() {
            anyhow::bail!("--oracle-api-key requires --oracle-url");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("keeperd").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_are_valid() {
        parse(&[]).validate().unwrap();
    }

    #[test]
    fn rejects_unknown_mux_backend() {
        let err = parse(&["--mux", "screenish"]).validate().unwrap_err();
        assert!(err.to_string().contains("mux"));
    }

    #[test]
    fn rejects_zero_max_sessions() {
        let err = parse(&["--max-sessions", "0"]).validate().unwrap_err();
        assert!(err.to_string().contains("max-sessions"));
    }

    #[test]
    fn rejects_oracle_api_key_without_url() {
        let err = parse(&["--oracle-api-key", "sk-x"]).validate().unwrap_err();
        assert!(err.to_string().contains("oracle-api-key"));
    }
}
