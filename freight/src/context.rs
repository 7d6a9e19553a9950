//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use libfreight::{ClientConfig, Config, Credentials, FreightError, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Overall deadline for one resolution when nothing else is configured.
pub const DEFAULT_DEADLINE_SECS: u64 = 120;

/// Values given on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure: bool,
    pub timeout: Option<u64>,
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    pub credentials: Credentials,
    /// Skip TLS verification for every host, on top of per-registry settings
    pub insecure_skip_tls_verify: bool,
    /// Overall deadline for a resolution
    pub deadline: Duration,
}

impl Default for AppContext {
    fn default() -> Self {
        Self {
            config: Config::default(),
            credentials: Credentials::default(),
            insecure_skip_tls_verify: false,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
        }
    }
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    pub fn build(config_path: Option<&Path>, flags: Flags) -> Result<Self> {
        Self::build_with_env(config_path, flags, |key| env::var(key).ok())
    }

    fn build_with_env<F>(config_path: Option<&Path>, flags: Flags, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An explicit path must exist; the default location is optional.
        let path = config_path.map(Path::to_path_buf).or_else(default_config_path);
        debug!(path = ?path, "loading configuration");
        let mut ctx = Self {
            config: Config::load(path.as_deref())?,
            ..Self::default()
        };

        if let Some(timeout) = env("FREIGHT_TIMEOUT") {
            ctx.deadline = Duration::from_secs(parse_seconds("FREIGHT_TIMEOUT", &timeout)?);
        }
        if let Some(insecure) = env("FREIGHT_INSECURE_SKIP_TLS_VERIFY") {
            ctx.insecure_skip_tls_verify = parse_bool("FREIGHT_INSECURE_SKIP_TLS_VERIFY", &insecure)?;
        }
        let username = flags.username.or_else(|| env("FREIGHT_USERNAME"));
        let password = flags.password.or_else(|| env("FREIGHT_PASSWORD"));

        ctx.credentials = Credentials::from_parts(username.as_deref(), password.as_deref());
        if flags.insecure {
            ctx.insecure_skip_tls_verify = true;
        }
        if let Some(timeout) = flags.timeout {
            ctx.deadline = Duration::from_secs(timeout);
        }

        Ok(ctx)
    }

    /// Client settings for `host`: the configured network and registry
    /// values, with the global TLS flag applied on top.
    pub fn client_config_for(&self, host: &str) -> ClientConfig {
        let mut config = self.config.client_config_for(host);
        config.insecure_skip_tls_verify |= self.insecure_skip_tls_verify;
        config
    }
}

/// `$XDG_CONFIG_HOME/freight/config.yaml` (or the platform equivalent), when
/// the file exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("freight").join("config.yaml"))
        .filter(|path| path.exists())
}

/// The host part of a repository reference or URL, as written in the
/// `registries` section of the config file.
pub fn host_of(repo_url: &str) -> &str {
    let rest = ["oci://", "https://", "http://"]
        .iter()
        .find_map(|scheme| repo_url.strip_prefix(scheme))
        .unwrap_or(repo_url);
    rest.split('/').next().unwrap_or(rest)
}

fn parse_seconds(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| FreightError::config_with_source(format!("invalid {name} value {value:?}"), e))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(FreightError::config(format!("invalid {name} value {value:?}"))),
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
