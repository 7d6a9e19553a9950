//! Configuration for registry access.
//!
//! This module manages configuration with sensible defaults, loading from a
//! YAML file and merging it over the defaults.

use crate::client::ClientConfig;
use crate::error::{FreightError, Result};
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;


/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub registries: Vec<Registry>,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = Self::defaults()?.add_source(File::from_str(s, FileFormat::Yaml));
        Self::from_builder(builder, None)
    }

    /// Loads a `Config` from an optional file path.
    ///
    /// Without a path the defaults are returned. A given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::defaults()?;
        if let Some(p) = path {
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }
        Self::from_builder(builder, path)
    }

    /// Client settings for `host`, with any per-registry overrides applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::config::Config;
    ///
    /// let config = Config::from_yaml_str(
    ///     "registries:\n  - host: registry.local:5000\n    plain_http: true\n",
    /// )
    /// .unwrap();
    /// assert!(config.client_config_for("registry.local:5000").plain_http);
    /// assert!(!config.client_config_for("ghcr.io").plain_http);
    /// ```
    pub fn client_config_for(&self, host: &str) -> ClientConfig {
        let base = ClientConfig::new()
            .with_timeout(self.network.timeout)
            .with_max_idle_per_host(self.network.max_idle_per_host);

        match self.registry(host) {
            Some(registry) => base
                .with_insecure_skip_tls_verify(registry.insecure)
                .with_plain_http(registry.plain_http),
            None => base,
        }
    }

    /// Returns the entry configured for `host`, if any.
    pub fn registry(&self, host: &str) -> Option<&Registry> {
        self.registries.iter().find(|r| r.host == host)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = ConfigRs::try_from(&Config::default()).map_err(|e| {
            FreightError::config_with_source("failed to build default configuration", e)
        })?;
        Ok(ConfigRs::builder().add_source(defaults))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                FreightError::config_file(
                    "failed to deserialize configuration",
                    path.map(|p| p.display().to_string()),
                    e,
                )
            })
    }
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Per-request timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

fn default_max_idle_per_host() -> usize {
    10
}

/// Settings for one registry host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registry {
    /// Host as it appears in references, e.g. `registry.local:5000`
    pub host: String,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    /// Talk `http://` instead of `https://`
    #[serde(default)]
    pub plain_http: bool,
}
