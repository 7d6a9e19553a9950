//! OCI Image Reference parsing and manipulation.
//!
//! This module provides a wrapper around the `oci_spec::distribution::Reference`
//! type to integrate with freight's error handling. Short Docker Hub names
//! (`debian`) are normalized to `docker.io/library/debian`.

use crate::error::{FreightError, Result};
use oci_spec::distribution::Reference as OciReference;
use std::fmt;
use std::str::FromStr;


/// Registry name Docker Hub references normalize to.
const DOCKER_HUB_REGISTRY: &str = "docker.io";

/// Host serving the Docker Hub distribution API.
const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

/// URL scheme marking an OCI chart repository.
pub const OCI_SCHEME: &str = "oci://";

/// Represents an OCI image reference, wrapping `oci_spec::distribution::Reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference(OciReference);

impl FromStr for Reference {
    type Err = FreightError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_reference = OciReference::from_str(s.trim()).map_err(|e| FreightError::Parse {
            message: format!("invalid image reference {:?}: {}", s, e),
            source: Some(Box::new(e)),
        })?;
        Ok(Reference(oci_reference))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Reference {
    /// Parses a repository URL that may carry the `oci://` scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::reference::Reference;
    ///
    /// let reference = Reference::from_oci_url("oci://ghcr.io/example/charts/app").unwrap();
    /// assert_eq!(reference.registry(), "ghcr.io");
    /// assert_eq!(reference.repository(), "example/charts/app");
    /// ```
    pub fn from_oci_url(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        let without_scheme = trimmed.strip_prefix(OCI_SCHEME).unwrap_or(trimmed);
        Self::from_str(without_scheme.trim_end_matches('/'))
    }

    /// Returns the registry part of the reference.
    pub fn registry(&self) -> &str {
        self.0.registry()
    }

    /// Returns the host that serves the distribution API for this registry.
    pub fn api_host(&self) -> &str {
        if self.registry() == DOCKER_HUB_REGISTRY {
            DOCKER_HUB_API_HOST
        } else {
            self.registry()
        }
    }

    /// Returns the repository part of the reference.
    pub fn repository(&self) -> &str {
        self.0.repository()
    }

    /// Returns `registry/repository`, without tag or digest.
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry(), self.repository())
    }

    /// Returns the tag part of the reference, if present.
    pub fn tag(&self) -> Option<&str> {
        self.0.tag()
    }

    /// Returns the digest part of the reference, if present.
    pub fn digest(&self) -> Option<&str> {
        self.0.digest()
    }
}

/// Returns true if `url` designates an OCI repository.
pub fn is_oci_url(url: &str) -> bool {
    url.trim_start().starts_with(OCI_SCHEME)
}
