//! Platform constraints for multi-architecture images.

use crate::error::{FreightError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;


/// An OS/architecture pair with an optional variant, e.g. `linux/arm64/v8`.
///
/// Used both as the platform reported for a selected image and as the
/// constraint a selector filters multi-platform manifest lists with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Platform {
    pub os: String,
    pub architecture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Parsed `--platform` value restricting which manifest list entry is used.
pub type PlatformConstraint = Platform;

impl Platform {
    /// Creates a platform from its parts.
    pub fn new(
        os: impl Into<String>,
        architecture: impl Into<String>,
        variant: Option<String>,
    ) -> Self {
        Self {
            os: os.into(),
            architecture: architecture.into(),
            variant,
        }
    }

    /// Returns true if the given platform satisfies this constraint.
    ///
    /// OS and architecture must be equal. The variant is only compared when
    /// both sides specify one.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::platform::Platform;
    ///
    /// let constraint: Platform = "linux/arm64".parse().unwrap();
    /// assert!(constraint.matches("linux", "arm64", Some("v8")));
    /// assert!(!constraint.matches("linux", "amd64", None));
    /// ```
    pub fn matches(&self, os: &str, architecture: &str, variant: Option<&str>) -> bool {
        if self.os != os || self.architecture != architecture {
            return false;
        }
        match (self.variant.as_deref(), variant) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }

    /// Returns true if an OCI platform descriptor satisfies this constraint.
    pub fn matches_oci(&self, platform: &oci_spec::image::Platform) -> bool {
        self.matches(
            &platform.os().to_string(),
            &platform.architecture().to_string(),
            platform.variant().as_deref(),
        )
    }

    /// Builds a platform from an OCI platform descriptor.
    pub fn from_oci(platform: &oci_spec::image::Platform) -> Self {
        Self::new(
            platform.os().to_string(),
            platform.architecture().to_string(),
            platform.variant().clone(),
        )
    }
}

impl FromStr for Platform {
    type Err = FreightError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(FreightError::parse(format!(
                "invalid platform {s:?}: expected os/arch[/variant]"
            )));
        }

        Ok(Self::new(
            parts[0],
            parts[1],
            parts.get(2).map(|v| v.to_string()),
        ))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{variant}")?;
        }
        Ok(())
    }
}
