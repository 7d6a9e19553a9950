//! OCI specification data structures.
//!
//! Manifests and indexes come from the `oci-spec` crate. Image configuration
//! blobs are read through [`ConfigSummary`], which only keeps the fields
//! selection needs and tolerates Docker-produced configs.

pub use oci_spec::image::{Descriptor, ImageIndex, ImageManifest};

use crate::error::{FreightError, Result};
use crate::platform::Platform;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Accept header covering OCI and Docker v2 manifests and indexes.
pub const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json";

/// Represents either a single-platform image manifest or a multi-platform image index.
///
/// When fetching a manifest from a registry, it may return either:
/// - An `ImageManifest` for single-platform images
/// - An `ImageIndex` for multi-platform images (e.g., linux/amd64, linux/arm64)
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum ManifestOrIndex {
    /// A single-platform image manifest
    Manifest(ImageManifest),
    /// A multi-platform image index
    Index(ImageIndex),
}

impl ManifestOrIndex {
    /// Parse manifest bytes, automatically detecting whether it's a Manifest or Index.
    ///
    /// The `mediaType` field decides when present; otherwise the document
    /// shape (`manifests` versus `layers`/`config`) does.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| FreightError::parse_with_source("failed to parse manifest JSON", e))?;

        let media_type = value
            .get("mediaType")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let is_index = if media_type.contains("index") || media_type.contains("list") {
            true
        } else if media_type.contains("manifest") {
            false
        } else if value.get("manifests").is_some() {
            true
        } else if value.get("layers").is_some() || value.get("config").is_some() {
            false
        } else {
            return Err(FreightError::parse(
                "unable to determine if content is a manifest or index",
            ));
        };

        if is_index {
            let index: ImageIndex = serde_json::from_slice(bytes)
                .map_err(|e| FreightError::parse_with_source("failed to parse image index", e))?;
            Ok(ManifestOrIndex::Index(index))
        } else {
            let manifest: ImageManifest = serde_json::from_slice(bytes)
                .map_err(|e| FreightError::parse_with_source("failed to parse image manifest", e))?;
            Ok(ManifestOrIndex::Manifest(manifest))
        }
    }

    /// Returns true if this is a multi-platform index.
    pub fn is_index(&self) -> bool {
        matches!(self, ManifestOrIndex::Index(_))
    }

    /// Picks the index entry to resolve.
    ///
    /// With a constraint, the first entry whose platform matches it. Without
    /// one, the first entry in the index's own order. Always `None` for a
    /// single-platform manifest.
    pub fn select_entry(&self, constraint: Option<&Platform>) -> Option<&Descriptor> {
        let ManifestOrIndex::Index(index) = self else {
            return None;
        };
        match constraint {
            Some(wanted) => index.manifests().iter().find(|desc| {
                desc.platform()
                    .as_ref()
                    .is_some_and(|platform| wanted.matches_oci(platform))
            }),
            None => index.manifests().first(),
        }
    }
}

/// The parts of an image configuration blob used for selection.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ConfigSummary {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

impl ConfigSummary {
    /// Parses a configuration blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| FreightError::parse_with_source("failed to parse image configuration", e))
    }

    /// Returns the build timestamp, if present and valid RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Returns the platform the image was built for, if recorded.
    pub fn platform(&self) -> Option<Platform> {
        match (&self.os, &self.architecture) {
            (Some(os), Some(arch)) if !os.is_empty() && !arch.is_empty() => {
                Some(Platform::new(os.clone(), arch.clone(), self.variant.clone()))
            }
            _ => None,
        }
    }
}
