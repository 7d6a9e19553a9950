//! OCI content digests.
//!
//! This module wraps `oci_spec::image::Digest` so digests parse into
//! freight's error type, and adds sha256 computation and verification for
//! manifests and config blobs.

use crate::error::{FreightError, Result};
use oci_spec::image::Digest as OciDigest;
use serde::{Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use std::str::FromStr;


/// Represents a content digest, wrapping the `oci_spec::image::Digest` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl Digest {
    /// Computes the sha256 digest of `bytes`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::digest::Digest;
    ///
    /// let digest = Digest::sha256_of(b"").unwrap();
    /// assert_eq!(
    ///     digest.to_string(),
    ///     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    /// );
    /// ```
    pub fn sha256_of(bytes: &[u8]) -> Result<Self> {
        let hex = format!("{:x}", Sha256::digest(bytes));
        Self::from_str(&format!("sha256:{hex}"))
    }

    /// Returns the algorithm part, e.g. `sha256`.
    pub fn algorithm(&self) -> String {
        self.0.algorithm().to_string()
    }

    /// Returns the encoded hash part.
    pub fn hex(&self) -> &str {
        self.0.digest()
    }

    /// Checks that `bytes` hash to this digest.
    ///
    /// Only sha256 is supported.
    pub fn verify(&self, bytes: &[u8]) -> Result<()> {
        if self.algorithm() != "sha256" {
            return Err(FreightError::parse(format!(
                "unsupported digest algorithm: {}. Only sha256 is currently supported",
                self.algorithm()
            )));
        }

        let computed = Self::sha256_of(bytes)?;
        if computed.hex() != self.hex() {
            return Err(FreightError::parse(format!(
                "digest mismatch: expected {}, computed {}",
                self, computed
            )));
        }
        Ok(())
    }
}

impl From<OciDigest> for Digest {
    fn from(digest: OciDigest) -> Self {
        Digest(digest)
    }
}

impl FromStr for Digest {
    type Err = FreightError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s).map_err(|e| FreightError::Parse {
            message: format!("invalid digest format: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(Digest(oci_digest))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
