//! Freight - artifact version discovery and selection
//!
//! Freight answers one question for a GitOps pipeline: which version of an
//! upstream artifact should be promoted right now. It speaks the OCI
//! distribution protocol for container images and OCI-hosted charts, reads
//! classic Helm repository indexes, and compares semantic versions.
//!
//! # Quick Start
//!
//! ```no_run
//! use libfreight::image::{SelectionStrategy, Selector, SelectorOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let selector = Selector::new(
//!         "ghcr.io/example/app",
//!         SelectionStrategy::SemVer,
//!         SelectorOptions::new().with_constraint(">=1.4.0 <2.0.0"),
//!     )?;
//!
//!     if let Some(image) = selector.select().await? {
//!         println!("{} {}", image.repository, image.digest);
//!     }
//!
//!     let chart = libfreight::chart::get_latest_chart_version(
//!         "https://charts.example.com",
//!         "app",
//!         "^1.0.0",
//!         None,
//!         &libfreight::client::ClientConfig::default(),
//!     )
//!     .await?;
//!     println!("{chart:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Selector`] - Picks one image under a [`SelectionStrategy`]
//! - [`RepositoryClient`] - Tag listing and tag resolution for one repository
//! - [`chart`] - Helm chart version resolution
//! - [`version`](mod@version) - Semantic version parsing, constraints and selection
//! - [`FreightError`] - Error type distinguishing failure kinds
//!
//! "Nothing found" is always `Ok(None)`; errors are reserved for broken
//! lookups and bad input.

#![warn(clippy::all)]

/// Returns the libfreight crate version.
///
/// # Examples
///
/// ```
/// let version = libfreight::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use auth::{ChallengeCache, Credentials};
pub use client::ClientConfig;
pub use config::Config;
pub use digest::Digest;
pub use error::{ErrorKind, FreightError, Result};
pub use image::{Image, SelectionStrategy, Selector, SelectorOptions};
pub use platform::Platform;
pub use reference::Reference;
pub use registry::RepositoryClient;

pub mod auth;
pub mod chart;
pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod image;
pub mod oci;
pub mod platform;
pub mod reference;
pub mod registry;
pub mod version;

#[cfg(test)]
mod test_support;
