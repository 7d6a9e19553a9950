//! Repository-level registry operations.
//!
//! [`RepositoryClient`] binds the HTTP client and an [`Authorizer`] to one
//! repository and resolves tags into [`Image`] metadata, descending into
//! multi-platform indexes when needed.

use crate::auth::{Authorizer, ChallengeCache, Credentials};
use crate::client::{Client, ClientConfig};
use crate::digest::Digest;
use crate::error::{FreightError, Result};
use crate::image::Image;
use crate::oci::{ConfigSummary, ImageManifest, ManifestOrIndex};
use crate::platform::Platform;
use crate::reference::Reference;
use std::sync::Arc;
use tracing::trace;


/// Client for one registry/repository pair.
///
/// Not tied to any tag; one instance can resolve many tags. The challenge
/// cache may be shared with other clients through [`RepositoryClient::new`].
#[derive(Debug)]
pub struct RepositoryClient {
    client: Client,
    authorizer: Authorizer,
    reference: Reference,
}

impl RepositoryClient {
    /// Creates a client for `repo_url`, e.g. `ghcr.io/org/app` or `debian`.
    ///
    /// A leading `oci://` is accepted. No network access happens here.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::auth::Credentials;
    /// use libfreight::client::ClientConfig;
    /// use libfreight::registry::RepositoryClient;
    ///
    /// let repo = RepositoryClient::new(
    ///     "debian",
    ///     Credentials::Anonymous,
    ///     &ClientConfig::default(),
    ///     None,
    /// )
    /// .unwrap();
    /// assert_eq!(repo.name(), "docker.io/library/debian");
    /// ```
    pub fn new(
        repo_url: &str,
        credentials: Credentials,
        config: &ClientConfig,
        challenges: Option<Arc<ChallengeCache>>,
    ) -> Result<Self> {
        let reference = Reference::from_oci_url(repo_url)?;
        let client = Client::with_config(reference.api_host(), config)?;
        let challenges = challenges.unwrap_or_default();

        Ok(Self {
            client,
            authorizer: Authorizer::new(credentials, challenges),
            reference,
        })
    }

    /// `registry/repository` this client is bound to.
    pub fn name(&self) -> String {
        self.reference.name()
    }

    pub fn registry(&self) -> &str {
        self.reference.registry()
    }

    pub fn repository(&self) -> &str {
        self.reference.repository()
    }

    /// Lists the repository's tags in registry order.
    pub async fn get_tags(&self) -> Result<Vec<String>> {
        self.list_tags()
            .await
            .map_err(|e| FreightError::registry("listing tags", self.name(), e))
    }

    /// Resolves `tag` into an image.
    ///
    /// For a multi-platform index the entry matching `platform` is used, or
    /// the first entry when no constraint is given. `Ok(None)` means the tag
    /// exists but nothing in it matches the platform constraint.
    pub async fn get_image_by_tag(
        &self,
        tag: &str,
        platform: Option<&Platform>,
    ) -> Result<Option<Image>> {
        self.resolve_tag(tag, platform).await.map_err(|e| {
            FreightError::registry(format!("retrieving image with tag {:?}", tag), self.name(), e)
        })
    }

    async fn authorization(&self) -> Result<Option<String>> {
        self.authorizer
            .authorization(&self.client, self.repository())
            .await
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let authorization = self.authorization().await?;
        let tags = self
            .client
            .fetch_tags(self.repository(), authorization.as_deref())
            .await?;
        trace!(repository = %self.name(), count = tags.len(), "listed tags");
        Ok(tags)
    }

    async fn resolve_tag(&self, tag: &str, platform: Option<&Platform>) -> Result<Option<Image>> {
        let authorization = self.authorization().await?;
        let authorization = authorization.as_deref();

        let (bytes, digest) = self
            .client
            .fetch_manifest(self.repository(), tag, authorization)
            .await?;

        match ManifestOrIndex::from_bytes(&bytes)? {
            ManifestOrIndex::Manifest(manifest) => {
                let config = self.fetch_config(&manifest, authorization).await?;
                let image_platform = config.platform();

                if let Some(wanted) = platform {
                    let matches = image_platform.as_ref().is_some_and(|actual| {
                        wanted.matches(&actual.os, &actual.architecture, actual.variant.as_deref())
                    });
                    if !matches {
                        trace!(tag, %wanted, "image does not match platform constraint");
                        return Ok(None);
                    }
                }

                Ok(Some(self.image(tag, digest, image_platform, &config)))
            }
            index @ ManifestOrIndex::Index(_) => {
                let Some(entry) = index.select_entry(platform) else {
                    trace!(tag, "no index entry matches platform constraint");
                    return Ok(None);
                };

                let entry_digest = Digest::from(entry.digest().clone());
                let (entry_bytes, _) = self
                    .client
                    .fetch_manifest(self.repository(), &entry_digest.to_string(), authorization)
                    .await?;
                entry_digest.verify(&entry_bytes)?;

                let ManifestOrIndex::Manifest(manifest) = ManifestOrIndex::from_bytes(&entry_bytes)?
                else {
                    return Err(FreightError::parse(format!(
                        "index entry {} of tag {:?} is itself an index",
                        entry_digest, tag
                    )));
                };

                let config = self.fetch_config(&manifest, authorization).await?;
                let entry_platform = entry
                    .platform()
                    .as_ref()
                    .map(Platform::from_oci)
                    .or_else(|| config.platform());

                Ok(Some(self.image(tag, digest, entry_platform, &config)))
            }
        }
    }

    async fn fetch_config(
        &self,
        manifest: &ImageManifest,
        authorization: Option<&str>,
    ) -> Result<ConfigSummary> {
        let config_digest = Digest::from(manifest.config().digest().clone());
        let blob = self
            .client
            .fetch_blob(self.repository(), &config_digest, authorization)
            .await?;
        ConfigSummary::from_bytes(&blob)
    }

    fn image(
        &self,
        tag: &str,
        digest: Digest,
        platform: Option<Platform>,
        config: &ConfigSummary,
    ) -> Image {
        Image {
            repository: self.name(),
            tag: Some(tag.to_string()),
            digest,
            platform,
            created_at: config.created_at(),
        }
    }
}
