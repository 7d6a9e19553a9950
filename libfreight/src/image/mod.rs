//! Container image selection.
//!
//! A [`Selector`] is built once from a repository URL, a
//! [`SelectionStrategy`] and [`SelectorOptions`], then asked to
//! [`select`](Selector::select) the single image a policy points at. All
//! option validation (allow pattern, platform, strategy requirements)
//! happens at construction, before any network access.
//!
//! # Examples
//!
//! ```no_run
//! use libfreight::image::{SelectionStrategy, Selector, SelectorOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> libfreight::Result<()> {
//! let selector = Selector::new(
//!     "ghcr.io/example/app",
//!     SelectionStrategy::SemVer,
//!     SelectorOptions::new()
//!         .with_constraint("^1.0.0")
//!         .with_platform("linux/amd64"),
//! )?;
//!
//! match selector.select().await? {
//!     Some(image) => println!("{}:{:?} {}", image.repository, image.tag, image.digest),
//!     None => println!("nothing to promote"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::auth::{ChallengeCache, Credentials};
use crate::client::ClientConfig;
use crate::digest::Digest;
use crate::error::{FreightError, Result};
use crate::platform::Platform;
use crate::registry::RepositoryClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

mod digest;
pub mod filter;
mod lexical;
mod newest_build;
mod semantic;

pub use digest::DigestSelector;
pub use filter::TagFilter;
pub use lexical::LexicalSelector;
pub use newest_build::NewestBuildSelector;
pub use semantic::SemVerSelector;


/// A selected image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// `registry/repository` the image lives in
    pub repository: String,
    /// Tag the image was found under; absent for digest-only results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Manifest (or index) digest the tag resolved to
    pub digest: Digest,
    /// Platform of the selected manifest, when the registry reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Build time from the image configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Which image a selector picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SelectionStrategy {
    /// The tag equal to the constraint.
    Digest,
    /// The lexically greatest tag.
    Lexical,
    /// The image with the latest build time.
    NewestBuild,
    /// The highest semantic version satisfying the constraint.
    #[default]
    SemVer,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digest => "Digest",
            Self::Lexical => "Lexical",
            Self::NewestBuild => "NewestBuild",
            Self::SemVer => "SemVer",
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionStrategy {
    type Err = FreightError;

    /// Accepts `Digest`, `Lexical`, `NewestBuild`, `SemVer` and the
    /// lowercase forms `digest`, `lexical`, `newest-build`, `semver`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Digest" | "digest" => Ok(Self::Digest),
            "Lexical" | "lexical" => Ok(Self::Lexical),
            "NewestBuild" | "newest-build" => Ok(Self::NewestBuild),
            "SemVer" | "semver" => Ok(Self::SemVer),
            other => Err(FreightError::config(format!(
                "invalid image selection strategy {:?}",
                other
            ))),
        }
    }
}

/// Options shaping a [`Selector`].
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct SelectorOptions {
    /// Strategy-dependent constraint: a tag for `Digest`, a version range for `SemVer`
    pub constraint: Option<String>,
    /// Only tags matching this pattern are considered
    pub allow_regex: Option<String>,
    /// Tags excluded verbatim
    pub ignore: Vec<String>,
    /// `os/arch[/variant]` restricting multi-platform images
    pub platform: Option<String>,
    pub credentials: Credentials,
    pub insecure_skip_tls_verify: bool,
    /// Replaces the default client settings when set
    pub client_config: Option<ClientConfig>,
    /// Challenge cache shared with other selectors
    pub challenges: Option<Arc<ChallengeCache>>,
}

impl SelectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn with_allow_regex(mut self, pattern: impl Into<String>) -> Self {
        self.allow_regex = Some(pattern.into());
        self
    }

    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_insecure_skip_tls_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_tls_verify = insecure;
        self
    }

    pub fn with_client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = Some(config);
        self
    }

    pub fn with_challenges(mut self, challenges: Arc<ChallengeCache>) -> Self {
        self.challenges = Some(challenges);
        self
    }

    fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref().filter(|c| !c.is_empty())
    }
}

/// What every strategy works against: the bound repository, the tag filter
/// and the optional platform constraint.
#[derive(Debug)]
pub(crate) struct Source {
    pub(crate) repo: RepositoryClient,
    pub(crate) filter: TagFilter,
    pub(crate) platform: Option<Platform>,
}

impl Source {
    /// Validates options and binds the repository client. No network access.
    fn prepare(repo_url: &str, options: &SelectorOptions) -> Result<Self> {
        let filter = TagFilter::new(options.allow_regex.as_deref(), options.ignore.clone())?;

        let platform = match options.platform.as_deref().filter(|p| !p.is_empty()) {
            Some(raw) => Some(Platform::from_str(raw).map_err(|e| {
                FreightError::config_with_source(
                    format!("error parsing platform constraint {:?}", raw),
                    e,
                )
            })?),
            None => None,
        };

        let mut client_config = options.client_config.clone().unwrap_or_default();
        client_config.insecure_skip_tls_verify |= options.insecure_skip_tls_verify;

        let repo = RepositoryClient::new(
            repo_url,
            options.credentials.clone(),
            &client_config,
            options.challenges.clone(),
        )?;

        Ok(Self {
            repo,
            filter,
            platform,
        })
    }

    /// Lists tags and applies the filter.
    pub(crate) async fn filtered_tags(&self, strategy: SelectionStrategy) -> Result<Vec<String>> {
        let tags = self.filter.apply(self.repo.get_tags().await?);
        trace!(
            registry = self.repo.registry(),
            repository = self.repo.repository(),
            selection_strategy = %strategy,
            count = tags.len(),
            "tags remaining after filtering"
        );
        Ok(tags)
    }

    pub(crate) async fn image(&self, tag: &str) -> Result<Option<Image>> {
        self.repo.get_image_by_tag(tag, self.platform.as_ref()).await
    }
}

/// An image selector with its strategy fixed at construction.
#[derive(Debug)]
pub enum Selector {
    Digest(DigestSelector),
    Lexical(LexicalSelector),
    NewestBuild(NewestBuildSelector),
    SemVer(SemVerSelector),
}

impl Selector {
    /// Builds a selector for `repo_url`.
    ///
    /// Fails with a configuration error, before any network access, when the
    /// allow pattern or platform is malformed or the strategy's requirements
    /// are not met.
    pub fn new(repo_url: &str, strategy: SelectionStrategy, options: SelectorOptions) -> Result<Self> {
        let source = Source::prepare(repo_url, &options)?;
        Self::dispatch(source, strategy, &options)
    }

    fn dispatch(source: Source, strategy: SelectionStrategy, options: &SelectorOptions) -> Result<Self> {
        Ok(match strategy {
            SelectionStrategy::Digest => Self::Digest(DigestSelector::new(source, options.constraint())?),
            SelectionStrategy::Lexical => Self::Lexical(LexicalSelector::new(source)),
            SelectionStrategy::NewestBuild => Self::NewestBuild(NewestBuildSelector::new(source)),
            SelectionStrategy::SemVer => Self::SemVer(SemVerSelector::new(source, options.constraint())?),
        })
    }

    /// Returns the strategy this selector was built with.
    pub fn strategy(&self) -> SelectionStrategy {
        match self {
            Self::Digest(_) => SelectionStrategy::Digest,
            Self::Lexical(_) => SelectionStrategy::Lexical,
            Self::NewestBuild(_) => SelectionStrategy::NewestBuild,
            Self::SemVer(_) => SelectionStrategy::SemVer,
        }
    }

    fn source(&self) -> &Source {
        match self {
            Self::Digest(s) => &s.source,
            Self::Lexical(s) => &s.source,
            Self::NewestBuild(s) => &s.source,
            Self::SemVer(s) => &s.source,
        }
    }

    /// Selects the image the strategy points at.
    ///
    /// `Ok(None)` means nothing suitable exists upstream; errors are
    /// reserved for failed lookups.
    pub async fn select(&self) -> Result<Option<Image>> {
        let source = self.source();
        trace!(
            registry = source.repo.registry(),
            repository = source.repo.repository(),
            selection_strategy = %self.strategy(),
            platform_constrained = source.platform.is_some(),
            "selecting image"
        );

        let image = match self {
            Self::Digest(s) => s.select().await?,
            Self::Lexical(s) => s.select().await?,
            Self::NewestBuild(s) => s.select().await?,
            Self::SemVer(s) => s.select().await?,
        };

        match &image {
            Some(image) => trace!(
                tag = image.tag.as_deref().unwrap_or_default(),
                digest = %image.digest,
                "found image"
            ),
            None => trace!("no images matched criteria"),
        }
        Ok(image)
    }

    /// Like [`select`](Self::select), but gives up after `deadline`.
    ///
    /// Dropping the selection future aborts its in-flight requests.
    pub async fn select_with_timeout(&self, deadline: Duration) -> Result<Option<Image>> {
        tokio::time::timeout(deadline, self.select())
            .await
            .map_err(|_| {
                FreightError::network(format!(
                    "image selection for {} cancelled: deadline of {:?} exceeded",
                    self.source().repo.name(),
                    deadline
                ))
            })?
    }
}

/// Builds a selector from a strategy name.
///
/// Options are validated before the name, so a malformed pattern or
/// platform is reported even when the strategy is also wrong. An empty name
/// selects the default strategy.
pub fn new_selector(repo_url: &str, strategy: &str, options: SelectorOptions) -> Result<Selector> {
    let source = Source::prepare(repo_url, &options)?;
    let strategy = if strategy.is_empty() {
        SelectionStrategy::default()
    } else {
        SelectionStrategy::from_str(strategy)?
    };
    Selector::dispatch(source, strategy, &options)
}
