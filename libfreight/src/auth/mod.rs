//! Authentication handling for OCI registries.
//!
//! This module provides authentication support for OCI-compliant registries,
//! including anonymous access, Basic authentication, and Bearer token authentication
//! following the OCI Distribution Specification authentication flow.
//!
//! Challenge discovery (`GET /v2/`) happens once per registry host and is
//! shared through a [`ChallengeCache`]. Bearer tokens are exchanged once per
//! repository and kept by the [`Authorizer`] bound to it.

use crate::client::Client;
use crate::error::{FreightError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::debug;

#[cfg(test)]
mod tests;

/// Credentials for registry authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// No authentication required (anonymous access)
    #[default]
    Anonymous,

    /// HTTP Basic authentication with username and password
    Basic {
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
    },

    /// Bearer token authentication (OAuth2-style)
    Bearer {
        /// The bearer token
        token: String,
    },
}

impl Credentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Basic authentication credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::auth::Credentials;
    ///
    /// let creds = Credentials::basic("username", "password");
    /// assert!(creds.is_basic());
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates Bearer token credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Builds credentials from an optional username/password pair.
    ///
    /// Anything short of a non-empty username yields anonymous credentials.
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Self {
        match username {
            Some(user) if !user.is_empty() => Self::basic(user, password.unwrap_or_default()),
            _ => Self::Anonymous,
        }
    }

    /// Returns true for username/password credentials.
    pub fn is_basic(&self) -> bool {
        matches!(self, Self::Basic { .. })
    }

    /// Returns the Authorization header value for these credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::auth::Credentials;
    ///
    /// let header = Credentials::basic("user", "pass").to_header_value();
    /// assert_eq!(header.as_deref(), Some("Basic dXNlcjpwYXNz"));
    /// ```
    pub fn to_header_value(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                use base64::{Engine as _, engine::general_purpose};
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials);
                Some(format!("Basic {}", encoded))
            }
            Self::Bearer { token } => Some(format!("Bearer {}", token)),
        }
    }
}

/// How a registry asked to be authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// `/v2/` answered without a challenge.
    Anonymous,
    /// `WWW-Authenticate: Basic ...`
    Basic,
    /// `WWW-Authenticate: Bearer realm=...`
    Bearer {
        /// Token endpoint
        realm: String,
        /// Service identifier to pass to the token endpoint
        service: Option<String>,
        /// Scope suggested by the registry, if any
        scope: Option<String>,
    },
}

impl Challenge {
    /// Parses a WWW-Authenticate header value.
    ///
    /// Example header: `Bearer realm="https://auth.example.com/token",service="registry.example.com",scope="repository:alpine:pull"`
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::auth::Challenge;
    ///
    /// let header = r#"Bearer realm="https://auth.example.com/token",service="registry""#;
    /// let challenge = Challenge::parse(header).unwrap();
    /// assert!(matches!(challenge, Challenge::Bearer { .. }));
    /// ```
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();

        let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("basic") {
            return Ok(Self::Basic);
        }
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(FreightError::authentication(
                format!("unsupported authentication scheme {:?}", scheme),
                Some(401),
            ));
        }

        let mut realm = None;
        let mut service = None;
        let mut scope = None;

        for (key, value) in parse_params(params) {
            match key.as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let realm = realm.filter(|r| !r.is_empty()).ok_or_else(|| {
            FreightError::authentication(
                "WWW-Authenticate header missing required 'realm' parameter",
                Some(401),
            )
        })?;

        Ok(Self::Bearer {
            realm,
            service,
            scope,
        })
    }
}

/// Splits `key="value",key2="a,b"` into pairs, honouring quoted commas.
fn parse_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while !rest.is_empty() {
        let Some((key, after_key)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().trim_start_matches(',').trim().to_ascii_lowercase();
        let after_key = after_key.trim_start();

        let (value, remainder) = if let Some(quoted) = after_key.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after_key.find(',') {
                Some(end) => (&after_key[..end], &after_key[end..]),
                None => (after_key, ""),
            }
        };

        pairs.push((key, value.trim().to_string()));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}

/// Per-host memo of registry challenges.
///
/// The map lock is only held to look up or insert a host's cell; the
/// `/v2/` probe runs inside the cell's initializer, so concurrent first
/// users of one host await a single probe while other hosts proceed.
#[derive(Debug, Default)]
pub struct ChallengeCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Challenge>>>>,
}

impl ChallengeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the challenge for `client`'s registry, probing it on first use.
    ///
    /// A failed probe is not cached; the next caller retries.
    pub async fn get_or_discover(&self, client: &Client) -> Result<Challenge> {
        let cell = self.cell_for(client.registry_url())?;

        let challenge = cell
            .get_or_try_init(|| async {
                let challenge = match client.ping().await? {
                    Some(header) => Challenge::parse(&header)?,
                    None => Challenge::Anonymous,
                };
                debug!(registry = client.registry_url(), ?challenge, "discovered registry challenge");
                Ok::<_, FreightError>(challenge)
            })
            .await?;

        Ok(challenge.clone())
    }

    /// Number of hosts with a cache entry.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell_for(&self, host: &str) -> Result<Arc<OnceCell<Challenge>>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| FreightError::authentication("challenge cache lock poisoned", None))?;
        Ok(entries.entry(host.to_string()).or_default().clone())
    }
}

/// Produces the `Authorization` header for one repository.
#[derive(Debug)]
pub struct Authorizer {
    credentials: Credentials,
    challenges: Arc<ChallengeCache>,
    token: OnceCell<String>,
}

impl Authorizer {
    /// Creates an authorizer sharing `challenges` with other clients.
    pub fn new(credentials: Credentials, challenges: Arc<ChallengeCache>) -> Self {
        Self {
            credentials,
            challenges,
            token: OnceCell::new(),
        }
    }

    /// Returns the header value to send for requests against `repository`.
    ///
    /// Static bearer tokens are used as-is. Otherwise the registry's
    /// challenge decides: nothing for anonymous registries, Basic
    /// credentials for Basic challenges, and an exchanged pull token for
    /// Bearer challenges.
    pub async fn authorization(&self, client: &Client, repository: &str) -> Result<Option<String>> {
        if let Credentials::Bearer { .. } = self.credentials {
            return Ok(self.credentials.to_header_value());
        }

        match self.challenges.get_or_discover(client).await? {
            Challenge::Anonymous => Ok(None),
            Challenge::Basic => Ok(self.credentials.to_header_value()),
            Challenge::Bearer { realm, service, .. } => {
                let token = self
                    .token
                    .get_or_try_init(|| async {
                        let scope = format!("repository:{}:pull", repository);
                        let basic = self.credentials.to_header_value();
                        debug!(%realm, %scope, "requesting bearer token");
                        client
                            .fetch_token(&realm, service.as_deref(), &scope, basic.as_deref())
                            .await
                    })
                    .await?;
                Ok(Some(format!("Bearer {}", token)))
            }
        }
    }
}
