//! HTTP client for OCI registry communication.
//!
//! This module provides a thin HTTP client built on reqwest for talking to
//! OCI-compliant container registries following the OCI Distribution
//! Specification v2 API. It does not decide how to authenticate; callers
//! pass the `Authorization` header value to use for each request.

use crate::digest::Digest;
use crate::error::{FreightError, Result};
use crate::oci::MANIFEST_ACCEPT;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::trace;


/// Response from the tags list API endpoint.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    /// List of tag names; some registries send `null` for an empty repository
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Response from a bearer token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libfreight::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_insecure_skip_tls_verify(true);
/// assert!(config.insecure_skip_tls_verify);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
    /// Accept invalid TLS certificates (default: false)
    pub insecure_skip_tls_verify: bool,
    /// Use `http://` for registries given without a scheme (default: false)
    pub plain_http: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
            insecure_skip_tls_verify: false,
            plain_http: false,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Enables or disables TLS certificate verification bypass.
    pub fn with_insecure_skip_tls_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_tls_verify = insecure;
        self
    }

    /// Talk plain HTTP to registries given without a scheme.
    pub fn with_plain_http(mut self, plain_http: bool) -> Self {
        self.plain_http = plain_http;
        self
    }

    /// Builds a reqwest client honouring this configuration.
    pub fn build_http_client(&self) -> Result<ReqwestClient> {
        ReqwestClient::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .pool_max_idle_per_host(self.max_idle_per_host)
            .danger_accept_invalid_certs(self.insecure_skip_tls_verify)
            .build()
            .map_err(|e| FreightError::network_with_source("failed to create HTTP client", e))
    }
}

/// HTTP client for OCI registry operations.
///
/// Bound to one registry base URL. Cloning is cheap and shares the
/// connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    /// The underlying HTTP client
    http_client: ReqwestClient,
    /// Base registry URL (e.g., "https://registry.example.com")
    registry_url: String,
    /// Request timeout, for error messages
    timeout_seconds: u64,
}

impl Client {
    /// Creates a new client for the specified registry with default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::client::Client;
    ///
    /// let client = Client::new("ghcr.io").unwrap();
    /// assert_eq!(client.registry_url(), "https://ghcr.io");
    /// ```
    pub fn new(registry: &str) -> Result<Self> {
        Self::with_config(registry, &ClientConfig::default())
    }

    /// Creates a new client for the specified registry with custom configuration.
    pub fn with_config(registry: &str, config: &ClientConfig) -> Result<Self> {
        let normalized_url = Self::normalize_url(registry, config.plain_http)?;
        let http_client = config.build_http_client()?;

        Ok(Self {
            http_client,
            registry_url: normalized_url,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Normalizes a registry address into a base URL without trailing slashes.
    ///
    /// Addresses without a scheme get `https://`, except loopback hosts and
    /// `plain_http` configurations, which get `http://`.
    fn normalize_url(registry: &str, plain_http: bool) -> Result<String> {
        let registry = registry.trim();

        if registry.is_empty() {
            return Err(FreightError::config("registry address cannot be empty"));
        }

        let url = if registry.starts_with("http://") || registry.starts_with("https://") {
            registry.to_string()
        } else if plain_http || is_loopback(registry) {
            format!("http://{}", registry)
        } else {
            format!("https://{}", registry)
        };

        Ok(url.trim_end_matches('/').to_string())
    }

    /// Returns the base registry URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Probes `/v2/` and returns the authentication challenge, if any.
    ///
    /// `Ok(None)` means the registry answered without asking for
    /// credentials. A 401 yields the raw `WWW-Authenticate` header value.
    pub async fn ping(&self) -> Result<Option<String>> {
        let url = format!("{}/v2/", self.registry_url);
        let response = self.send(self.http_client.get(&url), &url).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    FreightError::authentication(
                        format!("{} requires authentication but sent no challenge", url),
                        Some(401),
                    )
                })?;
            return Ok(Some(challenge));
        }

        Self::check_response_status(response).await?;
        Ok(None)
    }

    /// Exchanges credentials for a bearer token at a token `realm`.
    pub async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: &str,
        basic_authorization: Option<&str>,
    ) -> Result<String> {
        let mut query: Vec<(&str, &str)> = vec![("scope", scope)];
        if let Some(service) = service {
            query.push(("service", service));
        }

        let mut request = self.http_client.get(realm).query(&query);
        if let Some(header) = basic_authorization {
            request = request.header(AUTHORIZATION, header);
        }

        let response = self.send(request, realm).await?;
        let response = Self::check_response_status(response).await?;
        let token: TokenResponse = response.json().await.map_err(|e| {
            FreightError::parse_with_source(format!("failed to parse token response from {}", realm), e)
        })?;

        token
            .token
            .or(token.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                FreightError::authentication(
                    format!("token response from {} contained no token", realm),
                    None,
                )
            })
    }

    /// Fetches every tag of `repository`, following `Link` pagination.
    ///
    /// Tags are returned in the order the registry sent them.
    pub async fn fetch_tags(
        &self,
        repository: &str,
        authorization: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut all_tags = Vec::new();
        let mut url = format!("{}/v2/{}/tags/list", self.registry_url, repository);

        loop {
            // Credentials stay with the registry they were issued for.
            let page_authorization = authorization.filter(|_| self.is_registry_url(&url));
            let response = self
                .send(with_authorization(self.http_client.get(&url), page_authorization), &url)
                .await?;

            // Extract Link header for pagination before consuming response
            let next_path = Self::extract_next_link(response.headers());

            let response = Self::check_response_status(response).await?;

            let tags_response: TagsResponse = response.json().await.map_err(|e| {
                FreightError::parse_with_source("failed to parse tags response", e)
            })?;

            let page = tags_response.tags.unwrap_or_default();
            trace!(url = %url, count = page.len(), "fetched tag page");
            all_tags.extend(page);

            match next_path {
                Some(path) if path.starts_with("http://") || path.starts_with("https://") => {
                    url = path
                }
                Some(path) => url = format!("{}{}", self.registry_url, path),
                None => break,
            }
        }

        Ok(all_tags)
    }

    fn is_registry_url(&self, url: &str) -> bool {
        url.strip_prefix(self.registry_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Fetches the manifest or index for `reference` (a tag or digest).
    ///
    /// Returns the raw bytes and the manifest digest. The digest comes from
    /// `Docker-Content-Digest`, or is computed from the body if the header is
    /// missing.
    pub async fn fetch_manifest(
        &self,
        repository: &str,
        reference: &str,
        authorization: Option<&str>,
    ) -> Result<(Vec<u8>, Digest)> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );

        let request = self.http_client.get(&url).header("Accept", MANIFEST_ACCEPT);
        let response = self
            .send(with_authorization(request, authorization), &url)
            .await?;

        let header_digest = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let response = Self::check_response_status(response).await?;

        let manifest_bytes = response.bytes().await.map_err(|e| {
            Self::translate_reqwest_error(e, &url, self.timeout_seconds)
        })?;

        let digest = match header_digest {
            Some(raw) => Digest::from_str(&raw)?,
            None => Digest::sha256_of(&manifest_bytes)?,
        };

        Ok((manifest_bytes.to_vec(), digest))
    }

    /// Fetches a blob and verifies it against `digest`.
    pub async fn fetch_blob(
        &self,
        repository: &str,
        digest: &Digest,
        authorization: Option<&str>,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/v2/{}/blobs/{}", self.registry_url, repository, digest);

        let response = self
            .send(with_authorization(self.http_client.get(&url), authorization), &url)
            .await?;
        let response = Self::check_response_status(response).await?;

        let blob_bytes = response.bytes().await.map_err(|e| {
            Self::translate_reqwest_error(e, &url, self.timeout_seconds)
        })?;

        digest.verify(&blob_bytes)?;

        Ok(blob_bytes.to_vec())
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, url, self.timeout_seconds))
    }

    /// Extracts the next page URL from the Link header.
    ///
    /// The OCI Distribution Specification uses the Link header for pagination:
    /// `Link: </v2/alpine/tags/list?n=100&last=3.19>; rel="next"`
    fn extract_next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
        let link_header = headers.get(reqwest::header::LINK)?;
        let link_str = link_header.to_str().ok()?;

        for link_part in link_str.split(',') {
            let link_part = link_part.trim();

            if link_part.contains("rel=\"next\"") || link_part.contains("rel='next'") {
                if let Some(start) = link_part.find('<')
                    && let Some(end) = link_part.find('>')
                    && start < end
                {
                    return Some(link_part[start + 1..end].to_string());
                }
            }
        }

        None
    }

    /// Translates a reqwest error into a FreightError.
    pub(crate) fn translate_reqwest_error(
        error: reqwest::Error,
        url: &str,
        timeout_seconds: u64,
    ) -> FreightError {
        if error.is_timeout() {
            FreightError::network_with_source(
                format!(
                    "request to {} timed out after {} seconds",
                    url, timeout_seconds
                ),
                error,
            )
        } else if error.is_connect() {
            FreightError::network_with_source(format!("failed to connect to {}", url), error)
        } else if error.is_request() {
            FreightError::network_with_source(format!("failed to send request to {}", url), error)
        } else {
            FreightError::network_with_source(
                format!("network error communicating with {}", url),
                error,
            )
        }
    }

    /// Checks the HTTP response status and translates errors to FreightError.
    pub(crate) async fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        match status {
            StatusCode::UNAUTHORIZED => Err(FreightError::authentication(
                format!("authentication required for {}: {}", url, error_body),
                Some(401),
            )),
            StatusCode::FORBIDDEN => Err(FreightError::authentication(
                format!("access forbidden for {}: {}", url, error_body),
                Some(403),
            )),
            _ => Err(FreightError::http_status(url, status.as_u16())),
        }
    }
}

fn with_authorization(request: RequestBuilder, authorization: Option<&str>) -> RequestBuilder {
    match authorization {
        Some(value) => request.header(AUTHORIZATION, value),
        None => request,
    }
}

/// Returns true for registry addresses on the local machine.
fn is_loopback(registry: &str) -> bool {
    let host = if let Some(rest) = registry.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        registry.split(['/', ':']).next().unwrap_or(registry)
    };
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}
