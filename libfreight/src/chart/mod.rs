//! Helm chart version resolution.
//!
//! Versions come either from a classic repository's `index.yaml` or from the
//! tags of an OCI repository (URLs starting with `oci://`). Either list is
//! then run through [`get_latest_version`] to pick the version to promote.

use crate::auth::Credentials;
use crate::client::{Client, ClientConfig};
use crate::error::{FreightError, Result};
use crate::reference::is_oci_url;
use crate::registry::RepositoryClient;
use crate::version::{get_latest_version, parse_version};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;


/// The part of a Helm repository index we read.
#[derive(Debug, Deserialize)]
struct RepositoryIndex {
    #[serde(default)]
    entries: HashMap<String, Vec<ChartEntry>>,
}

#[derive(Debug, Deserialize)]
struct ChartEntry {
    /// Left untyped: unquoted versions like `1.0` arrive as YAML numbers.
    #[serde(default)]
    version: serde_yaml::Value,
}

impl ChartEntry {
    fn version_string(&self) -> Option<String> {
        match &self.version {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Lists the versions of `chart` in a classic Helm repository.
///
/// Versions are returned exactly as listed in `index.yaml`. A chart missing
/// from the index is an error, not an empty list.
pub async fn get_chart_versions_from_classic_repo(
    repo_url: &str,
    chart: &str,
    credentials: Option<&Credentials>,
    config: &ClientConfig,
) -> Result<Vec<String>> {
    let index_url = format!("{}/index.yaml", repo_url.trim_end_matches('/'));
    debug!(url = %index_url, chart, "fetching chart repository index");

    let http_client = config.build_http_client()?;
    let mut request = http_client.get(&index_url);
    if let Some(header) = credentials.and_then(Credentials::to_header_value) {
        request = request.header(AUTHORIZATION, header);
    }

    let response = request
        .send()
        .await
        .map_err(|e| Client::translate_reqwest_error(e, &index_url, config.timeout_seconds))?;

    if !response.status().is_success() {
        return Err(FreightError::http_status(
            index_url,
            response.status().as_u16(),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| Client::translate_reqwest_error(e, &index_url, config.timeout_seconds))?;

    let index: RepositoryIndex = serde_yaml::from_slice(&body).map_err(|e| {
        FreightError::parse_with_source(
            format!("error unmarshaling repository index from {:?}", repo_url),
            e,
        )
    })?;

    let versions: Vec<String> = index
        .entries
        .get(chart)
        .map(|entries| entries.iter().filter_map(ChartEntry::version_string).collect())
        .unwrap_or_default();

    if versions.is_empty() {
        return Err(FreightError::chart_not_found(chart, repo_url));
    }
    Ok(versions)
}

/// Lists the tags of an OCI chart repository, unmodified.
///
/// `repo_url` names the chart itself, e.g. `oci://ghcr.io/org/charts/app`.
pub async fn get_chart_versions_from_oci_repo(
    repo_url: &str,
    credentials: Option<&Credentials>,
    config: &ClientConfig,
) -> Result<Vec<String>> {
    let repo = RepositoryClient::new(
        repo_url,
        credentials.cloned().unwrap_or_default(),
        config,
        None,
    )?;
    repo.get_tags().await
}

/// Lists chart versions from whichever kind of repository `repo_url` is.
///
/// For OCI repositories `chart` is appended to the URL unless it already
/// ends with it.
pub async fn get_chart_versions(
    repo_url: &str,
    chart: &str,
    credentials: Option<&Credentials>,
    config: &ClientConfig,
) -> Result<Vec<String>> {
    if is_oci_url(repo_url) {
        get_chart_versions_from_oci_repo(&oci_chart_url(repo_url, chart), credentials, config).await
    } else {
        get_chart_versions_from_classic_repo(repo_url, chart, credentials, config).await
    }
}

/// Resolves the latest version of `chart` satisfying `constraint`.
///
/// OCI tags carry build metadata with `_` in place of `+`; they are decoded
/// before comparison and the decoded version is returned. OCI tags that are
/// not versions (signatures, attestations, `latest`) are skipped. `Ok(None)`
/// means no version satisfies the constraint.
///
/// # Examples
///
/// ```no_run
/// use libfreight::chart::get_latest_chart_version;
/// use libfreight::client::ClientConfig;
///
/// # #[tokio::main]
/// # async fn main() -> libfreight::Result<()> {
/// let latest = get_latest_chart_version(
///     "https://charts.example.com",
///     "app",
///     "^1.0.0",
///     None,
///     &ClientConfig::default(),
/// )
/// .await?;
/// println!("{latest:?}");
/// # Ok(())
/// # }
/// ```
pub async fn get_latest_chart_version(
    repo_url: &str,
    chart: &str,
    constraint: &str,
    credentials: Option<&Credentials>,
    config: &ClientConfig,
) -> Result<Option<String>> {
    let mut versions = get_chart_versions(repo_url, chart, credentials, config).await?;
    if is_oci_url(repo_url) {
        versions = versions
            .iter()
            .map(|tag| decode_oci_tag(tag))
            .filter(|tag| {
                let usable = parse_version(tag).is_ok();
                if !usable {
                    debug!(tag = %tag, "skipping non-version OCI tag");
                }
                usable
            })
            .collect();
    }

    let latest = get_latest_version(&versions, constraint)?;
    debug!(repo_url, chart, constraint, ?latest, "resolved chart version");
    Ok(latest)
}

/// Like [`get_latest_chart_version`], but gives up after `deadline`.
pub async fn get_latest_chart_version_with_timeout(
    repo_url: &str,
    chart: &str,
    constraint: &str,
    credentials: Option<&Credentials>,
    config: &ClientConfig,
    deadline: Duration,
) -> Result<Option<String>> {
    tokio::time::timeout(
        deadline,
        get_latest_chart_version(repo_url, chart, constraint, credentials, config),
    )
    .await
    .map_err(|_| {
        FreightError::network(format!(
            "chart resolution for {:?} in {} cancelled: deadline of {:?} exceeded",
            chart,
            repo_url,
            deadline
        ))
    })?
}

/// Turns an OCI tag back into a semantic version string.
pub fn decode_oci_tag(tag: &str) -> String {
    tag.replace('_', "+")
}

fn oci_chart_url(repo_url: &str, chart: &str) -> String {
    let base = repo_url.trim_end_matches('/');
    if chart.is_empty() || base.rsplit('/').next() == Some(chart) {
        base.to_string()
    } else {
        format!("{}/{}", base, chart)
    }
}
