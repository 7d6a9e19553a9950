//! `freight chart`: resolve the latest version of a Helm chart.

use crate::context::{AppContext, host_of};
use crate::format::{self, Formattable, OutputFormat};
use libfreight::chart::get_latest_chart_version_with_timeout;
use libfreight::{Credentials, Result};
use serde::Serialize;

/// What the user asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct ChartRequest {
    pub repo_url: String,
    /// May be empty when an `oci://` URL already names the chart
    pub chart: String,
    pub constraint: String,
}

impl ChartRequest {
    fn chart_name(&self) -> &str {
        if self.chart.is_empty() {
            self.repo_url.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
        } else {
            &self.chart
        }
    }
}

/// A resolved chart version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartVersion {
    pub repository: String,
    pub chart: String,
    pub version: String,
}

impl Formattable for ChartVersion {
    fn format_pretty(&self) -> String {
        format!(
            "{} {} {}\n  {}  {}",
            format::checkmark(),
            self.chart,
            self.version,
            format::label("repository"),
            self.repository
        )
    }
}

/// Resolves `request` within the context's deadline.
pub async fn resolve_chart(ctx: &AppContext, request: &ChartRequest) -> Result<Option<ChartVersion>> {
    let config = ctx.client_config_for(host_of(&request.repo_url));
    let credentials = (ctx.credentials != Credentials::Anonymous).then_some(&ctx.credentials);

    let version = get_latest_chart_version_with_timeout(
        &request.repo_url,
        &request.chart,
        &request.constraint,
        credentials,
        &config,
        ctx.deadline,
    )
    .await?;

    Ok(version.map(|version| ChartVersion {
        repository: request.repo_url.clone(),
        chart: request.chart_name().to_string(),
        version,
    }))
}

/// Handle the `chart` command
pub async fn handle_chart(ctx: &AppContext, request: &ChartRequest, fmt: OutputFormat) {
    match resolve_chart(ctx, request).await {
        Ok(Some(version)) => format::print(&version, fmt),
        Ok(None) => println!("no matching chart version found"),
        Err(e) => {
            format::error(&format::chain(&e));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "chart_tests.rs"]
mod tests;
