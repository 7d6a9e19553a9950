//! `freight image`: pick one image from a container repository.

use crate::context::{AppContext, host_of};
use crate::format::{self, Formattable, OutputFormat};
use chrono::SecondsFormat;
use libfreight::image::{Image, SelectorOptions, new_selector};
use libfreight::Result;

/// What the user asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct ImageRequest {
    pub repository: String,
    pub strategy: String,
    pub constraint: Option<String>,
    pub allow_regex: Option<String>,
    pub ignore: Vec<String>,
    pub platform: Option<String>,
}

impl ImageRequest {
    fn options(&self, ctx: &AppContext) -> SelectorOptions {
        let mut options = SelectorOptions::new()
            .with_ignore(self.ignore.clone())
            .with_credentials(ctx.credentials.clone())
            .with_client_config(ctx.client_config_for(host_of(&self.repository)));

        if let Some(constraint) = &self.constraint {
            options = options.with_constraint(constraint.clone());
        }
        if let Some(pattern) = &self.allow_regex {
            options = options.with_allow_regex(pattern.clone());
        }
        if let Some(platform) = &self.platform {
            options = options.with_platform(platform.clone());
        }
        options
    }
}

impl Formattable for Image {
    fn format_pretty(&self) -> String {
        let reference = match &self.tag {
            Some(tag) => format!("{}:{}", self.repository, tag),
            None => format!("{}@{}", self.repository, self.digest),
        };

        let mut lines = vec![
            format!("{} {}", format::checkmark(), reference),
            format!("  {}    {}", format::label("digest"), self.digest),
        ];
        if let Some(platform) = &self.platform {
            lines.push(format!("  {}  {}", format::label("platform"), platform));
        }
        if let Some(created) = &self.created_at {
            lines.push(format!(
                "  {}   {}",
                format::label("created"),
                created.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        lines.join("\n")
    }
}

/// Runs the selection described by `request` within the context's deadline.
pub async fn select_image(ctx: &AppContext, request: &ImageRequest) -> Result<Option<Image>> {
    let selector = new_selector(&request.repository, &request.strategy, request.options(ctx))?;
    selector.select_with_timeout(ctx.deadline).await
}

/// Handle the `image` command
pub async fn handle_image(ctx: &AppContext, request: &ImageRequest, fmt: OutputFormat) {
    match select_image(ctx, request).await {
        Ok(Some(image)) => format::print(&image, fmt),
        Ok(None) => println!("no suitable image found"),
        Err(e) => {
            format::error(&format::chain(&e));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
