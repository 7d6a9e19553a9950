use super::{Image, SelectionStrategy, Source};
use crate::error::Result;
use tracing::trace;

/// Picks the image with the most recent build time.
///
/// Every filtered tag is resolved. Tags without a platform match are
/// skipped, images without a build time rank below any that have one, and
/// ties go to the earliest tag in registry order.
#[derive(Debug)]
pub struct NewestBuildSelector {
    pub(crate) source: Source,
}

impl NewestBuildSelector {
    pub(crate) fn new(source: Source) -> Self {
        Self { source }
    }

    pub(crate) async fn select(&self) -> Result<Option<Image>> {
        let tags = self
            .source
            .filtered_tags(SelectionStrategy::NewestBuild)
            .await?;

        let mut newest: Option<Image> = None;
        for tag in &tags {
            let Some(image) = self.source.image(tag).await? else {
                trace!(tag = %tag, "skipping tag without platform match");
                continue;
            };
            // Option<DateTime> orders None below Some, so undated images lose.
            let is_newer = newest
                .as_ref()
                .is_none_or(|current| image.created_at > current.created_at);
            if is_newer {
                newest = Some(image);
            }
        }
        Ok(newest)
    }
}
