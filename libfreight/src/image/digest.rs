use super::{Image, SelectionStrategy, Source};
use crate::error::{FreightError, Result};
use tracing::trace;

/// Picks the tag equal to a fixed constraint.
///
/// The allow pattern and ignore list are not applied: the constraint is an
/// exact pin.
#[derive(Debug)]
pub struct DigestSelector {
    pub(crate) source: Source,
    constraint: String,
}

impl DigestSelector {
    pub(crate) fn new(source: Source, constraint: Option<&str>) -> Result<Self> {
        let constraint = constraint
            .ok_or_else(|| FreightError::config("digest selection strategy requires a constraint"))?;
        Ok(Self {
            source,
            constraint: constraint.to_string(),
        })
    }

    pub(crate) async fn select(&self) -> Result<Option<Image>> {
        let tags = self.source.repo.get_tags().await?;
        if tags.is_empty() {
            trace!(selection_strategy = %SelectionStrategy::Digest, "found no tags");
            return Ok(None);
        }

        if !tags.iter().any(|tag| *tag == self.constraint) {
            trace!(constraint = %self.constraint, "tag not present");
            return Ok(None);
        }

        let image = self.source.image(&self.constraint).await?;
        if image.is_none() {
            trace!(
                tag = %self.constraint,
                "image with tag was found, but did not match platform constraint"
            );
        }
        Ok(image)
    }
}
