use super::{Image, SelectionStrategy, Source};
use crate::error::Result;
use crate::version::{Constraint, parse_version, select_latest};
use tracing::trace;

/// Picks the highest semantic-version tag satisfying an optional constraint.
///
/// Tags that are not semantic versions are ignored.
#[derive(Debug)]
pub struct SemVerSelector {
    pub(crate) source: Source,
    constraint: Option<Constraint>,
}

impl SemVerSelector {
    pub(crate) fn new(source: Source, constraint: Option<&str>) -> Result<Self> {
        let constraint = constraint.map(Constraint::parse).transpose()?;
        Ok(Self { source, constraint })
    }

    pub(crate) async fn select(&self) -> Result<Option<Image>> {
        let tags = self.source.filtered_tags(SelectionStrategy::SemVer).await?;

        let candidates: Vec<_> = tags
            .into_iter()
            .filter_map(|tag| parse_version(&tag).ok().map(|version| (version, tag)))
            .collect();
        trace!(count = candidates.len(), "semantic version tags");

        match select_latest(candidates, self.constraint.as_ref()) {
            Some(tag) => self.source.image(&tag).await,
            None => Ok(None),
        }
    }
}
