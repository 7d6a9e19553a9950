use super::{Image, SelectionStrategy, Source};
use crate::error::Result;

/// Picks the greatest tag by plain string ordering.
#[derive(Debug)]
pub struct LexicalSelector {
    pub(crate) source: Source,
}

impl LexicalSelector {
    pub(crate) fn new(source: Source) -> Self {
        Self { source }
    }

    pub(crate) async fn select(&self) -> Result<Option<Image>> {
        let tags = self.source.filtered_tags(SelectionStrategy::Lexical).await?;
        match tags.iter().max() {
            Some(tag) => self.source.image(tag).await,
            None => Ok(None),
        }
    }
}
