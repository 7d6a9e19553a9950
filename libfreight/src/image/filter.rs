//! Tag filtering shared by every selection strategy.

use crate::error::{FreightError, Result};
use regex::Regex;

/// Returns true if `tag` passes the allow pattern. No pattern allows all.
///
/// # Examples
///
/// ```
/// use libfreight::image::filter::allows_tag;
/// use regex::Regex;
///
/// let lower = Regex::new("^[a-z]*$").unwrap();
/// assert!(allows_tag("yes", Some(&lower)));
/// assert!(!allows_tag("NO", Some(&lower)));
/// assert!(allows_tag("NO", None));
/// ```
pub fn allows_tag(tag: &str, allow: Option<&Regex>) -> bool {
    allow.is_none_or(|regex| regex.is_match(tag))
}

/// Returns true if `tag` is listed verbatim in `ignore`.
pub fn ignores_tag<S: AsRef<str>>(tag: &str, ignore: &[S]) -> bool {
    ignore.iter().any(|ignored| ignored.as_ref() == tag)
}

/// Compiled allow pattern plus ignore list.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    allow: Option<Regex>,
    ignore: Vec<String>,
}

impl TagFilter {
    /// Compiles `allow_regex`. An empty pattern counts as absent.
    pub fn new(allow_regex: Option<&str>, ignore: Vec<String>) -> Result<Self> {
        let allow = match allow_regex.filter(|pattern| !pattern.is_empty()) {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                FreightError::config_with_source(
                    format!("error compiling regular expression {:?}", pattern),
                    e,
                )
            })?),
            None => None,
        };
        Ok(Self { allow, ignore })
    }

    /// Keeps a tag iff it is allowed and not ignored.
    pub fn keeps(&self, tag: &str) -> bool {
        allows_tag(tag, self.allow.as_ref()) && !ignores_tag(tag, &self.ignore)
    }

    /// Filters `tags`, preserving their order.
    pub fn apply(&self, tags: Vec<String>) -> Vec<String> {
        tags.into_iter().filter(|tag| self.keeps(tag)).collect()
    }
}
