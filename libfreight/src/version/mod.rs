//! Semantic version helpers shared by chart and image resolution.
//!
//! Parsing is deliberately lenient in the same places registries and chart
//! repositories are: a leading `v` is accepted and missing minor/patch
//! components are filled with zeros. Constraint expressions accept the
//! `semver` crate's comma syntax as well as whitespace-separated
//! comparators, `||` alternatives, hyphen ranges and `!=` exclusions. A
//! version written without an operator pins that exact version.

use crate::error::{FreightError, Result};
use semver::{Version, VersionReq};
use std::fmt;
use std::str::FromStr;


/// Parses `input` as a semantic version.
///
/// # Examples
///
/// ```
/// use libfreight::version::parse_version;
///
/// assert_eq!(parse_version("v1.2").unwrap().to_string(), "1.2.0");
/// assert!(parse_version("latest").is_err());
/// ```
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let unprefixed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    // Split the numeric core from pre-release / build metadata.
    let split_at = unprefixed.find(['-', '+']).unwrap_or(unprefixed.len());
    let (core, rest) = unprefixed.split_at(split_at);

    let padded = match core.matches('.').count() {
        0 if !core.is_empty() => format!("{core}.0.0{rest}"),
        1 => format!("{core}.0{rest}"),
        _ => unprefixed.to_string(),
    };

    Version::parse(&padded)
        .map_err(|e| FreightError::parse_with_source(format!("error parsing version {input:?}"), e))
}

/// A parsed version constraint: one or more alternatives, any of which may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    alternatives: Vec<Alternative>,
}

/// Comparators joined by AND, plus versions ruled out with `!=`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Alternative {
    req: VersionReq,
    excluded: Vec<Version>,
}

impl Alternative {
    fn parse(expr: &str, alt: &str) -> Result<Self> {
        let invalid = || FreightError::parse(format!("error parsing constraint {expr:?}"));
        let comparators = normalize_alternative(alt).ok_or_else(invalid)?;

        let mut excluded = Vec::new();
        let mut kept = Vec::new();
        for comparator in comparators {
            match comparator.strip_prefix("!=") {
                Some(version) => excluded.push(parse_version(version).map_err(|_| invalid())?),
                None => kept.push(comparator),
            }
        }

        // Only exclusions: anything else goes.
        let req = if kept.is_empty() {
            VersionReq::STAR
        } else {
            VersionReq::parse(&kept.join(", ")).map_err(|e| {
                FreightError::parse_with_source(format!("error parsing constraint {expr:?}"), e)
            })?
        };
        Ok(Self { req, excluded })
    }

    fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.contains(version)
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.excluded.len() + 1);
        if self.excluded.is_empty() || self.req != VersionReq::STAR {
            parts.push(self.req.to_string());
        }
        parts.extend(self.excluded.iter().map(|v| format!("!={v}")));
        f.write_str(&parts.join(", "))
    }
}

impl Constraint {
    /// Parses a constraint expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::version::{Constraint, parse_version};
    ///
    /// let c = Constraint::parse(">=1.0.0 <2.0.0 || ^3.1").unwrap();
    /// assert!(c.matches(&parse_version("1.4.0").unwrap()));
    /// assert!(c.matches(&parse_version("3.2.0").unwrap()));
    /// assert!(!c.matches(&parse_version("2.5.0").unwrap()));
    /// ```
    pub fn parse(expr: &str) -> Result<Self> {
        let alternatives = expr
            .split("||")
            .map(|alt| Alternative::parse(expr, alt))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { alternatives })
    }

    /// Returns true if `version` satisfies any alternative.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(version))
    }
}

impl FromStr for Constraint {
    type Err = FreightError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.alternatives.iter().map(|a| a.to_string()).collect();
        f.write_str(&rendered.join(" || "))
    }
}

/// Rewrites one `||` alternative into `semver::VersionReq` comparators.
///
/// A version without an operator is an exact pin. `!=` comparators are
/// passed through for the caller to handle. Returns `None` for an empty
/// alternative.
fn normalize_alternative(alt: &str) -> Option<Vec<String>> {
    let tokens: Vec<&str> = alt
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return None;
    }

    if let [low, "-", high] = tokens.as_slice() {
        return Some(vec![
            format!(">={}", strip_v(low.trim_start_matches('='))),
            format!("<={}", strip_v(high.trim_start_matches('='))),
        ]);
    }

    // Re-attach operators written apart from their version (">= 1.0.0").
    let mut comparators: Vec<String> = Vec::with_capacity(tokens.len());
    let mut pending_op: Option<&str> = None;
    for token in tokens {
        if token.chars().all(is_operator_char) {
            pending_op = Some(token);
            continue;
        }
        let joined = match pending_op.take() {
            Some(op) => format!("{op}{token}"),
            None if is_exact_version(strip_v(token)) => format!("={token}"),
            None => token.to_string(),
        };
        comparators.push(strip_comparator_v(&joined));
    }
    if let Some(op) = pending_op {
        // Dangling operator; let VersionReq report it.
        comparators.push(op.to_string());
    }

    Some(comparators)
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '~' | '^')
}

// "1.2.3" or "1.2", but not "1.x", "1.2.*" or "*".
fn is_exact_version(token: &str) -> bool {
    let core = token.split(['-', '+']).next().unwrap_or(token);
    token.starts_with(|c: char| c.is_ascii_digit())
        && !core.split('.').any(|part| matches!(part, "*" | "x" | "X"))
}

fn strip_comparator_v(comparator: &str) -> String {
    let op_len = comparator
        .chars()
        .take_while(|c| is_operator_char(*c))
        .count();
    let (op, version) = comparator.split_at(op_len);
    format!("{op}{}", strip_v(version))
}

fn strip_v(version: &str) -> &str {
    match version.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}

/// Returns the candidate with the highest version that satisfies `constraint`.
///
/// Candidates are ordered by descending version; equal versions keep their
/// input order. No constraint means the highest version wins.
pub fn select_latest<T>(
    mut candidates: Vec<(Version, T)>,
    constraint: Option<&Constraint>,
) -> Option<T> {
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates
        .into_iter()
        .find(|(version, _)| constraint.is_none_or(|c| c.matches(version)))
        .map(|(_, item)| item)
}

/// Sorts version strings from highest to lowest.
///
/// Fails if any string is not a semantic version.
pub fn sort_versions_descending<S: AsRef<str>>(versions: &[S]) -> Result<Vec<String>> {
    let mut parsed = versions
        .iter()
        .map(|v| parse_version(v.as_ref()).map(|parsed| (parsed, v.as_ref().to_string())))
        .collect::<Result<Vec<_>>>()?;
    parsed.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(parsed.into_iter().map(|(_, original)| original).collect())
}

/// Picks the highest version in `versions` that satisfies `constraint`.
///
/// An empty `constraint` means unconstrained. A non-empty constraint must be
/// well formed and every input must parse as a semantic version, otherwise a
/// parse error is returned. When nothing satisfies the constraint the
/// result is `Ok(None)`. The returned string is the input as given.
///
/// # Examples
///
/// ```
/// use libfreight::version::get_latest_version;
///
/// let versions = ["2.0.0", "1.0.0", "1.1.0"];
/// assert_eq!(get_latest_version(&versions, "^1.0.0").unwrap().as_deref(), Some("1.1.0"));
/// assert_eq!(get_latest_version(&versions, "").unwrap().as_deref(), Some("2.0.0"));
/// assert_eq!(get_latest_version(&versions, "^3.0.0").unwrap(), None);
/// ```
pub fn get_latest_version<S: AsRef<str>>(versions: &[S], constraint: &str) -> Result<Option<String>> {
    let constraint = if constraint.trim().is_empty() {
        None
    } else {
        Some(Constraint::parse(constraint)?)
    };

    let candidates = versions
        .iter()
        .map(|v| parse_version(v.as_ref()).map(|parsed| (parsed, v.as_ref().to_string())))
        .collect::<Result<Vec<_>>>()?;

    Ok(select_latest(candidates, constraint.as_ref()))
}
