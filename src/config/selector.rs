//! Glob selectors deciding which units a config section applies to.
//!
//! `*` matches within one path segment, `**` matches across segments.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use super::ConfigError;

/// Pattern that matches every unit.
pub const MATCH_ALL: &str = "**";

/// A compiled set of glob patterns; matches when any pattern matches.
#[derive(Debug, Clone)]
pub struct Selector {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Selector {
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Err(ConfigError::EmptySelector);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| ConfigError::Selector {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|source| ConfigError::Selector {
            pattern: patterns.join(", "),
            source,
        })?;

        Ok(Self { patterns, set })
    }

    pub fn all() -> Self {
        Self::new([MATCH_ALL]).expect("'**' is a valid glob")
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Match a normalized, `/`-separated path.
    pub fn matches(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

/// Rebase a pattern written in a nested config onto that config's directory.
///
/// `dir` is the normalized directory relative to the project root; an empty
/// `dir` leaves the pattern unchanged.
pub fn rebase_pattern(dir: &str, pattern: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        return pattern.to_string();
    }
    let pattern = pattern.trim_start_matches("./").trim_start_matches('/');
    format!("{dir}/{pattern}")
}
