//! URL handling module
//!
//! This module provides link normalization. Two canonical forms are supported,
//! selected by [`LinkMode`]: full-path normalization (the default) and
//! origin-only collapsing.

mod normalize;

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

// Re-export main functions
pub use normalize::{normalize_url, origin_of};

use crate::UrlResult;

/// How discovered links are canonicalized before they enter the visited set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkMode {
    /// Keep the full path; two links are the same page only if their
    /// normalized URLs match
    #[default]
    Full,

    /// Collapse every link to `scheme://host[:port]`, crawling at site level
    Origin,
}

impl LinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Origin => "origin",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "origin" => Ok(Self::Origin),
            other => Err(format!("unknown link mode '{}', expected 'full' or 'origin'", other)),
        }
    }
}

/// Canonicalizes an absolute link according to `mode`
///
/// # Examples
///
/// ```
/// use fanout_crawler::url::{normalize_link, LinkMode};
///
/// let full = normalize_link("https://Example.com/a/b#top", LinkMode::Full).unwrap();
/// assert_eq!(full, "https://example.com/a/b");
///
/// let origin = normalize_link("https://example.com/a/b", LinkMode::Origin).unwrap();
/// assert_eq!(origin, "https://example.com");
/// ```
pub fn normalize_link(link: &str, mode: LinkMode) -> UrlResult<String> {
    match mode {
        LinkMode::Full => normalize_url(link).map(|url| url.to_string()),
        LinkMode::Origin => origin_of(link),
    }
}
