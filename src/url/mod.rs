//! URL handling module
//!
//! This module provides domain extraction, wildcard matching for the
//! per-extractor domain allow-list, and the URL rewriting helpers used by
//! extractors (link resolution, canonicalization, offset pagination).

mod canonical;
mod domain;
mod matcher;

use url::Url;

// Re-export main functions
pub use canonical::{resolve_link, set_query_param, strip_query};
pub use domain::extract_domain;
pub use matcher::matches_wildcard;

/// Hostname allow-list of one extractor
///
/// The controller only routes a URL to an extractor whose filter accepts
/// the URL's host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFilter {
    patterns: Vec<String>,
}

impl DomainFilter {
    /// Creates a filter from glob patterns such as "shop.example.com" or
    /// "*.example.com"
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the URL's host matches any pattern
    pub fn accepts(&self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(domain) => self.accepts_domain(&domain),
            None => false,
        }
    }

    /// Returns true if the (lowercase) domain matches any pattern
    pub fn accepts_domain(&self, domain: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| matches_wildcard(pattern, domain))
    }
}
