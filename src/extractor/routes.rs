use crate::config::RoutesConfig;
use crate::extractor::PageKind;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Ordered URL patterns deciding which handler a page goes to
///
/// Patterns are matched against the path plus the query string
/// (`/c/shoes?page=2`). Rules are tried in order (root, listing, then
/// detail patterns) and the first match wins, so the same URL always
/// selects the same kind.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<(PageKind, Regex)>,
}

impl RouteTable {
    pub fn new(rules: Vec<(PageKind, Regex)>) -> Self {
        Self { rules }
    }

    /// Compiles the route patterns of a site entry
    pub fn from_config(config: &RoutesConfig) -> Result<Self, ConfigError> {
        let groups = [
            (PageKind::Root, &config.root),
            (PageKind::Listing, &config.listing),
            (PageKind::Detail, &config.detail),
        ];

        let mut rules = Vec::new();
        for (kind, patterns) in groups {
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRoute {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                rules.push((kind, regex));
            }
        }

        Ok(Self { rules })
    }

    pub fn classify(&self, url: &Url) -> Option<PageKind> {
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(&target))
            .map(|(kind, _)| *kind)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
