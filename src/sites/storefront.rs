//! Config-driven storefront parser
//!
//! Covers the common storefront shape: a nested `ul` navigation menu, HTML
//! or JSON listing pages, and detail pages embedding their product data as
//! JSON inside a script tag.

use crate::config::SiteConfig;
use crate::sites::detail::EmbeddedProductParser;
use crate::sites::listing::ListingParser;
use crate::sites::navigation::MenuParser;
use crate::sites::{ListingPage, NavNode, Page, ProductDetail, SiteParser};
use crate::{ConfigError, ExtractError};

/// Site parser assembled from a `[[site]]` configuration entry
pub struct StorefrontParser {
    menu: MenuParser,
    listing: ListingParser,
    detail: EmbeddedProductParser,
}

impl StorefrontParser {
    /// Compiles the selectors and patterns of a site entry
    ///
    /// # Returns
    ///
    /// * `Ok(StorefrontParser)` - Every selector and pattern compiled
    /// * `Err(ConfigError)` - A selector or regex is invalid
    pub fn new(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            menu: MenuParser::new(&site.navigation.menu)?,
            listing: ListingParser::new(&site.listing)?,
            detail: EmbeddedProductParser::new(&site.detail)?,
        })
    }
}

impl SiteParser for StorefrontParser {
    fn parse_navigation(&self, page: &Page<'_>) -> Result<Vec<NavNode>, ExtractError> {
        self.menu.parse(page)
    }

    fn parse_listing(&self, page: &Page<'_>) -> Result<ListingPage, ExtractError> {
        self.listing.parse(page)
    }

    fn parse_detail(&self, page: &Page<'_>) -> Result<ProductDetail, ExtractError> {
        self.detail.parse(page)
    }
}
