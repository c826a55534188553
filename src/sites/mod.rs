//! Site-specific page parsing
//!
//! Everything that depends on one storefront's markup lives behind the
//! `SiteParser` trait. The extractor engine only sees the structures
//! defined here (navigation trees, listing pages, product details), so the
//! crawl protocol can be tested without any HTML at all.

mod detail;
mod listing;
mod navigation;
mod storefront;

pub use storefront::StorefrontParser;

use crate::config::{Config, SiteConfig};
use crate::extractor::{BlockDetector, Extractor, OptionsPolicy, RouteTable};
use crate::product::{Price, Variant};
use crate::url::DomainFilter;
use crate::{ConfigError, ExtractError};
use url::Url;

/// A fetched page as seen by a site parser
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub url: &'a Url,
    pub body: &'a str,
}

/// One entry of a navigation menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    pub label: String,
    pub url: Option<Url>,
    pub children: Vec<NavNode>,
}

impl NavNode {
    pub fn leaf(label: impl Into<String>, url: Url) -> Self {
        Self {
            label: label.into(),
            url: Some(url),
            children: Vec::new(),
        }
    }

    pub fn branch(label: impl Into<String>, children: Vec<NavNode>) -> Self {
        Self {
            label: label.into(),
            url: None,
            children,
        }
    }
}

/// One page of a product listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Product links in page order
    pub items: Vec<Url>,
    /// Explicit next-page link, if the page has one
    pub next_page: Option<Url>,
    /// Total number of items the listing advertises
    pub total: Option<u64>,
}

/// A color as found on a detail page
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDetail {
    pub variant: Variant,
    /// Page holding this color, when it is not the current page
    pub url: Option<Url>,
}

/// Structured content of a detail page
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub product_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub images: Vec<String>,
    pub colors: Vec<ColorDetail>,
}

/// Markup-specific parsing for one storefront
///
/// Implementations return `ExtractError::ExtractionFailed` when the
/// expected structure is missing.
pub trait SiteParser: Send + Sync {
    fn parse_navigation(&self, page: &Page<'_>) -> Result<Vec<NavNode>, ExtractError>;

    fn parse_listing(&self, page: &Page<'_>) -> Result<ListingPage, ExtractError>;

    fn parse_detail(&self, page: &Page<'_>) -> Result<ProductDetail, ExtractError>;
}

/// Builds the extractor described by one `[[site]]` entry
pub fn build_extractor(site: &SiteConfig) -> Result<Extractor, ConfigError> {
    let seeds = site
        .seeds
        .iter()
        .map(|seed| {
            Url::parse(seed)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let routes = RouteTable::from_config(&site.routes)?;
    let parser = StorefrontParser::new(site)?;

    let extractor = Extractor::new(
        &site.name,
        DomainFilter::new(site.domains.iter().cloned()),
        seeds,
        routes,
        Box::new(parser),
    )
    .with_brand(site.brand.clone())
    .with_policy(OptionsPolicy::new(site.fetch.clone()))
    .with_block_detector(BlockDetector::from_markers(
        &site.block_markers,
        site.default_block_markers,
    ))
    .with_offset_param(site.listing.offset_param.clone());

    Ok(extractor)
}

/// Builds every configured extractor, optionally restricted to one site
pub fn build_extractors(config: &Config, only: Option<&str>) -> Result<Vec<Extractor>, ConfigError> {
    config
        .sites
        .iter()
        .filter(|site| only.map_or(true, |name| site.name == name))
        .map(build_extractor)
        .collect()
}
