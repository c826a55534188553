//! Page-kind handlers
//!
//! Each handler parses the whole page first and returns the tasks it
//! produced; `Extractor::parse` forwards them only on success.

use crate::extractor::pagination::{continuation, Continuation};
use crate::extractor::{Extractor, PageKind};
use crate::product::{Product, Variant};
use crate::sites::{NavNode, Page};
use crate::state::{label_key, CrawlState};
use crate::task::Task;
use crate::url::strip_query;
use crate::ExtractError;
use chrono::Utc;
use url::Url;

type Emitted = Vec<(CrawlState, Task)>;

impl Extractor {
    /// Emits one listing task per navigation leaf, labelled with its path
    /// through the menu
    pub(super) fn handle_root(
        &self,
        state: &CrawlState,
        page: &Page<'_>,
    ) -> Result<Emitted, ExtractError> {
        let navigation = self.parser.parse_navigation(page)?;

        let mut leaves = Vec::new();
        collect_leaves(&navigation, state, 0, &mut leaves);

        let mut emitted: Emitted = Vec::new();
        let mut seen: Vec<Url> = Vec::new();
        for (child, url) in leaves {
            if !self.accepts(&url) || self.routes.classify(&url) != Some(PageKind::Listing) {
                tracing::trace!("{}: skipping menu link {}", self.name, url);
                continue;
            }
            if seen.contains(&url) {
                continue;
            }
            seen.push(url.clone());

            let task = self.fetch_task(PageKind::Listing, url);
            emitted.push((child.restart_pagination(), task.into()));
        }

        if emitted.is_empty() {
            return Err(ExtractError::failed(
                page.url.as_str(),
                "navigation has no listing links",
            ));
        }

        Ok(emitted)
    }

    /// Emits one detail task per product link, numbered along the
    /// pagination chain, followed by at most one continuation
    pub(super) fn handle_listing(
        &self,
        state: &CrawlState,
        page: &Page<'_>,
    ) -> Result<Emitted, ExtractError> {
        let listing = self.parser.parse_listing(page)?;

        let inbound = state.item_index();
        let mut index = inbound;
        let mut emitted: Emitted = Vec::new();

        for item in &listing.items {
            if !self.accepts(item) || self.routes.classify(item) != Some(PageKind::Detail) {
                tracing::trace!("{}: skipping listing link {}", self.name, item);
                continue;
            }
            index += 1;
            let task = self.fetch_task(PageKind::Detail, item.clone());
            emitted.push((state.with_item_index(index), task.into()));
        }

        match continuation(
            page.url,
            &listing,
            inbound,
            index,
            self.offset_param.as_deref(),
        ) {
            Continuation::Next(next) if self.accepts(&next) => {
                let task = self.fetch_task(PageKind::Listing, next);
                emitted.push((state.with_item_index(index), task.into()));
            }
            Continuation::Next(next) => {
                tracing::debug!("{}: next page {} is off-site", self.name, next);
            }
            Continuation::Stop(reason) => {
                tracing::debug!(
                    "{}: listing {} ends at index {} ({})",
                    self.name,
                    page.url,
                    index,
                    reason.as_str()
                );
            }
        }

        Ok(emitted)
    }

    /// Emits the product record, plus one task per color living on
    /// another page
    pub(super) fn handle_detail(
        &self,
        state: &CrawlState,
        page: &Page<'_>,
    ) -> Result<Emitted, ExtractError> {
        let detail = self.parser.parse_detail(page)?;
        if detail.name.is_empty() {
            return Err(ExtractError::failed(page.url.as_str(), "product has no name"));
        }

        let canonical = strip_query(page.url);
        let mut variants: Vec<Variant> = Vec::new();
        let mut siblings: Vec<Url> = Vec::new();

        for color in detail.colors {
            match color.url {
                Some(url) if strip_query(&url) != canonical => {
                    if self.accepts(&url) && self.routes.classify(&url) == Some(PageKind::Detail) {
                        if !siblings.contains(&url) {
                            siblings.push(url);
                        }
                    } else {
                        tracing::debug!(
                            "{}: color {} links to {}, not a product page; kept inline",
                            self.name,
                            color.variant.color,
                            url
                        );
                        variants.push(color.variant);
                    }
                }
                _ => variants.push(color.variant),
            }
        }

        let product = Product {
            site: self.name.clone(),
            brand: detail.brand.or_else(|| self.brand.clone()),
            product_id: detail.product_id,
            name: detail.name,
            description: detail.description,
            source_url: page.url.to_string(),
            canonical_url: canonical.to_string(),
            categories: state.breadcrumb(),
            crawl_index: state.item_index(),
            price: detail
                .price
                .or_else(|| variants.iter().find_map(|v| v.price.clone())),
            images: detail.images,
            variants,
            extracted_at: Utc::now(),
        };

        let mut emitted: Emitted = vec![(state.clone(), product.into())];
        for url in siblings {
            let task = self.fetch_task(PageKind::Detail, url);
            emitted.push((state.restart_pagination(), task.into()));
        }

        Ok(emitted)
    }
}

/// Depth-first walk of the menu, forking one labelled state per level
fn collect_leaves(
    nodes: &[NavNode],
    state: &CrawlState,
    depth: usize,
    leaves: &mut Vec<(CrawlState, Url)>,
) {
    for node in nodes {
        let child = state.with_label(label_key(depth), node.label.as_str());
        if node.children.is_empty() {
            if let Some(url) = &node.url {
                leaves.push((child, url.clone()));
            }
        } else {
            collect_leaves(&node.children, &child, depth + 1, leaves);
        }
    }
}
