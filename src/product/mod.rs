//! Shared product schema
//!
//! Every extractor normalizes its detail pages into `Product`, whatever the
//! storefront's own structure looks like.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized product record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Name of the site that produced the record
    pub site: String,
    pub brand: Option<String>,
    /// The storefront's own identifier
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    /// URL the record was extracted from
    pub source_url: String,
    /// Identity URL, used for deduplication
    pub canonical_url: String,
    /// Category breadcrumb, outermost first
    pub categories: Vec<String>,
    /// Position along the listing chain that led here
    pub crawl_index: u64,
    pub price: Option<Price>,
    pub images: Vec<String>,
    /// Colors available on this page, each with its sizes
    pub variants: Vec<Variant>,
    pub extracted_at: DateTime<Utc>,
}

impl Product {
    /// True if any size of any variant is in stock
    pub fn is_available(&self) -> bool {
        self.variants
            .iter()
            .any(|v| v.sizes.iter().any(|s| s.available))
    }

    /// Number of sellable color/size combinations
    pub fn combination_count(&self) -> usize {
        self.variants.iter().map(|v| v.sizes.len().max(1)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub current: f64,
    /// Price before discount, when the page shows one
    pub list: Option<f64>,
}

impl Price {
    /// Whole-percent discount of `current` against `list`
    pub fn discount_percent(&self) -> Option<u32> {
        let list = self.list?;
        if list <= 0.0 || self.current >= list {
            return None;
        }
        Some(((list - self.current) / list * 100.0).round() as u32)
    }
}

/// One color of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub color: String,
    pub color_code: Option<String>,
    pub price: Option<Price>,
    pub images: Vec<String>,
    pub sizes: Vec<SizeOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeOption {
    pub label: String,
    pub sku: Option<String>,
    pub available: bool,
}
