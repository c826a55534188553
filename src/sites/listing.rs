use crate::config::{ListingConfig, ListingFormat};
use crate::sites::{ListingPage, Page};
use crate::url::{resolve_link, set_query_param};
use crate::{ConfigError, ExtractError};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

/// Listing page parser, HTML or JSON depending on the site
pub enum ListingParser {
    Html(HtmlListing),
    Json(JsonListing),
}

impl ListingParser {
    pub fn new(config: &ListingConfig) -> Result<Self, ConfigError> {
        match config.format {
            ListingFormat::Html => Ok(Self::Html(HtmlListing::new(config)?)),
            ListingFormat::Json => Ok(Self::Json(JsonListing::new(config))),
        }
    }

    pub fn parse(&self, page: &Page<'_>) -> Result<ListingPage, ExtractError> {
        match self {
            Self::Html(parser) => Ok(parser.parse(page)),
            Self::Json(parser) => parser.parse(page),
        }
    }
}

/// Listing pages rendered as HTML product grids
pub struct HtmlListing {
    item_link: Selector,
    next_page: Option<Selector>,
    total_count: Option<Selector>,
    number: Regex,
}

impl HtmlListing {
    pub fn new(config: &ListingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            item_link: selector(&config.item_link)?,
            next_page: config.next_page.as_deref().map(selector).transpose()?,
            total_count: config.total_count.as_deref().map(selector).transpose()?,
            number: Regex::new(r"\d[\d,.]*").map_err(|e| ConfigError::InvalidRoute {
                pattern: r"\d[\d,.]*".to_string(),
                message: e.to_string(),
            })?,
        })
    }

    /// A grid without product links is a valid, empty page
    pub fn parse(&self, page: &Page<'_>) -> ListingPage {
        let document = Html::parse_document(page.body);

        let mut items: Vec<Url> = Vec::new();
        for element in document.select(&self.item_link) {
            let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, page.url))
            else {
                continue;
            };
            // Product tiles often link the image and the title separately
            if !items.contains(&url) {
                items.push(url);
            }
        }

        let next_page = self.next_page.as_ref().and_then(|sel| {
            document
                .select(sel)
                .find_map(|e| e.value().attr("href"))
                .and_then(|href| resolve_link(href, page.url))
        });

        let total = self.total_count.as_ref().and_then(|sel| {
            let element = document.select(sel).next()?;
            match element.value().attr("data-total") {
                Some(raw) => parse_count(&self.number, raw),
                None => parse_count(&self.number, &element.text().collect::<String>()),
            }
        });

        ListingPage {
            items,
            next_page,
            total,
        }
    }
}

/// Listing pages served as JSON search results
pub struct JsonListing {
    items_pointer: String,
    item_url_field: String,
    total_pointer: Option<String>,
    next_pointer: Option<String>,
    cursor_param: String,
}

impl JsonListing {
    pub fn new(config: &ListingConfig) -> Self {
        Self {
            items_pointer: config.items_pointer.clone(),
            item_url_field: config.item_url_field.clone(),
            total_pointer: config.total_pointer.clone(),
            next_pointer: config.next_pointer.clone(),
            cursor_param: config.cursor_param.clone(),
        }
    }

    pub fn parse(&self, page: &Page<'_>) -> Result<ListingPage, ExtractError> {
        let document: Value = serde_json::from_str(page.body).map_err(|e| {
            ExtractError::failed(page.url.as_str(), format!("listing is not JSON: {}", e))
        })?;

        let entries = document
            .pointer(&self.items_pointer)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ExtractError::failed(
                    page.url.as_str(),
                    format!("no item array at {}", self.items_pointer),
                )
            })?;

        let mut items: Vec<Url> = Vec::new();
        for entry in entries {
            let Some(url) = entry
                .get(&self.item_url_field)
                .and_then(Value::as_str)
                .and_then(|href| resolve_link(href, page.url))
            else {
                continue;
            };
            if !items.contains(&url) {
                items.push(url);
            }
        }

        let total = self
            .total_pointer
            .as_deref()
            .and_then(|pointer| document.pointer(pointer))
            .and_then(|value| match value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            });

        let next_page = self
            .next_pointer
            .as_deref()
            .and_then(|pointer| document.pointer(pointer))
            .and_then(Value::as_str)
            .filter(|next| !next.trim().is_empty())
            .and_then(|next| self.next_page_url(next, page.url));

        Ok(ListingPage {
            items,
            next_page,
            total,
        })
    }

    /// Links are followed as-is; bare cursors go into the cursor parameter
    fn next_page_url(&self, next: &str, page_url: &Url) -> Option<Url> {
        let next = next.trim();
        if next.starts_with("http") || next.starts_with('/') || next.starts_with('?') {
            resolve_link(next, page_url)
        } else {
            Some(set_query_param(page_url, &self.cursor_param, next))
        }
    }
}

fn selector(raw: &str) -> Result<Selector, ConfigError> {
    Selector::parse(raw).map_err(|e| ConfigError::InvalidSelector {
        selector: raw.to_string(),
        message: format!("{:?}", e),
    })
}

/// Last number in a text such as "Showing 24 of 1,234 products"
fn parse_count(number: &Regex, text: &str) -> Option<u64> {
    number
        .find_iter(text)
        .last()
        .map(|m| {
            m.as_str()
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
}
