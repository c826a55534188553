use crate::config::DetailConfig;
use crate::product::{Price, SizeOption, Variant};
use crate::sites::{ColorDetail, Page, ProductDetail};
use crate::url::resolve_link;
use crate::{ConfigError, ExtractError};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Extracts the product JSON a detail page embeds in a script tag
pub struct EmbeddedProductParser {
    pattern: Regex,
    pointer: Option<String>,
}

impl EmbeddedProductParser {
    pub fn new(config: &DetailConfig) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&config.embedded_json).map_err(|e| ConfigError::InvalidRoute {
            pattern: config.embedded_json.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            pointer: config.product_pointer.clone(),
        })
    }

    pub fn parse(&self, page: &Page<'_>) -> Result<ProductDetail, ExtractError> {
        let raw = self
            .pattern
            .captures(page.body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .ok_or_else(|| ExtractError::failed(page.url.as_str(), "embedded product data not found"))?;

        let mut document: Value = serde_json::from_str(raw).map_err(|e| {
            ExtractError::failed(page.url.as_str(), format!("embedded product data: {}", e))
        })?;

        if let Some(pointer) = &self.pointer {
            document = document.pointer_mut(pointer).map(Value::take).ok_or_else(|| {
                ExtractError::failed(page.url.as_str(), format!("no product at {}", pointer))
            })?;
        }

        let embedded: EmbeddedProduct = serde_json::from_value(document).map_err(|e| {
            ExtractError::failed(page.url.as_str(), format!("unexpected product shape: {}", e))
        })?;

        Ok(embedded.into_detail(page.url))
    }
}

/// Identifiers show up both as strings and as numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Identifier {
    Text(String),
    Number(u64),
}

impl Identifier {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedProduct {
    #[serde(alias = "sku", alias = "productId")]
    id: Identifier,
    name: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    list_price: Option<f64>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    colors: Vec<EmbeddedColor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedColor {
    name: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    list_price: Option<f64>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    sizes: Vec<EmbeddedSize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedSize {
    label: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default = "default_available")]
    available: bool,
}

fn default_available() -> bool {
    true
}

fn price(currency: Option<&str>, current: Option<f64>, list: Option<f64>) -> Option<Price> {
    Some(Price {
        currency: currency?.to_string(),
        current: current?,
        list,
    })
}

impl EmbeddedProduct {
    fn into_detail(self, page_url: &Url) -> ProductDetail {
        let currency = self.currency.as_deref();
        let colors = self
            .colors
            .into_iter()
            .map(|color| ColorDetail {
                url: color
                    .url
                    .as_deref()
                    .and_then(|href| resolve_link(href, page_url)),
                variant: Variant {
                    price: price(currency, color.price, color.list_price),
                    color: color.name,
                    color_code: color.code,
                    images: color.images,
                    sizes: color
                        .sizes
                        .into_iter()
                        .map(|size| SizeOption {
                            label: size.label,
                            sku: size.sku,
                            available: size.available,
                        })
                        .collect(),
                },
            })
            .collect();

        ProductDetail {
            product_id: self.id.into_string(),
            price: price(currency, self.price, self.list_price),
            name: self.name.trim().to_string(),
            brand: self.brand,
            description: self.description,
            images: self.images,
            colors,
        }
    }
}
