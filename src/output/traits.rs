//! Record sink trait and simple implementations

use crate::product::Product;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination of finished product records
///
/// Records may arrive more than once for the same canonical URL, since
/// fetches are delivered at least once.
pub trait RecordSink: Send {
    /// Writes one record
    fn write_record(&mut self, product: &Product) -> OutputResult<()>;

    /// Makes everything written so far durable
    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

/// Keeps records in memory, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Product>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records written so far
    pub fn records(&self) -> Vec<Product> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn write_record(&mut self, product: &Product) -> OutputResult<()> {
        self.records
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock records: {}", e)))?
            .push(product.clone());
        Ok(())
    }
}

/// Writes every record to several sinks
pub struct FanOutSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for FanOutSink {
    fn write_record(&mut self, product: &Product) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.write_record(product)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_product(canonical_url: &str, site: &str) -> Product {
    use crate::product::{Price, SizeOption, Variant};
    Product {
        site: site.to_string(),
        brand: Some("Demo".to_string()),
        product_id: "1042".to_string(),
        name: "Linen Shirt".to_string(),
        description: None,
        source_url: format!("{}?color=white", canonical_url),
        canonical_url: canonical_url.to_string(),
        categories: vec!["Men".to_string(), "Shirts".to_string()],
        crawl_index: 3,
        price: Some(Price {
            currency: "EUR".to_string(),
            current: 29.95,
            list: Some(39.95),
        }),
        images: vec![],
        variants: vec![Variant {
            color: "White".to_string(),
            color_code: Some("001".to_string()),
            price: None,
            images: vec![],
            sizes: vec![SizeOption {
                label: "M".to_string(),
                sku: None,
                available: true,
            }],
        }],
        extracted_at: chrono::Utc::now(),
    }
}
