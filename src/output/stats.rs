//! Run statistics
//!
//! `CrawlStatistics` is filled in by the controller while a crawl runs;
//! `StoredStatistics` summarizes what a record database already holds.

use crate::FailureKind;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Counters of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Fetch attempts handed to the fetcher, retries included
    pub fetches: u64,

    /// Responses handled successfully, per page kind
    pub pages_by_kind: BTreeMap<&'static str, u64>,

    /// Records written to the sink
    pub records: u64,

    /// Records per site
    pub records_by_site: BTreeMap<String, u64>,

    /// Failed attempts per failure kind
    pub failures: BTreeMap<FailureKind, u64>,

    /// Attempts scheduled again after a failure
    pub retries: u64,

    /// Tasks given up on
    pub abandoned: u64,

    /// Fetch tasks dropped because their dedupe key was already seen
    pub duplicates: u64,

    /// Fetch tasks no extractor accepted
    pub unroutable: u64,

    /// Fetch tasks dropped by the fetch cap
    pub capped: u64,
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            fetches: 0,
            pages_by_kind: BTreeMap::new(),
            records: 0,
            records_by_site: BTreeMap::new(),
            failures: BTreeMap::new(),
            retries: 0,
            abandoned: 0,
            duplicates: 0,
            unroutable: 0,
            capped: 0,
        }
    }

    pub fn record_page(&mut self, kind: &'static str) {
        *self.pages_by_kind.entry(kind).or_insert(0) += 1;
    }

    pub fn record_product(&mut self, site: &str) {
        self.records += 1;
        *self.records_by_site.entry(site.to_string()).or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, kind: FailureKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of fetch attempts that were handled without error
    pub fn success_rate(&self) -> f64 {
        if self.fetches == 0 {
            return 0.0;
        }
        let handled: u64 = self.pages_by_kind.values().sum();
        (handled as f64 / self.fetches as f64) * 100.0
    }
}

/// Aggregates over a record database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredStatistics {
    pub total_records: u64,
    pub available_records: u64,
    pub records_by_site: BTreeMap<String, u64>,
    pub last_extracted_at: Option<String>,
}

/// Prints run statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Fetch attempts: {}", stats.fetches);
    println!("  Records written: {}", stats.records);
    println!("  Retries: {}", stats.retries);
    println!("  Abandoned tasks: {}", stats.abandoned);
    println!("  Duplicate tasks skipped: {}", stats.duplicates);
    if stats.unroutable > 0 {
        println!("  Unroutable tasks: {}", stats.unroutable);
    }
    if stats.capped > 0 {
        println!("  Tasks over the fetch cap: {}", stats.capped);
    }
    if let Some(seconds) = stats.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    if !stats.pages_by_kind.is_empty() {
        println!("Pages by Kind:");
        for (kind, count) in &stats.pages_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !stats.records_by_site.is_empty() {
        println!("Records by Site:");
        let mut sites: Vec<_> = stats.records_by_site.iter().collect();
        sites.sort_by(|a, b| b.1.cmp(a.1));
        for (site, count) in sites {
            println!("  {}: {}", site, count);
        }
        println!();
    }

    if !stats.failures.is_empty() {
        println!("Failures:");
        for (kind, count) in &stats.failures {
            println!("  {}: {}", kind.as_str(), count);
        }
        println!();
    }

    println!("Success Rate: {:.1}%", stats.success_rate());
}

/// Prints what a record database holds
pub fn print_stored_statistics(stats: &StoredStatistics) {
    println!("=== Stored Records ===\n");
    println!("  Total records: {}", stats.total_records);
    println!("  In stock: {}", stats.available_records);
    if let Some(last) = &stats.last_extracted_at {
        println!("  Last extraction: {}", last);
    }
    println!();

    for (site, count) in &stats.records_by_site {
        println!("  {}: {}", site, count);
    }
}
