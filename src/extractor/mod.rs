//! Extractor engine
//!
//! An `Extractor` handles exactly one fetched response per call: it
//! classifies the target URL, hands the body to the matching page-kind
//! handler and passes the resulting tasks to a `TaskSink`. It holds no
//! mutable state, so responses of different branches can be parsed in any
//! order.

mod blocking;
mod handlers;
pub mod pagination;
mod policy;
mod routes;
pub mod selftest;
mod sink;

pub use blocking::{BlockDetector, DEFAULT_MARKERS};
pub use pagination::{continuation, Continuation, StopReason};
pub use policy::OptionsPolicy;
pub use routes::RouteTable;
pub use selftest::{run_self_tests, SelfTestReport, SelfTestResult};
pub use sink::{FnSink, TaskSink};

use crate::sites::{Page, SiteParser};
use crate::state::CrawlState;
use crate::task::{FetchOptions, FetchTask, FetchedResponse, Task};
use crate::url::{strip_query, DomainFilter};
use crate::ExtractError;
use url::Url;

/// The handler a page is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// Entry page carrying the navigation menu
    Root,
    /// Paginated list of product links
    Listing,
    /// One product
    Detail,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Listing => "listing",
            Self::Detail => "detail",
        }
    }
}

/// What one `parse` call emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    pub kind: PageKind,
    pub fetches: usize,
    pub records: usize,
}

/// Per-site crawl logic
pub struct Extractor {
    name: String,
    brand: Option<String>,
    domains: DomainFilter,
    seeds: Vec<Url>,
    routes: RouteTable,
    policy: OptionsPolicy,
    blocks: BlockDetector,
    offset_param: Option<String>,
    parser: Box<dyn SiteParser>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("name", &self.name)
            .field("domains", &self.domains)
            .field("seeds", &self.seeds)
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl Extractor {
    pub fn new(
        name: &str,
        domains: DomainFilter,
        seeds: Vec<Url>,
        routes: RouteTable,
        parser: Box<dyn SiteParser>,
    ) -> Self {
        Self {
            name: name.to_string(),
            brand: None,
            domains,
            seeds,
            routes,
            policy: OptionsPolicy::default(),
            blocks: BlockDetector::default(),
            offset_param: None,
            parser,
        }
    }

    /// Brand used for records whose page does not name one
    pub fn with_brand(mut self, brand: Option<String>) -> Self {
        self.brand = brand;
        self
    }

    pub fn with_policy(mut self, policy: OptionsPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_block_detector(mut self, blocks: BlockDetector) -> Self {
        self.blocks = blocks;
        self
    }

    /// Query parameter used to page through listings without next links
    pub fn with_offset_param(mut self, offset_param: Option<String>) -> Self {
        self.offset_param = offset_param;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seeds(&self) -> &[Url] {
        &self.seeds
    }

    pub fn domains(&self) -> &DomainFilter {
        &self.domains
    }

    /// Returns true if the URL's host is on this extractor's allow-list
    pub fn accepts(&self, url: &Url) -> bool {
        self.domains.accepts(url)
    }

    /// Selects the handler for a URL
    ///
    /// # Returns
    ///
    /// * `Ok(PageKind)` - The first route matching the URL
    /// * `Err(ExtractError::UnsupportedPath)` - Foreign host or no route matches
    pub fn classify(&self, url: &Url) -> Result<PageKind, ExtractError> {
        if !self.accepts(url) {
            return Err(ExtractError::UnsupportedPath {
                url: url.to_string(),
            });
        }
        self.routes
            .classify(url)
            .ok_or_else(|| ExtractError::UnsupportedPath {
                url: url.to_string(),
            })
    }

    /// Identity URL: detail pages lose their query, everything else is kept
    pub fn canonical_url(&self, url: &Url) -> Url {
        match self.routes.classify(url) {
            Some(PageKind::Detail) => strip_query(url),
            _ => url.clone(),
        }
    }

    pub fn fetch_options(&self, kind: PageKind, url: &Url) -> FetchOptions {
        self.policy.options_for(kind, url)
    }

    /// Fetch task for a URL of a known kind
    pub fn fetch_task(&self, kind: PageKind, url: Url) -> FetchTask {
        let options = self.fetch_options(kind, &url);
        FetchTask::get(url, options)
    }

    /// Root tasks, one per seed, each with a fresh state
    pub fn seed_tasks(&self) -> Vec<(CrawlState, FetchTask)> {
        self.seeds
            .iter()
            .map(|seed| {
                let kind = self.routes.classify(seed).unwrap_or(PageKind::Root);
                (CrawlState::new(), self.fetch_task(kind, seed.clone()))
            })
            .collect()
    }

    /// Handles one response, emitting its follow-up tasks
    ///
    /// Nothing is emitted unless the whole page was handled, so a failed
    /// call can be retried without producing duplicates.
    pub fn parse(
        &self,
        state: &CrawlState,
        response: &FetchedResponse,
        sink: &mut dyn TaskSink,
    ) -> Result<ParseSummary, ExtractError> {
        let url = &response.url;
        let kind = self.classify(url)?;

        if let Some(marker) = self.blocks.detect(response) {
            return Err(ExtractError::BlockedByRemote {
                url: url.to_string(),
                marker,
            });
        }

        if matches!(response.status, 404 | 410) {
            return Err(ExtractError::Gone {
                url: url.to_string(),
                status: response.status,
            });
        }

        if !response.is_success() {
            return Err(ExtractError::failed(
                url.as_str(),
                format!("unexpected status {}", response.status),
            ));
        }

        let body = response.text();
        let page = Page { url, body: &body };

        let emitted = match kind {
            PageKind::Root => self.handle_root(state, &page)?,
            PageKind::Listing => self.handle_listing(state, &page)?,
            PageKind::Detail => self.handle_detail(state, &page)?,
        };

        let mut summary = ParseSummary {
            kind,
            fetches: 0,
            records: 0,
        };
        for (child, task) in emitted {
            match &task {
                Task::Fetch(_) => summary.fetches += 1,
                Task::Record(_) => summary.records += 1,
            }
            sink.emit(child, task);
        }

        tracing::debug!(
            "{} {} page {}: {} fetches, {} records",
            self.name,
            kind.as_str(),
            url,
            summary.fetches,
            summary.records
        );

        Ok(summary)
    }

    /// Runs a captured response through the normal path, discarding the
    /// emitted tasks
    ///
    /// Used by self-tests to detect markup drift on the live site.
    pub fn validate(&self, response: &FetchedResponse) -> Result<ParseSummary, ExtractError> {
        let mut discarded: Vec<(CrawlState, Task)> = Vec::new();
        self.parse(&CrawlState::new(), response, &mut discarded)
    }
}
