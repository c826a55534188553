//! In-process controller
//!
//! The controller owns everything the extractors do not: routing URLs to
//! extractors, deduplication, bounded concurrent fetching, retries and
//! record output. It drives a crawl until no branch has work left.

mod retry;

pub use retry::{next_attempt, RetryDecision};

use crate::config::{Config, ControllerConfig};
use crate::extractor::Extractor;
use crate::gateway::{build_fetcher, Fetcher};
use crate::output::{CrawlStatistics, RecordSink};
use crate::sites::build_extractors;
use crate::state::CrawlState;
use crate::task::{FetchTask, FetchedResponse, Task};
use crate::{CrawlError, ExtractError, FetchError};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// A fetch task waiting to be executed
#[derive(Debug, Clone)]
struct Pending {
    state: CrawlState,
    task: FetchTask,
    extractor: usize,
    attempt: u32,
    delay: Duration,
}

/// A finished fetch, handed back to the main loop
struct Completed {
    pending: Pending,
    result: Result<FetchedResponse, FetchError>,
}

/// Bookkeeping of one run
struct RunState {
    frontier: VecDeque<Pending>,
    seen: HashSet<String>,
    stats: CrawlStatistics,
}

/// Main controller structure
pub struct Controller {
    extractors: Vec<Extractor>,
    fetcher: Arc<dyn Fetcher>,
    config: ControllerConfig,
}

impl Controller {
    /// Creates a new controller
    ///
    /// # Arguments
    ///
    /// * `extractors` - Extractors to route tasks to, tried in order
    /// * `fetcher` - Executes fetch tasks (gateway or direct)
    /// * `config` - Concurrency, retry and fetch-cap settings
    pub fn new(
        extractors: Vec<Extractor>,
        fetcher: Arc<dyn Fetcher>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            extractors,
            fetcher,
            config,
        }
    }

    pub fn extractors(&self) -> &[Extractor] {
        &self.extractors
    }

    /// Index of the first extractor whose allow-list accepts the URL
    pub fn route(&self, url: &Url) -> Option<usize> {
        self.extractors.iter().position(|e| e.accepts(url))
    }

    /// Crawls from every extractor's seeds
    pub async fn run(&self, sink: &mut dyn RecordSink) -> Result<CrawlStatistics, CrawlError> {
        let roots = self
            .extractors
            .iter()
            .flat_map(|e| e.seed_tasks())
            .collect();
        self.run_from(roots, sink).await
    }

    /// Crawls from the given root tasks
    ///
    /// Records are written to `sink` as they arrive. A sink error aborts
    /// the run; fetch and extraction failures never do.
    pub async fn run_from(
        &self,
        roots: Vec<(CrawlState, FetchTask)>,
        sink: &mut dyn RecordSink,
    ) -> Result<CrawlStatistics, CrawlError> {
        let mut run = RunState {
            frontier: VecDeque::new(),
            seen: HashSet::new(),
            stats: CrawlStatistics::new(),
        };

        for (state, task) in roots {
            self.dispatch(state, Task::Fetch(task), &mut run, sink)?;
        }
        tracing::info!(
            "Starting crawl with {} root tasks across {} extractors",
            run.frontier.len(),
            self.extractors.len()
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1) as usize));
        let mut in_flight: JoinSet<Completed> = JoinSet::new();

        loop {
            while let Some(pending) = run.frontier.pop_front() {
                if let Some(max) = self.config.max_fetches {
                    if run.stats.fetches >= max {
                        run.stats.capped += 1 + run.frontier.len() as u64;
                        tracing::warn!(
                            "Fetch cap of {} reached, dropping {} queued tasks",
                            max,
                            1 + run.frontier.len()
                        );
                        run.frontier.clear();
                        break;
                    }
                }

                run.stats.fetches += 1;
                let fetcher = Arc::clone(&self.fetcher);
                let semaphore = Arc::clone(&semaphore);
                in_flight.spawn(async move {
                    if !pending.delay.is_zero() {
                        tokio::time::sleep(pending.delay).await;
                    }
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => fetcher.execute(&pending.task).await,
                        Err(_) => Err(FetchError::Connect {
                            url: pending.task.url.to_string(),
                            message: "controller shut down".to_string(),
                        }),
                    };
                    Completed { pending, result }
                });
            }

            match in_flight.join_next().await {
                Some(Ok(completed)) => self.handle(completed, &mut run, sink)?,
                Some(Err(e)) => {
                    tracing::error!("Fetch task panicked: {}", e);
                    run.stats.abandoned += 1;
                }
                None => break,
            }
        }

        sink.flush()?;
        run.stats.finish();

        tracing::info!(
            "Crawl completed: {} fetches, {} records, {} failures in {}s",
            run.stats.fetches,
            run.stats.records,
            run.stats.total_failures(),
            run.stats.duration_seconds().unwrap_or(0)
        );

        Ok(run.stats)
    }

    /// Routes one emitted task
    fn dispatch(
        &self,
        state: CrawlState,
        task: Task,
        run: &mut RunState,
        sink: &mut dyn RecordSink,
    ) -> Result<(), CrawlError> {
        match task {
            Task::Record(record) => {
                sink.write_record(&record.product)?;
                run.stats.record_product(&record.product.site);
            }
            Task::Fetch(task) => {
                let Some(extractor) = self.route(&task.url) else {
                    tracing::debug!("No extractor accepts {}, dropping", task.url);
                    run.stats.unroutable += 1;
                    return Ok(());
                };

                if !run.seen.insert(task.dedupe_key().to_string()) {
                    tracing::trace!("Already scheduled: {}", task.dedupe_key());
                    run.stats.duplicates += 1;
                    return Ok(());
                }

                run.frontier.push_back(Pending {
                    state,
                    task,
                    extractor,
                    attempt: 0,
                    delay: Duration::ZERO,
                });
            }
        }
        Ok(())
    }

    /// Feeds a finished fetch to its extractor, or schedules a retry
    fn handle(
        &self,
        completed: Completed,
        run: &mut RunState,
        sink: &mut dyn RecordSink,
    ) -> Result<(), CrawlError> {
        let Completed { pending, result } = completed;
        let extractor = &self.extractors[pending.extractor];

        let mut emitted: Vec<(CrawlState, Task)> = Vec::new();
        let outcome = result
            .map_err(ExtractError::from)
            .and_then(|response| extractor.parse(&pending.state, &response, &mut emitted));

        match outcome {
            Ok(summary) => {
                run.stats.record_page(summary.kind.as_str());
                for (state, task) in emitted {
                    self.dispatch(state, task, run, sink)?;
                }
            }
            Err(error) => {
                run.stats.record_failure(error.kind());
                self.retry(pending, &error, run);
            }
        }

        Ok(())
    }

    fn retry(&self, pending: Pending, error: &ExtractError, run: &mut RunState) {
        let base_delay = Duration::from_millis(self.config.retry_delay_ms);
        match next_attempt(
            &pending.task.options,
            error.retry_hint(),
            pending.attempt,
            self.config.max_retries,
            base_delay,
        ) {
            RetryDecision::Retry { options, delay } => {
                tracing::warn!(
                    "Retrying {} (attempt {}): {}",
                    pending.task.url,
                    pending.attempt + 1,
                    error
                );
                run.stats.retries += 1;
                let mut task = pending.task;
                task.options = options;
                run.frontier.push_back(Pending {
                    task,
                    attempt: pending.attempt + 1,
                    delay,
                    ..pending
                });
            }
            RetryDecision::Abandon => {
                tracing::error!("Abandoning {}: {}", pending.task.url, error);
                run.stats.abandoned += 1;
            }
        }
    }
}

/// Builds the extractors and fetcher a config describes and crawls
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `only_site` - Restrict the crawl to one `[[site]]` entry
/// * `sink` - Receives every record
pub async fn run_crawl(
    config: &Config,
    only_site: Option<&str>,
    sink: &mut dyn RecordSink,
) -> Result<CrawlStatistics, CrawlError> {
    if let Some(name) = only_site {
        if config.site(name).is_none() {
            return Err(CrawlError::UnknownSite(name.to_string()));
        }
    }

    let extractors = build_extractors(config, only_site)?;
    let fetcher = build_fetcher(config)?;
    let controller = Controller::new(extractors, fetcher, config.controller.clone());
    controller.run(sink).await
}
