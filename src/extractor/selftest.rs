//! Seed self-tests
//!
//! Every extractor's seed URLs are fetched and run through the normal
//! classify-and-handle path. A failure is reported against its site only,
//! so one storefront changing its markup never hides the others' results.

use crate::extractor::{Extractor, ParseSummary};
use crate::gateway::Fetcher;
use crate::{ExtractError, FailureKind};

/// Outcome of one seed URL
#[derive(Debug)]
pub struct SelfTestResult {
    pub site: String,
    pub url: String,
    pub outcome: Result<ParseSummary, ExtractError>,
}

impl SelfTestResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.outcome.as_ref().err().map(ExtractError::kind)
    }
}

#[derive(Debug, Default)]
pub struct SelfTestReport {
    pub results: Vec<SelfTestResult>,
}

impl SelfTestReport {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(SelfTestResult::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SelfTestResult> {
        self.results.iter().filter(|r| !r.passed())
    }

    /// Names of sites with at least one failing seed, in report order
    pub fn failed_sites(&self) -> Vec<&str> {
        let mut sites: Vec<&str> = Vec::new();
        for result in self.failures() {
            if !sites.contains(&result.site.as_str()) {
                sites.push(&result.site);
            }
        }
        sites
    }

    pub fn print(&self) {
        println!("Self-test results:");
        for result in &self.results {
            match &result.outcome {
                Ok(summary) => println!(
                    "  PASS  {:<20} {} ({} page, {} fetches, {} records)",
                    result.site,
                    result.url,
                    summary.kind.as_str(),
                    summary.fetches,
                    summary.records
                ),
                Err(error) => println!("  FAIL  {:<20} {} ({})", result.site, result.url, error),
            }
        }
        let failed = self.failures().count();
        println!(
            "{} of {} seeds passed",
            self.results.len() - failed,
            self.results.len()
        );
    }
}

/// Fetches every seed of every extractor and validates the response
pub async fn run_self_tests(extractors: &[Extractor], fetcher: &dyn Fetcher) -> SelfTestReport {
    let mut report = SelfTestReport::default();

    for extractor in extractors {
        for (_, task) in extractor.seed_tasks() {
            let outcome = match fetcher.execute(&task).await {
                Ok(response) => extractor.validate(&response),
                Err(e) => Err(ExtractError::from(e)),
            };

            match &outcome {
                Ok(_) => tracing::info!("Self-test passed: {} {}", extractor.name(), task.url),
                Err(e) => tracing::error!("Self-test failed: {} {}: {}", extractor.name(), task.url, e),
            }

            report.results.push(SelfTestResult {
                site: extractor.name().to_string(),
                url: task.url.to_string(),
                outcome,
            });
        }
    }

    report
}
