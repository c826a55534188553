//! Output module for extracted records and run summaries
//!
//! This module handles:
//! - Writing product records (JSON lines, SQLite, in-memory)
//! - Collecting run statistics
//! - Generating the markdown summary of a run

mod jsonl;
mod markdown;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sqlite_output::SqliteSink;
pub use stats::{print_statistics, print_stored_statistics, CrawlStatistics, StoredStatistics};
pub use traits::{FanOutSink, MemorySink, OutputError, OutputResult, RecordSink};

use crate::config::OutputConfig;
use std::path::Path;

/// Opens every sink the `[output]` section asks for
///
/// # Returns
///
/// * `Ok(FanOutSink)` - The JSON-lines sink, plus SQLite when configured
/// * `Err(OutputError)` - A file or database could not be opened
pub fn build_sinks(config: &OutputConfig) -> OutputResult<FanOutSink> {
    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();
    sinks.push(Box::new(JsonLinesSink::create(Path::new(&config.records_path))?));

    if let Some(database_path) = &config.database_path {
        sinks.push(Box::new(SqliteSink::open(Path::new(database_path))?));
    }

    Ok(FanOutSink::new(sinks))
}
