//! State threaded alongside every task
//!
//! # Components
//!
//! - `CrawlState`: breadcrumb labels plus the pagination item index, forked
//!   (never mutated) whenever a crawl branches

mod crawl_state;

pub use crawl_state::{label_key, CrawlState};
