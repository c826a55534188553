//! Task envelope exchanged between extractors and the controller
//!
//! This module contains:
//! - `FetchOptions`: declarative retrieval policy for one URL
//! - `Task`: either an outbound fetch or a finished record
//! - `FetchedResponse`: what the controller hands back to an extractor

mod envelope;
mod options;
mod response;

pub use envelope::{FetchTask, Method, RecordTask, Task};
pub use options::{FetchOptions, ReliabilityTier};
pub use response::{FetchedResponse, Timing};
