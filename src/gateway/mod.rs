//! Fetch execution
//!
//! This module contains the two ways the controller can execute a
//! `FetchTask`:
//! - `GatewayClient` forwards the task, options included, to a proxy
//!   gateway over HTTP POST
//! - `DirectFetcher` performs the request itself with `reqwest`, honoring
//!   only the transport-level options

mod client;
mod direct;
pub mod wire;

pub use client::{GatewayClient, FETCH_ROUTE};
pub use direct::DirectFetcher;
pub use wire::{GatewayRequest, GatewayResponse, WireOptions};

use crate::config::{Config, FetchMode};
use crate::task::{FetchTask, FetchedResponse};
use crate::{ConfigError, CrawlError, FetchError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Executes fetch tasks on behalf of extractors
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn execute(&self, task: &FetchTask) -> Result<FetchedResponse, FetchError>;
}

/// Builds the fetcher selected by the `[gateway]` section
pub fn build_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, CrawlError> {
    match config.gateway.mode {
        FetchMode::Gateway => {
            let endpoint = config.gateway.endpoint.as_deref().ok_or_else(|| {
                ConfigError::Validation("gateway mode requires an endpoint".to_string())
            })?;
            let timeout = Duration::from_millis(config.gateway.timeout_ms);
            Ok(Arc::new(GatewayClient::new(endpoint, timeout)?))
        }
        FetchMode::Direct => Ok(Arc::new(DirectFetcher::new(&config.user_agent)?)),
    }
}

/// Rolling average of durations, shared by every request of one fetcher
#[derive(Debug, Default)]
pub(crate) struct DurationAverage {
    inner: std::sync::Mutex<(Duration, u32)>,
}

impl DurationAverage {
    /// Adds a sample and returns the new average
    pub(crate) fn record(&self, sample: Duration) -> Duration {
        match self.inner.lock() {
            Ok(mut guard) => {
                guard.0 += sample;
                guard.1 = guard.1.saturating_add(1);
                guard.0 / guard.1
            }
            Err(_) => sample,
        }
    }
}
