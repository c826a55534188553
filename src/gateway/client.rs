use crate::gateway::wire::{GatewayRequest, GatewayResponse};
use crate::gateway::Fetcher;
use crate::task::{FetchTask, FetchedResponse};
use crate::{ConfigError, CrawlError, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Route every fetch request is posted to
pub const FETCH_ROUTE: &str = "/v1/fetch";

/// Forwards fetch tasks to a proxy gateway
///
/// The gateway owns proxy pools, headless rendering and sessions; this
/// client only serializes the task and maps the reply.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    route: Url,
}

impl GatewayClient {
    /// Creates a client for the gateway at `endpoint`
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL of the gateway (e.g. "http://127.0.0.1:8191")
    /// * `timeout` - Budget for one round trip, rendering included
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, CrawlError> {
        let base = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("gateway endpoint '{}': {}", endpoint, e)))?;
        let route = base.join(FETCH_ROUTE)?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, route })
    }

    pub fn route(&self) -> &Url {
        &self.route
    }
}

#[async_trait]
impl Fetcher for GatewayClient {
    async fn execute(&self, task: &FetchTask) -> Result<FetchedResponse, FetchError> {
        let request = GatewayRequest::from(task);
        tracing::debug!(
            "Gateway {} {} (proxy: {}, tier: {}, headless: {})",
            task.method.as_str(),
            task.url,
            task.options.use_proxy,
            task.options.reliability.as_str(),
            task.options.headless_render
        );

        let response = self
            .client
            .post(self.route.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(task.url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Gateway {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let reply: GatewayResponse = response.json().await.map_err(|e| FetchError::Decode {
            url: task.url.to_string(),
            message: e.to_string(),
        })?;

        Ok(reply.into_response(task.url.clone()))
    }
}
