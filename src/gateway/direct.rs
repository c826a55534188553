use crate::config::UserAgentConfig;
use crate::gateway::{DurationAverage, Fetcher};
use crate::task::{FetchOptions, FetchTask, FetchedResponse, Timing};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Fetches pages from this process, without a gateway
///
/// Redirect suppression, cookie-jar opt-out and `max_ttl` are honored.
/// Proxy tiers, headless rendering and session initialization need the
/// gateway and are ignored here.
pub struct DirectFetcher {
    /// Indexed by `[follow_redirects][use_cookies]`
    clients: [[Client; 2]; 2],
    average: DurationAverage,
    warned: AtomicBool,
}

fn build_http_client(
    user_agent: &str,
    follow_redirects: bool,
    use_cookies: bool,
) -> Result<Client, reqwest::Error> {
    let redirect = if follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect)
        .cookie_store(use_cookies)
        .gzip(true)
        .brotli(true)
        .build()
}

impl DirectFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let user_agent = config.header_value();
        let client = |redirects, cookies| build_http_client(&user_agent, redirects, cookies);

        Ok(Self {
            clients: [
                [client(false, false)?, client(false, true)?],
                [client(true, false)?, client(true, true)?],
            ],
            average: DurationAverage::default(),
            warned: AtomicBool::new(false),
        })
    }

    fn client_for(&self, options: &FetchOptions) -> &Client {
        let redirects = usize::from(!options.disable_redirect);
        let cookies = usize::from(!options.disable_cookie_jar);
        &self.clients[redirects][cookies]
    }

    fn note_ignored_options(&self, task: &FetchTask) {
        let options = &task.options;
        if !(options.headless_render || options.init_session || options.use_proxy) {
            return;
        }
        if !self.warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "Direct mode ignores proxy, headless and session options (first seen on {})",
                task.url
            );
        }
    }
}

#[async_trait]
impl Fetcher for DirectFetcher {
    async fn execute(&self, task: &FetchTask) -> Result<FetchedResponse, FetchError> {
        self.note_ignored_options(task);

        let mut request = self
            .client_for(&task.options)
            .request(task.method.into(), task.url.clone());
        for (name, value) in &task.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &task.body {
            request = request.body(body.clone());
        }
        if let Some(ttl) = task.options.max_ttl {
            request = request.timeout(ttl);
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(task.url.as_str(), e))?;

        let status = response.status().as_u16();
        let protocol = format!("{:?}", response.version());
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(task.url.as_str(), e))?
            .to_vec();

        let duration = started.elapsed();
        let average_duration = self.average.record(duration);
        tracing::debug!("Fetched {} ({}) in {:?}", task.url, status, duration);

        Ok(FetchedResponse {
            url: task.url.clone(),
            status,
            protocol,
            headers,
            body,
            timing: Some(Timing {
                duration,
                average_duration,
            }),
        })
    }
}
