use crate::config::FetchPolicyConfig;
use crate::extractor::PageKind;
use crate::task::FetchOptions;
use crate::url::strip_query;
use std::time::Duration;
use url::Url;

/// Derives fetch options from a site's fetch policy
///
/// The result depends only on the page kind and the target URL, so the
/// options of any emitted task can be recomputed at will.
#[derive(Debug, Clone)]
pub struct OptionsPolicy {
    config: FetchPolicyConfig,
}

impl Default for OptionsPolicy {
    fn default() -> Self {
        Self::new(FetchPolicyConfig::default())
    }
}

impl OptionsPolicy {
    pub fn new(config: FetchPolicyConfig) -> Self {
        Self { config }
    }

    pub fn options_for(&self, kind: PageKind, url: &Url) -> FetchOptions {
        let config = &self.config;
        let mut options = FetchOptions::new();

        if config.use_proxy {
            options = options.with_proxy(config.reliability);
        }

        let headless = match kind {
            PageKind::Root | PageKind::Listing => config.headless_listing,
            PageKind::Detail => config.headless_detail,
        };
        if headless {
            options = options.with_headless(Duration::from_millis(config.js_wait_ms));
        }

        options.init_session = kind == PageKind::Root && config.init_session_root;
        options.keep_session = config.keep_session;
        options.disable_cookie_jar = config.disable_cookie_jar;
        options.disable_redirect = config.disable_redirect;
        options.max_ttl = config.max_ttl_ms.map(Duration::from_millis);

        let key = match kind {
            PageKind::Detail => strip_query(url),
            PageKind::Root | PageKind::Listing => {
                let mut key = url.clone();
                key.set_fragment(None);
                key
            }
        };
        options.with_dedupe_key(key.as_str())
    }
}
