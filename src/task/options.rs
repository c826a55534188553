use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Proxy quality class requested for a fetch
///
/// `Default` leaves the choice to the controller, which starts with the
/// low tier and escalates on failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityTier {
    #[default]
    Default,
    Low,
    Medium,
    High,
    Intelligent,
}

impl ReliabilityTier {
    /// The next, more reliable tier; `Intelligent` is the ceiling
    pub fn escalate(self) -> Self {
        match self {
            Self::Default | Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Intelligent => Self::Intelligent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Intelligent => "intelligent",
        }
    }
}

/// How a URL should be retrieved
///
/// Options are recomputed from the target URL and the page kind, so two
/// tasks for the same URL and phase always carry equal options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub use_proxy: bool,
    pub reliability: ReliabilityTier,

    /// Execute the page in a browser before reading the HTML
    pub headless_render: bool,
    /// How long scripts may run before the DOM is considered stable
    pub js_wait: Duration,

    /// Establish a fresh session (cookies, fingerprint) before fetching
    pub init_session: bool,
    pub keep_session: bool,
    pub disable_cookie_jar: bool,

    pub disable_redirect: bool,
    pub max_ttl: Option<Duration>,

    /// Keys the controller uses to collapse duplicate fetches
    pub dedupe_keys: Vec<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proxy(mut self, reliability: ReliabilityTier) -> Self {
        self.use_proxy = true;
        self.reliability = reliability;
        self
    }

    pub fn with_headless(mut self, js_wait: Duration) -> Self {
        self.headless_render = true;
        self.js_wait = js_wait;
        self
    }

    pub fn with_dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_keys.push(key.into());
        self
    }

    /// Key identifying the logical resource, falling back to the given URL
    pub fn dedupe_key_or<'a>(&'a self, url: &'a str) -> &'a str {
        self.dedupe_keys.first().map(String::as_str).unwrap_or(url)
    }

    /// Copy with headless rendering switched on, used when a plain fetch
    /// came back without the expected structure
    pub fn escalated_render(&self) -> Self {
        let mut next = self.clone();
        next.headless_render = true;
        if next.js_wait.is_zero() {
            next.js_wait = Duration::from_secs(3);
        }
        next
    }

    /// Copy with a fresh identity: new session and a more reliable proxy tier
    pub fn rotated_identity(&self) -> Self {
        let mut next = self.clone();
        next.use_proxy = true;
        next.reliability = next.reliability.escalate();
        next.init_session = true;
        next
    }
}
