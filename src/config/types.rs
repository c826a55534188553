use crate::task::ReliabilityTier;
use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Looks up a site by name
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.name == name)
    }
}

/// Controller behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Maximum retries for a single task before it is abandoned
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before a retried fetch is executed (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Stop scheduling new fetches after this many
    #[serde(rename = "max-fetches", default)]
    pub max_fetches: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_concurrency(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            max_fetches: None,
        }
    }
}

fn default_concurrency() -> u32 {
    8
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

/// How fetch tasks are executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Through the proxy gateway, honoring every fetch option
    Gateway,
    /// Plain HTTP from this process; proxy and headless options are ignored
    #[default]
    Direct,
}

/// Proxy gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub mode: FetchMode,

    /// Base URL of the gateway, required in gateway mode
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Timeout for one gateway round trip (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_gateway_timeout")]
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Direct,
            endpoint: None,
            timeout_ms: default_gateway_timeout(),
        }
    }
}

fn default_gateway_timeout() -> u64 {
    120_000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON-lines record file
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Optional SQLite database receiving the same records
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,

    /// Optional markdown summary written at the end of a run
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// One storefront extractor
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Unique site name, used in records and self-test reports
    pub name: String,

    /// Hostname globs this extractor accepts (e.g. "*.example.com")
    pub domains: Vec<String>,

    /// Root URLs a crawl starts from; also the self-test URLs
    pub seeds: Vec<String>,

    /// Brand written into records when the page does not carry one
    #[serde(default)]
    pub brand: Option<String>,

    pub routes: RoutesConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub detail: DetailConfig,

    #[serde(default)]
    pub fetch: FetchPolicyConfig,

    /// Extra body markers identifying an anti-bot interstitial
    #[serde(default)]
    pub block_markers: Vec<String>,

    /// Whether the built-in interstitial markers apply; turn off for sites
    /// that embed a captcha widget on regular pages
    #[serde(default = "default_true")]
    pub default_block_markers: bool,
}

/// Ordered path patterns per page kind (regular expressions over path and query)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutesConfig {
    #[serde(default)]
    pub root: Vec<String>,
    #[serde(default)]
    pub listing: Vec<String>,
    #[serde(default)]
    pub detail: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationConfig {
    /// Selector of the top-level menu list (`ul`)
    #[serde(default = "default_menu_selector")]
    pub menu: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            menu: default_menu_selector(),
        }
    }
}

fn default_menu_selector() -> String {
    "nav > ul".to_string()
}

/// Body format of listing pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingFormat {
    #[default]
    Html,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListingConfig {
    #[serde(default)]
    pub format: ListingFormat,

    /// HTML: selector of product links (`href` is followed)
    #[serde(default = "default_item_link")]
    pub item_link: String,

    /// HTML: selector of the next-page link
    #[serde(default)]
    pub next_page: Option<String>,

    /// HTML: selector of the element advertising the total item count
    #[serde(default)]
    pub total_count: Option<String>,

    /// JSON: pointer to the array of items
    #[serde(default = "default_items_pointer")]
    pub items_pointer: String,

    /// JSON: field of each item holding its product URL
    #[serde(default = "default_item_url_field")]
    pub item_url_field: String,

    /// JSON: pointer to the advertised total
    #[serde(default)]
    pub total_pointer: Option<String>,

    /// JSON: pointer to the next-page URL or cursor
    #[serde(default)]
    pub next_pointer: Option<String>,

    /// JSON: query parameter receiving a bare next-page cursor
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,

    /// Query parameter carrying the item offset when a page has no next link
    #[serde(default)]
    pub offset_param: Option<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            format: ListingFormat::Html,
            item_link: default_item_link(),
            next_page: None,
            total_count: None,
            items_pointer: default_items_pointer(),
            item_url_field: default_item_url_field(),
            total_pointer: None,
            next_pointer: None,
            cursor_param: default_cursor_param(),
            offset_param: None,
        }
    }
}

fn default_item_link() -> String {
    "a.product-link".to_string()
}

fn default_items_pointer() -> String {
    "/items".to_string()
}

fn default_item_url_field() -> String {
    "url".to_string()
}

fn default_cursor_param() -> String {
    "cursor".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DetailConfig {
    /// Regex whose first capture group holds the embedded product JSON
    #[serde(default = "default_embedded_json")]
    pub embedded_json: String,

    /// Pointer to the product object inside the embedded JSON
    #[serde(default)]
    pub product_pointer: Option<String>,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            embedded_json: default_embedded_json(),
            product_pointer: None,
        }
    }
}

fn default_embedded_json() -> String {
    r#"(?s)<script[^>]*id="product-data"[^>]*>(.*?)</script>"#.to_string()
}

/// Per-site fetch policy, turned into `FetchOptions` per page kind
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchPolicyConfig {
    #[serde(default = "default_true")]
    pub use_proxy: bool,
    #[serde(default)]
    pub reliability: ReliabilityTier,
    #[serde(default)]
    pub headless_listing: bool,
    #[serde(default)]
    pub headless_detail: bool,
    #[serde(default)]
    pub js_wait_ms: u64,
    #[serde(default)]
    pub init_session_root: bool,
    #[serde(default)]
    pub keep_session: bool,
    #[serde(default)]
    pub disable_cookie_jar: bool,
    #[serde(default)]
    pub disable_redirect: bool,
    #[serde(default)]
    pub max_ttl_ms: Option<u64>,
}

impl Default for FetchPolicyConfig {
    fn default() -> Self {
        Self {
            use_proxy: true,
            reliability: ReliabilityTier::Default,
            headless_listing: false,
            headless_detail: false,
            js_wait_ms: 0,
            init_session_root: false,
            keep_session: false,
            disable_cookie_jar: false,
            disable_redirect: false,
            max_ttl_ms: None,
        }
    }
}

fn default_true() -> bool {
    true
}
