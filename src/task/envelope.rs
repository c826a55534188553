use crate::product::Product;
use crate::task::FetchOptions;
use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP method of a fetch task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        }
    }
}

/// A request for the controller to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub url: Url,
    pub method: Method,
    /// Header multimap, in sending order
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub options: FetchOptions,
}

impl FetchTask {
    /// Creates a GET task
    pub fn get(url: Url, options: FetchOptions) -> Self {
        Self {
            url,
            method: Method::Get,
            headers: Vec::new(),
            body: None,
            options,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Key the controller dedupes this task by
    pub fn dedupe_key(&self) -> &str {
        self.options.dedupe_key_or(self.url.as_str())
    }
}

/// A finished, normalized record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTask {
    pub product: Product,
}

/// One unit of work emitted by an extractor
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Fetch(FetchTask),
    Record(RecordTask),
}

impl Task {
    pub fn as_fetch(&self) -> Option<&FetchTask> {
        match self {
            Self::Fetch(task) => Some(task),
            Self::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordTask> {
        match self {
            Self::Fetch(_) => None,
            Self::Record(record) => Some(record),
        }
    }
}

impl From<FetchTask> for Task {
    fn from(task: FetchTask) -> Self {
        Self::Fetch(task)
    }
}

impl From<Product> for Task {
    fn from(product: Product) -> Self {
        Self::Record(RecordTask { product })
    }
}
