use std::time::Duration;
use url::Url;

/// Gateway timing metadata, used for adaptive reliability decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub duration: Duration,
    pub average_duration: Duration,
}

/// A response handed back to an extractor
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// The URL the task targeted; extractors classify against this
    pub url: Url,
    pub status: u16,
    pub protocol: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub timing: Option<Timing>,
}

impl FetchedResponse {
    /// Builds a 200 response around a text body
    pub fn ok(url: Url, body: impl Into<String>) -> Self {
        Self::with_status(url, 200, body)
    }

    pub fn with_status(url: Url, status: u16, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            protocol: "HTTP/1.1".to_string(),
            headers: Vec::new(),
            body: body.into().into_bytes(),
            timing: None,
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
