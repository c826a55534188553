use crate::task::FetchedResponse;

/// Body markers of common anti-bot interstitials (lowercase)
pub const DEFAULT_MARKERS: &[&str] = &[
    "g-recaptcha",
    "h-captcha",
    "px-captcha",
    "cf-challenge",
    "cf-browser-verification",
    "_incapsula_resource",
    "distil_r_captcha",
    "are you a robot",
    "request unsuccessful. incapsula",
    "access to this page has been denied",
];

/// Recognizes anti-bot interstitials and rate limiting
#[derive(Debug, Clone)]
pub struct BlockDetector {
    markers: Vec<String>,
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl BlockDetector {
    /// Default markers plus site-specific ones
    pub fn with_extra_markers(extra: &[String]) -> Self {
        Self::from_markers(extra, true)
    }

    /// Site-specific markers, with or without the defaults
    ///
    /// Status 429 is a block either way.
    pub fn from_markers(markers: &[String], include_defaults: bool) -> Self {
        let mut detector = if include_defaults {
            Self::default()
        } else {
            Self {
                markers: Vec::new(),
            }
        };
        detector.markers.extend(
            markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty()),
        );
        detector
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Returns what gave the block away, if anything
    pub fn detect(&self, response: &FetchedResponse) -> Option<String> {
        if response.status == 429 {
            return Some("HTTP 429".to_string());
        }

        let body = response.text().to_lowercase();
        self.markers
            .iter()
            .find(|marker| body.contains(marker.as_str()))
            .cloned()
    }
}
