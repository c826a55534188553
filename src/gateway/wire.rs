//! JSON messages exchanged with the proxy gateway
//!
//! Field names are camelCase, bodies travel base64-encoded and headers as
//! a multimap (`{"Accept": ["text/html"]}`).

use crate::task::{FetchOptions, FetchTask, FetchedResponse, Method, ReliabilityTier, Timing};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

pub type HeaderMultimap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub headers: HeaderMultimap,
    #[serde(default, with = "base64_body", skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
    pub options: WireOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOptions {
    pub use_proxy: bool,
    pub reliability: ReliabilityTier,
    pub headless_render: bool,
    pub js_wait_ms: u64,
    pub init_session: bool,
    pub keep_session: bool,
    pub disable_cookie_jar: bool,
    pub disable_redirect: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ttl_ms: Option<u64>,
    #[serde(default)]
    pub dedupe_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status: u16,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub headers: HeaderMultimap,
    #[serde(default, with = "base64_body")]
    pub body: Option<Vec<u8>>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub avg_duration_ms: Option<u64>,
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl From<&FetchOptions> for WireOptions {
    fn from(options: &FetchOptions) -> Self {
        Self {
            use_proxy: options.use_proxy,
            reliability: options.reliability,
            headless_render: options.headless_render,
            js_wait_ms: duration_ms(options.js_wait),
            init_session: options.init_session,
            keep_session: options.keep_session,
            disable_cookie_jar: options.disable_cookie_jar,
            disable_redirect: options.disable_redirect,
            max_ttl_ms: options.max_ttl.map(duration_ms),
            dedupe_keys: options.dedupe_keys.clone(),
        }
    }
}

impl From<&FetchTask> for GatewayRequest {
    fn from(task: &FetchTask) -> Self {
        Self {
            method: task.method,
            url: task.url.to_string(),
            headers: to_multimap(&task.headers),
            body: task.body.clone(),
            options: WireOptions::from(&task.options),
        }
    }
}

impl GatewayResponse {
    /// Converts the reply into the response an extractor sees, keyed by the
    /// URL the task targeted
    pub fn into_response(self, url: Url) -> FetchedResponse {
        let timing = match (self.duration_ms, self.avg_duration_ms) {
            (Some(duration), average) => Some(Timing {
                duration: Duration::from_millis(duration),
                average_duration: Duration::from_millis(average.unwrap_or(duration)),
            }),
            (None, _) => None,
        };

        FetchedResponse {
            url,
            status: self.status,
            protocol: self.protocol,
            headers: from_multimap(self.headers),
            body: self.body.unwrap_or_default(),
            timing,
        }
    }
}

pub fn to_multimap(headers: &[(String, String)]) -> HeaderMultimap {
    let mut map = HeaderMultimap::new();
    for (name, value) in headers {
        map.entry(name.clone()).or_default().push(value.clone());
    }
    map
}

pub fn from_multimap(headers: HeaderMultimap) -> Vec<(String, String)> {
    headers
        .into_iter()
        .flat_map(|(name, values)| values.into_iter().map(move |v| (name.clone(), v)))
        .collect()
}

mod base64_body {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(body: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match body {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
