//! Thin async client for exercising JSON APIs. Builds query strings from
//! JSON parameter objects the same way test code writes them, and hands the
//! whole decoded payload back for fixture accumulation.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::errors::Result;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TOKEN_HEADER: &str = "X-API-Token";

/// Decoded response: status plus whole payload. Non-2xx responses are data,
/// not errors; assertions on failure statuses are routine in API tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    token_header: String,
    timeout_ms: u64,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut this = Self {
            base_url: base_url.into(),
            token: None,
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            client: Client::new(),
        };
        this.client = this.make_client();
        this
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.client = self.make_client();
        self
    }

    pub fn with_token_header(mut self, header: impl Into<String>) -> Self {
        self.token_header = header.into();
        self.client = self.make_client();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self.client = self.make_client();
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(&config.api.base_url)
            .with_token_header(&config.auth.token_header)
            .with_timeout_ms(config.api.timeout_ms);
        if !config.api.token.is_empty() {
            client = client.with_token(&config.api.token);
        }
        client
    }

    fn make_client(&self) -> Client {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.token {
            match (
                HeaderName::from_bytes(self.token_header.as_bytes()),
                HeaderValue::from_str(token),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => {
                    warn!("invalid characters in token header, sending unauthenticated");
                }
            }
        }

        Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(self.timeout_ms))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new())
    }

    /// Resolve an endpoint against the base URL and append query parameters
    /// from a JSON object. Null and empty values are skipped; array values
    /// are joined with commas. Absolute endpoints pass through untouched.
    pub fn build_url(&self, endpoint: &str, params: &Value) -> Result<Url> {
        let raw = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
        };
        let mut url = Url::parse(&raw)?;

        if let Some(map) = params.as_object() {
            let rendered: Vec<(&String, String)> = map
                .iter()
                .filter_map(|(key, value)| render_param(value).map(|r| (key, r)))
                .collect();
            if !rendered.is_empty() {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in rendered {
                    pairs.append_pair(key, &value);
                }
            }
        }

        Ok(url)
    }

    /// GET an endpoint and decode the body as JSON. Bodies that are not
    /// JSON decode to `Value::Null`; downstream ingestion treats anything
    /// unrecognizable as a no-op.
    pub async fn get(&self, endpoint: &str, params: &Value) -> Result<ApiResponse> {
        let url = self.build_url(endpoint, params)?;
        debug!(url = %url, "GET");
        let started = std::time::Instant::now();

        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;

        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                debug!(status, error = %err, "response body is not JSON");
                Value::Null
            })
        };

        debug!(
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );
        Ok(ApiResponse { status, data })
    }
}

fn render_param(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    };
    if rendered.is_empty() {
        None
    } else {
        Some(rendered)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
